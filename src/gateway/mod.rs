//! Actuator gateway: the seam to the physical device.
//!
//! The engine never talks to the robot directly. It drives an
//! [`ActuatorGateway`] — the transport/command-correlation layer is an
//! external collaborator implementing this trait. The gateway reports
//! success or failure per call and advertises its capabilities once, at
//! construction.
//!
//! ## Contents
//! - [`ActuatorGateway`], [`GatewayRef`], [`Capability`] — the capability
//!   contract
//! - [`SerialGateway`] — adapter for transports requiring exclusive access
//!   per physical command

mod gateway;
mod serial;

pub use gateway::{ActuatorGateway, Capability, GatewayRef};
pub use serial::SerialGateway;

#[cfg(test)]
pub(crate) mod stub;
