//! # Gateway capability contract.
//!
//! [`ActuatorGateway`] is the async, fallible command surface of the
//! physical device. Every operation either acknowledges or returns a
//! [`DeviceError`]; the scheduler decides what a failure means (per-action
//! record, strategy downgrade, or abort).
//!
//! Capability probing happens **once**: [`ActuatorGateway::supports`] is a
//! plain synchronous flag resolved at gateway construction, never
//! re-checked per call.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use std::time::Duration;
//! use showvisor::{ActuatorGateway, Capability, DeviceError, LightColor, LightMode};
//!
//! struct Null;
//!
//! #[async_trait]
//! impl ActuatorGateway for Null {
//!     async fn start_dance(&self, _name: &str) -> Result<(), DeviceError> { Ok(()) }
//!     async fn stop_dance(&self) -> Result<(), DeviceError> { Ok(()) }
//!     async fn start_action(&self, _name: &str) -> Result<(), DeviceError> { Ok(()) }
//!     async fn stop_action(&self) -> Result<(), DeviceError> { Ok(()) }
//!     async fn show_expression(&self, _name: &str) -> Result<(), DeviceError> { Ok(()) }
//!     async fn set_light(
//!         &self,
//!         _color: LightColor,
//!         _mode: LightMode,
//!         _duration: Duration,
//!         _breath_period: Duration,
//!     ) -> Result<(), DeviceError> { Ok(()) }
//!     fn supports(&self, _capability: Capability) -> bool { true }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DeviceError;
use crate::plan::{LightColor, LightMode};

/// Optional device capabilities, probed once at gateway construction.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// The device accepts concurrent commands on independent channels,
    /// allowing fully synchronized multi-channel execution.
    SynchronizedMultiChannel,
}

/// # Asynchronous command surface of the performer robot.
///
/// Motion starts (`start_dance`, `start_action`) are fire-and-forget: the
/// returned ack confirms command receipt, not motion completion. Discrete
/// commands (`show_expression`, `set_light`) acknowledge execution; the
/// scheduler bounds that wait with its ack timeout.
#[async_trait]
pub trait ActuatorGateway: Send + Sync + 'static {
    /// Starts a named dance move.
    async fn start_dance(&self, name: &str) -> Result<(), DeviceError>;

    /// Stops the running dance move, freeing the body.
    async fn stop_dance(&self) -> Result<(), DeviceError>;

    /// Starts a named basic motion.
    async fn start_action(&self, name: &str) -> Result<(), DeviceError>;

    /// Stops the running basic motion.
    async fn stop_action(&self) -> Result<(), DeviceError>;

    /// Shows a named facial expression.
    async fn show_expression(&self, name: &str) -> Result<(), DeviceError>;

    /// Sets the indicator light. `duration` bounds how long the device
    /// holds the light; `breath_period` applies in breath mode.
    async fn set_light(
        &self,
        color: LightColor,
        mode: LightMode,
        duration: Duration,
        breath_period: Duration,
    ) -> Result<(), DeviceError>;

    /// Static capability flag, resolved at construction.
    fn supports(&self, capability: Capability) -> bool;
}

/// Shared handle to a gateway, suitable for handing to the scheduler.
pub type GatewayRef = Arc<dyn ActuatorGateway>;
