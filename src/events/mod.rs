//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted while a performance runs: action
//! dispatches and outcomes, strategy downgrades, cancellation, and run
//! termination.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the scheduler, its channel loops, and the dispatch
//!   helper.
//! - **Consumers**: the scheduler's subscriber listener (fans out to the
//!   [`SubscriberSet`](crate::SubscriberSet)); the same events also feed the
//!   report's chronological execution log.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
