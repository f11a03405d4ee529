//! # Event subscribers for the performance runtime.
//!
//! This module provides the [`Subscribe`] trait and the fan-out machinery
//! for handling runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   channel loops ── publish(Event) ──► Bus ──► scheduler listener
//!                                                    │
//!                                                    ▼
//!                                              SubscriberSet
//!                                         ┌─────────┼─────────┐
//!                                         ▼         ▼         ▼
//!                                     LogWriter  Metrics   Custom ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use showvisor::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if matches!(event.kind, EventKind::ActionFailed) {
//!             // increment a counter, push a metric, ...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
