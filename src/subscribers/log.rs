//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [run-started] strategy=synchronized
//! [dispatched] action=2 channel=light name="green" offset=0.0s
//! [failed] action=2 channel=light err="device unreachable"
//! [ack-timeout] action=3 timeout=2s
//! [downgraded] strategy=continuous reason="first dispatch unreachable on dance"
//! [motion-stopped] channel=dance offset=5.0s
//! [completed] action=1 channel=dance
//! [run-completed]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use — implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::RunStarted => {
                println!("[run-started] strategy={:?}", e.strategy);
            }
            EventKind::StrategyDowngraded => {
                println!(
                    "[downgraded] strategy={:?} reason={:?}",
                    e.strategy, e.reason
                );
            }
            EventKind::ActionDispatched => {
                println!(
                    "[dispatched] action={:?} channel={:?} name={:?} offset={:?}",
                    e.action, e.channel, e.name, e.offset
                );
            }
            EventKind::ActionCompleted => {
                println!("[completed] action={:?} channel={:?}", e.action, e.channel);
            }
            EventKind::ActionFailed => {
                println!(
                    "[failed] action={:?} channel={:?} err={:?}",
                    e.action, e.channel, e.reason
                );
            }
            EventKind::AckTimeoutHit => {
                println!("[ack-timeout] action={:?} timeout={:?}", e.action, e.timeout);
            }
            EventKind::MotionStopped => {
                println!(
                    "[motion-stopped] channel={:?} offset={:?}",
                    e.channel, e.offset
                );
            }
            EventKind::RunCompleted => {
                println!("[run-completed]");
            }
            EventKind::RunCancelled => {
                println!("[run-cancelled]");
            }
            EventKind::RunAborted => {
                println!("[run-aborted] reason={:?}", e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
