//! # Runtime events emitted during a performance run.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Action events**: per-action execution flow (dispatched, completed,
//!   failed, acknowledgement timeout)
//! - **Strategy events**: run start and fallback-cascade downgrades
//! - **Terminal events**: run completion, cancellation, abort
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! action ids, channels, reasons, and offsets from the run's start
//! reference.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use showvisor::{ActionId, Channel, Event, EventKind};
//!
//! let ev = Event::new(EventKind::ActionFailed)
//!     .with_action(ActionId(4))
//!     .with_channel(Channel::Light)
//!     .with_reason("device unreachable");
//!
//! assert_eq!(ev.kind, EventKind::ActionFailed);
//! assert_eq!(ev.action, Some(ActionId(4)));
//! assert_eq!(ev.reason.as_deref(), Some("device unreachable"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::plan::{ActionId, Channel};
use crate::schedule::ExecutionStrategy;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Strategy events ===
    /// Execution started.
    ///
    /// Sets:
    /// - `strategy`: the tier selected for the run
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RunStarted,

    /// The cascade dropped to a lower tier.
    ///
    /// Sets:
    /// - `strategy`: the tier execution continues on
    /// - `reason`: what triggered the downgrade
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    StrategyDowngraded,

    // === Action events ===
    /// An action's command was handed to the gateway.
    ///
    /// Sets:
    /// - `action`: action id
    /// - `channel`: action channel
    /// - `name`: command name
    /// - `offset`: time since the run's start reference
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ActionDispatched,

    /// An action reached its terminal `completed` state.
    ///
    /// Sets:
    /// - `action`: action id
    /// - `channel`: action channel
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ActionCompleted,

    /// An action failed (rejection, connectivity, or ack timeout); the
    /// channel continues with its next action.
    ///
    /// Sets:
    /// - `action`: action id
    /// - `channel`: action channel
    /// - `reason`: failure message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ActionFailed,

    /// A discrete command's acknowledgement deadline passed.
    /// Published in addition to `ActionFailed`.
    ///
    /// Sets:
    /// - `action`: action id
    /// - `timeout`: the configured acknowledgement deadline
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    AckTimeoutHit,

    /// A running motion was stopped to free its channel.
    ///
    /// Sets:
    /// - `channel`: the motion channel
    /// - `offset`: time since the run's start reference
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    MotionStopped,

    // === Terminal events ===
    /// All channels drained; the run finished on its own.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RunCompleted,

    /// The external cancel signal ended the run early.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RunCancelled,

    /// Connectivity was lost on every channel; the run was aborted.
    ///
    /// Sets:
    /// - `reason`: abort cause
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RunAborted,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Action the event refers to, if applicable.
    pub action: Option<ActionId>,
    /// Channel the event refers to, if applicable.
    pub channel: Option<Channel>,
    /// Command name, if applicable.
    pub name: Option<Arc<str>>,
    /// Human-readable reason (failures, downgrades, aborts).
    pub reason: Option<Arc<str>>,
    /// Strategy tier (run start, downgrades).
    pub strategy: Option<ExecutionStrategy>,
    /// Offset from the run's monotonic start reference.
    pub offset: Option<Duration>,
    /// Acknowledgement deadline, for `AckTimeoutHit`.
    pub timeout: Option<Duration>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and
    /// next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            action: None,
            channel: None,
            name: None,
            reason: None,
            strategy: None,
            offset: None,
            timeout: None,
        }
    }

    /// Attaches an action id.
    #[inline]
    pub fn with_action(mut self, action: ActionId) -> Self {
        self.action = Some(action);
        self
    }

    /// Attaches a channel.
    #[inline]
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Attaches a command name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a strategy tier.
    #[inline]
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Attaches an offset from the run's start reference.
    #[inline]
    pub fn with_offset(mut self, offset: Duration) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Attaches an acknowledgement deadline.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// True for events that end a run.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::RunCompleted | EventKind::RunCancelled | EventKind::RunAborted
        )
    }
}
