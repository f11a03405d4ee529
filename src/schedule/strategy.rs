//! # Execution strategy tiers and downgrade bookkeeping.
//!
//! The cascade runs from the most to the least timing-precise tier:
//!
//! ```text
//! Synchronized ──► Continuous ──► Individual ──► (abort)
//! ```
//!
//! A downgrade is one-way: once a run leaves a tier it never re-attempts a
//! higher one. Each tier records why it was left, and the report's
//! `features_used` flags name every tier that actually ran.

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::plan::Channel;

/// One tier of the fallback cascade, ordered most → least timing-precise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    /// Full concurrent multi-channel execution — preferred.
    Synchronized,
    /// Sequential per-channel execution: the motion timeline is driven to
    /// completion while expression/light commands are queued without
    /// fine-grained timing guarantees.
    Continuous,
    /// Every action one at a time in plan order, best-effort timing, no
    /// concurrency.
    Individual,
}

impl ExecutionStrategy {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStrategy::Synchronized => "synchronized",
            ExecutionStrategy::Continuous => "continuous",
            ExecutionStrategy::Individual => "individual",
        }
    }

    /// The next lower tier, or `None` at the bottom of the cascade.
    pub fn next_tier(self) -> Option<ExecutionStrategy> {
        match self {
            ExecutionStrategy::Synchronized => Some(ExecutionStrategy::Continuous),
            ExecutionStrategy::Continuous => Some(ExecutionStrategy::Individual),
            ExecutionStrategy::Individual => None,
        }
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the cascade left a tier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DowngradeReason {
    /// The gateway does not support synchronized multi-channel execution.
    CapabilityUnsupported,
    /// A channel's first dispatch returned a connectivity error.
    FirstDispatchConnectivity {
        /// The channel whose first dispatch failed.
        channel: Channel,
    },
    /// Every channel in the plan lost connectivity on its first dispatch.
    AllChannelsUnreachable,
}

impl fmt::Display for DowngradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DowngradeReason::CapabilityUnsupported => {
                f.write_str("synchronized multi-channel capability unsupported")
            }
            DowngradeReason::FirstDispatchConnectivity { channel } => {
                write!(f, "first dispatch unreachable on {channel}")
            }
            DowngradeReason::AllChannelsUnreachable => {
                f.write_str("connectivity lost on every channel")
            }
        }
    }
}

/// How one tier ended, as seen by the cascade driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TierOutcome {
    /// Every remaining action reached a terminal state.
    Completed,
    /// The external cancel signal fired.
    Cancelled,
    /// The tier's downgrade trigger tripped; try the next tier.
    Downgrade(DowngradeReason),
    /// Connectivity lost on every channel at the lowest tier.
    Abort(DowngradeReason),
}

/// Shared first-dispatch connectivity trip wire for synchronized mode.
///
/// The first channel loop that sees a connectivity error on its **first**
/// dispatch trips the probe: the reason is latched (first writer wins) and
/// the tier token is cancelled so sibling loops stop at their next
/// suspension point.
pub(crate) struct ConnectivityProbe {
    tier_token: CancellationToken,
    reason: OnceLock<DowngradeReason>,
}

impl ConnectivityProbe {
    pub(crate) fn new(tier_token: CancellationToken) -> Self {
        Self {
            tier_token,
            reason: OnceLock::new(),
        }
    }

    /// Trips the probe, stopping the tier.
    pub(crate) fn trip(&self, channel: Channel) {
        let _ = self
            .reason
            .set(DowngradeReason::FirstDispatchConnectivity { channel });
        self.tier_token.cancel();
    }

    /// The latched downgrade reason, if the probe tripped.
    pub(crate) fn tripped(&self) -> Option<&DowngradeReason> {
        self.reason.get()
    }
}
