//! Error types used by the choreography engine and the actuator gateway.
//!
//! This module defines two main error enums:
//!
//! - [`PlanError`] — violations detected by the timeline validator, raised
//!   before any physical dispatch.
//! - [`DeviceError`] — failures of individual gateway commands.
//!
//! Both types provide `as_label` helpers for logging/metrics, and
//! [`DeviceError::is_connectivity`] distinguishes connection loss (which can
//! trigger a strategy downgrade) from per-command rejections (which never do).

use std::time::Duration;
use thiserror::Error;

use crate::plan::{ActionId, Channel};

/// # Errors produced by timeline validation.
///
/// A plan that fails validation is rejected before any command reaches the
/// device; no action is ever executed from an invalid plan.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// An action's interval extends past the plan's total duration
    /// (or starts beyond it).
    #[error("action {id} ends at {end:?}, outside the plan window [0, {total:?}]")]
    OutOfBounds {
        /// Offending action.
        id: ActionId,
        /// Computed end offset of the action.
        end: Duration,
        /// Total plan duration.
        total: Duration,
    },

    /// An action has a zero duration.
    #[error("action {id} has an empty duration")]
    EmptyDuration {
        /// Offending action.
        id: ActionId,
    },

    /// Two actions on the same channel overlap and the overlap could not be
    /// repaired by clipping.
    #[error("unrepairable overlap on the {channel} channel between actions {first} and {second}")]
    Overlap {
        /// Channel both actions belong to.
        channel: Channel,
        /// The earlier of the two conflicting actions.
        first: ActionId,
        /// The later of the two conflicting actions.
        second: ActionId,
    },
}

impl PlanError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use showvisor::{ActionId, PlanError};
    ///
    /// let err = PlanError::EmptyDuration { id: ActionId(3) };
    /// assert_eq!(err.as_label(), "plan_empty_duration");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PlanError::OutOfBounds { .. } => "plan_out_of_bounds",
            PlanError::EmptyDuration { .. } => "plan_empty_duration",
            PlanError::Overlap { .. } => "plan_overlap",
        }
    }

    /// Returns the ids of the actions involved in the violation.
    pub fn conflicting_actions(&self) -> Vec<ActionId> {
        match self {
            PlanError::OutOfBounds { id, .. } | PlanError::EmptyDuration { id } => vec![*id],
            PlanError::Overlap { first, second, .. } => vec![*first, *second],
        }
    }
}

/// # Errors produced by actuator gateway commands.
///
/// These represent failures of individual physical commands. During a run
/// they are absorbed per-action and reflected only in the execution report;
/// connectivity errors observed on first dispatches additionally drive the
/// strategy cascade.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device connection is down; no command of any kind can be
    /// delivered right now.
    #[error("device unreachable")]
    Unreachable,

    /// The device received the command but refused to execute it.
    #[error("command rejected: {reason}")]
    Rejected {
        /// Device-reported refusal reason.
        reason: String,
    },

    /// No acknowledgement arrived within the per-action deadline.
    #[error("no acknowledgement within {timeout:?}")]
    AckTimeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },
}

impl DeviceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use showvisor::DeviceError;
    ///
    /// let err = DeviceError::Unreachable;
    /// assert_eq!(err.as_label(), "device_unreachable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DeviceError::Unreachable => "device_unreachable",
            DeviceError::Rejected { .. } => "device_rejected",
            DeviceError::AckTimeout { .. } => "device_ack_timeout",
        }
    }

    /// Indicates whether the error means the connection itself is lost.
    ///
    /// Only connectivity errors participate in the fallback cascade; a
    /// rejection or an acknowledgement timeout stays a per-action failure.
    ///
    /// # Example
    /// ```
    /// use showvisor::DeviceError;
    ///
    /// assert!(DeviceError::Unreachable.is_connectivity());
    /// assert!(!DeviceError::Rejected { reason: "busy".into() }.is_connectivity());
    /// ```
    pub fn is_connectivity(&self) -> bool {
        matches!(self, DeviceError::Unreachable)
    }
}
