//! Plan data model: channels, timed actions, and timeline validation.
//!
//! This module groups the **data model** of a performance plan and the
//! validator that enforces its scheduling invariants.
//!
//! ## Contents
//! - [`Channel`], [`Action`], [`ActionParams`] — the four command streams
//!   and their timed entries
//! - [`LightColor`], [`LightMode`] — the fixed indicator-light vocabulary
//! - [`ChoreographyPlan`], [`PlanRequest`] — the owned plan and the
//!   caller-facing submission shape
//! - [`TimelineValidator`] — per-channel invariant checks with overlap repair
//!
//! ## Quick reference
//! - **Producers**: [`ChoreographyPlanner`](crate::ChoreographyPlanner)
//!   (from a music analysis) or [`PlanRequest::into_plan`] (caller
//!   submission).
//! - **Consumers**: [`TimelineValidator`] first, then the
//!   [`PerformanceScheduler`](crate::PerformanceScheduler).

mod action;
#[allow(clippy::module_inception)]
mod plan;
mod validate;

pub use action::{Action, ActionId, ActionParams, Channel, LightColor, LightMode};
pub use plan::{ActionRequest, ChoreographyPlan, PlanRequest};
pub use validate::TimelineValidator;

/// Serde helper: `Duration` as fractional seconds, the unit all plan
/// offsets use on the wire.
pub(crate) mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let v = f64::deserialize(d)?;
        if !v.is_finite() || v < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "offset must be a non-negative number of seconds, got {v}"
            )));
        }
        Ok(Duration::from_secs_f64(v))
    }
}

/// Serde helper: optional `Duration` as fractional seconds.
pub(crate) mod secs_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let v = Option::<f64>::deserialize(d)?;
        match v {
            None => Ok(None),
            Some(v) if v.is_finite() && v >= 0.0 => Ok(Some(Duration::from_secs_f64(v))),
            Some(v) => Err(serde::de::Error::custom(format!(
                "offset must be a non-negative number of seconds, got {v}"
            ))),
        }
    }
}
