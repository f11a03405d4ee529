//! # Timeline validation with overlap repair.
//!
//! [`TimelineValidator`] enforces the per-channel scheduling invariants a
//! plan must satisfy before execution:
//!
//! - every action's interval lies within `[0, total_duration]`;
//! - every duration is strictly positive;
//! - no two actions on a channel overlap.
//!
//! ## Repair policy
//! When two same-channel actions overlap and **both** are interruptible,
//! the earlier action's end is clipped to the later action's start (a
//! mid-segment light legitimately replaces the running one). If an overlap
//! involves a non-interruptible action, or clipping would leave the earlier
//! action empty, validation fails with [`PlanError::Overlap`] naming both
//! ids — the plan is rejected, never silently dropped.
//!
//! ## Rules
//! - Validation happens entirely before dispatch; a failed plan causes no
//!   device side effects.
//! - Validation is idempotent: re-validating an already-valid plan returns
//!   the identical plan.

use tracing::debug;

use crate::error::PlanError;
use crate::plan::ChoreographyPlan;

/// Enforces plan invariants, repairing benign overlaps and rejecting the
/// rest.
///
/// Stateless; one instance can validate any number of plans.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimelineValidator;

impl TimelineValidator {
    /// Creates a validator.
    pub fn new() -> Self {
        Self
    }

    /// Validates `plan`, returning it (possibly repaired) or the first
    /// violation found.
    ///
    /// ### Checks, per channel
    /// 1. bounds: `start + duration <= total_duration`
    /// 2. strictly positive durations
    /// 3. overlap sweep in start order, clipping where both actions are
    ///    interruptible
    ///
    /// Actions keep their construction order in the returned plan; only
    /// clipped durations change.
    pub fn validate(&self, mut plan: ChoreographyPlan) -> Result<ChoreographyPlan, PlanError> {
        let total = plan.total_duration();

        for action in plan.actions() {
            if action.duration.is_zero() {
                return Err(PlanError::EmptyDuration { id: action.id });
            }
            if action.end() > total {
                return Err(PlanError::OutOfBounds {
                    id: action.id,
                    end: action.end(),
                    total,
                });
            }
        }

        for channel in plan.channels() {
            // Indices into the action list, start-ordered. Clipping only
            // shortens the earlier action of a pair, so a single
            // adjacent-pair sweep is enough: any overlap with a later
            // action would also overlap the next one.
            let mut order: Vec<usize> = (0..plan.actions().len())
                .filter(|&i| plan.actions()[i].channel == channel)
                .collect();
            order.sort_by_key(|&i| (plan.actions()[i].start, plan.actions()[i].id));

            for pair in order.windows(2) {
                let (earlier, later) = (&plan.actions()[pair[0]], &plan.actions()[pair[1]]);
                if earlier.end() <= later.start {
                    continue;
                }

                let repairable =
                    earlier.interruptible && later.interruptible && later.start > earlier.start;
                if !repairable {
                    return Err(PlanError::Overlap {
                        channel,
                        first: earlier.id,
                        second: later.id,
                    });
                }

                let clipped = later.start - earlier.start;
                debug!(
                    channel = %channel,
                    earlier = %earlier.id,
                    later = %later.id,
                    "clipping overlapping action to {clipped:?}"
                );
                plan.actions_mut()[pair[0]].duration = clipped;
            }
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::plan::{Action, ActionId, ActionParams, Channel, LightColor, LightMode};

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn plan(total: f64, actions: Vec<Action>) -> ChoreographyPlan {
        ChoreographyPlan::new(secs(total), actions)
    }

    /// The reference scenario: dance d1 on [1,5), breath light on [0,6),
    /// emphasis light on [3,6), expression e1 on [2,4.5). The light overlap
    /// must be repaired by clipping the breath light to end at 3.0.
    fn reference_plan() -> ChoreographyPlan {
        plan(
            6.0,
            vec![
                Action::new(ActionId(0), Channel::Dance, "d1", secs(1.0), secs(4.0)),
                Action::new(ActionId(1), Channel::Light, "green", secs(0.0), secs(6.0))
                    .with_params(ActionParams::light(LightColor::Green, LightMode::Breath, None)),
                Action::new(ActionId(2), Channel::Light, "yellow", secs(3.0), secs(3.0))
                    .with_params(ActionParams::light(LightColor::Yellow, LightMode::Normal, None)),
                Action::new(ActionId(3), Channel::Expression, "e1", secs(2.0), secs(2.5)),
            ],
        )
    }

    #[test]
    fn test_repairs_light_overlap_by_clipping_earlier() {
        let validated = TimelineValidator::new()
            .validate(reference_plan())
            .expect("light overlap is repairable");

        let green = validated.get(ActionId(1)).unwrap();
        assert_eq!(green.end(), secs(3.0), "breath light clipped to emphasis start");
        assert_eq!(validated.len(), 4, "no action dropped by repair");
    }

    #[test]
    fn test_validate_is_idempotent() {
        let validator = TimelineValidator::new();
        let once = validator.validate(reference_plan()).unwrap();
        let twice = validator.validate(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_interruptible_overlap_is_rejected() {
        let bad = plan(
            10.0,
            vec![
                Action::new(ActionId(0), Channel::Dance, "a", secs(0.0), secs(5.0)),
                Action::new(ActionId(1), Channel::Dance, "b", secs(4.0), secs(3.0)),
            ],
        );

        let err = TimelineValidator::new().validate(bad).unwrap_err();
        assert_eq!(
            err,
            PlanError::Overlap {
                channel: Channel::Dance,
                first: ActionId(0),
                second: ActionId(1),
            }
        );
        assert_eq!(err.conflicting_actions(), vec![ActionId(0), ActionId(1)]);
    }

    #[test]
    fn test_same_start_overlap_is_unrepairable() {
        // Clipping to the later start would leave the earlier action empty.
        let bad = plan(
            10.0,
            vec![
                Action::new(ActionId(0), Channel::Light, "a", secs(2.0), secs(3.0)),
                Action::new(ActionId(1), Channel::Light, "b", secs(2.0), secs(4.0)),
            ],
        );
        let err = TimelineValidator::new().validate(bad).unwrap_err();
        assert_eq!(err.as_label(), "plan_overlap");
    }

    #[test]
    fn test_touching_intervals_pass() {
        let ok = plan(
            10.0,
            vec![
                Action::new(ActionId(0), Channel::Dance, "a", secs(0.0), secs(5.0)),
                Action::new(ActionId(1), Channel::Dance, "b", secs(5.0), secs(5.0)),
            ],
        );
        assert!(TimelineValidator::new().validate(ok).is_ok());
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let bad = plan(
            5.0,
            vec![Action::new(ActionId(0), Channel::Dance, "a", secs(3.0), secs(4.0))],
        );
        let err = TimelineValidator::new().validate(bad).unwrap_err();
        assert!(matches!(err, PlanError::OutOfBounds { id: ActionId(0), .. }));
    }

    #[test]
    fn test_empty_duration_rejected() {
        let bad = plan(
            5.0,
            vec![Action::new(ActionId(0), Channel::Expression, "e", secs(1.0), secs(0.0))],
        );
        let err = TimelineValidator::new().validate(bad).unwrap_err();
        assert_eq!(err, PlanError::EmptyDuration { id: ActionId(0) });
    }

    #[test]
    fn test_overlap_on_different_channels_is_allowed() {
        let ok = plan(
            10.0,
            vec![
                Action::new(ActionId(0), Channel::Dance, "a", secs(0.0), secs(8.0)),
                Action::new(ActionId(1), Channel::Expression, "e", secs(2.0), secs(2.0)),
                Action::new(ActionId(2), Channel::Light, "l", secs(0.0), secs(10.0)),
            ],
        );
        assert!(TimelineValidator::new().validate(ok).is_ok());
    }

    #[test]
    fn test_chain_of_interruptible_overlaps_repairs_each_pair() {
        let validated = TimelineValidator::new()
            .validate(plan(
                12.0,
                vec![
                    Action::new(ActionId(0), Channel::Light, "a", secs(0.0), secs(12.0)),
                    Action::new(ActionId(1), Channel::Light, "b", secs(4.0), secs(8.0)),
                    Action::new(ActionId(2), Channel::Light, "c", secs(8.0), secs(4.0)),
                ],
            ))
            .unwrap();

        assert_eq!(validated.get(ActionId(0)).unwrap().end(), secs(4.0));
        assert_eq!(validated.get(ActionId(1)).unwrap().end(), secs(8.0));
        assert_eq!(validated.get(ActionId(2)).unwrap().end(), secs(12.0));
    }
}
