//! # The choreography plan and the caller-facing submission shape.
//!
//! A [`ChoreographyPlan`] owns the full set of timed actions for one
//! performance run plus the total duration. It is produced either by the
//! [`ChoreographyPlanner`](crate::ChoreographyPlanner) or from a
//! [`PlanRequest`] submitted by a caller, and must pass the
//! [`TimelineValidator`](crate::TimelineValidator) before execution.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::action::{Action, ActionId, ActionParams, Channel};
use super::secs;

/// The full set of timed actions for one performance run.
///
/// Invariant (enforced by validation, not construction): per channel, no
/// two non-interruptible actions have overlapping `[start, end)` intervals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChoreographyPlan {
    #[serde(rename = "total_duration", with = "secs")]
    total: Duration,
    actions: Vec<Action>,
}

impl ChoreographyPlan {
    /// Creates a plan from pre-built actions.
    pub fn new(total: Duration, actions: Vec<Action>) -> Self {
        Self { total, actions }
    }

    /// Total duration of the run; no action may end past it.
    pub fn total_duration(&self) -> Duration {
        self.total
    }

    /// All actions, in construction order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Number of actions across all channels.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when the plan has no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Looks an action up by id.
    pub fn get(&self, id: ActionId) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Channels that have at least one action, in dispatch-priority order.
    pub fn channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|ch| self.actions.iter().any(|a| a.channel == *ch))
            .collect()
    }

    /// One channel's actions ordered by start offset (ties by id).
    pub fn channel_timeline(&self, channel: Channel) -> Vec<&Action> {
        let mut timeline: Vec<&Action> =
            self.actions.iter().filter(|a| a.channel == channel).collect();
        timeline.sort_by_key(|a| (a.start, a.id));
        timeline
    }

    /// Mutable access for the validator's repair pass.
    pub(crate) fn actions_mut(&mut self) -> &mut [Action] {
        &mut self.actions
    }
}

/// One submitted action: `{channel, name, start_time, duration, params}`.
///
/// Ids are assigned by [`PlanRequest::into_plan`]; when `interruptible` is
/// omitted the channel default applies (motions hold, light/expression
/// yield).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Target channel.
    pub channel: Channel,
    /// Command name or label.
    pub name: String,
    /// Offset from plan start.
    #[serde(with = "secs")]
    pub start_time: Duration,
    /// Occupied span on the channel.
    #[serde(with = "secs")]
    pub duration: Duration,
    /// Optional override of the channel's interruptibility default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interruptible: Option<bool>,
    /// Channel-specific parameters.
    #[serde(default, skip_serializing_if = "ActionParams::is_empty")]
    pub params: ActionParams,
}

/// Caller-facing plan submission: a total duration plus a list of actions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Total duration of the run.
    #[serde(with = "secs")]
    pub total_duration: Duration,
    /// Submitted actions, any order.
    pub actions: Vec<ActionRequest>,
}

impl PlanRequest {
    /// Builds an owned plan, assigning ids in submission order.
    pub fn into_plan(self) -> ChoreographyPlan {
        let actions = self
            .actions
            .into_iter()
            .enumerate()
            .map(|(i, req)| {
                let mut action = Action::new(
                    ActionId(i as u32),
                    req.channel,
                    req.name,
                    req.start_time,
                    req.duration,
                )
                .with_params(req.params);
                if let Some(interruptible) = req.interruptible {
                    action.interruptible = interruptible;
                }
                action
            })
            .collect();
        ChoreographyPlan::new(self.total_duration, actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{LightColor, LightMode};

    #[test]
    fn test_request_assigns_sequential_ids() {
        let request = PlanRequest {
            total_duration: Duration::from_secs(10),
            actions: vec![
                ActionRequest {
                    channel: Channel::Dance,
                    name: "spin".into(),
                    start_time: Duration::ZERO,
                    duration: Duration::from_secs(4),
                    interruptible: None,
                    params: ActionParams::default(),
                },
                ActionRequest {
                    channel: Channel::Light,
                    name: "green".into(),
                    start_time: Duration::ZERO,
                    duration: Duration::from_secs(10),
                    interruptible: None,
                    params: ActionParams::light(LightColor::Green, LightMode::Breath, None),
                },
            ],
        };

        let plan = request.into_plan();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.actions()[0].id, ActionId(0));
        assert_eq!(plan.actions()[1].id, ActionId(1));
        assert!(!plan.actions()[0].interruptible, "dance holds its slot");
        assert!(plan.actions()[1].interruptible, "light yields by default");
    }

    #[test]
    fn test_request_wire_shape_round_trip() {
        let json = r#"{
            "total_duration": 6.0,
            "actions": [
                {"channel": "dance", "name": "spin", "start_time": 1.0, "duration": 4.0},
                {"channel": "light", "name": "green", "start_time": 0.0, "duration": 6.0,
                 "params": {"color": "green", "mode": "breath"}}
            ]
        }"#;

        let request: PlanRequest = serde_json::from_str(json).expect("request parses");
        assert_eq!(request.actions[0].channel, Channel::Dance);
        assert_eq!(request.actions[1].params.color, Some(LightColor::Green));

        let plan = request.into_plan();
        assert_eq!(plan.total_duration(), Duration::from_secs(6));
        assert_eq!(plan.channel_timeline(Channel::Light).len(), 1);
    }

    #[test]
    fn test_channels_in_rank_order() {
        let request = PlanRequest {
            total_duration: Duration::from_secs(5),
            actions: vec![
                ActionRequest {
                    channel: Channel::Expression,
                    name: "smile".into(),
                    start_time: Duration::ZERO,
                    duration: Duration::from_secs(1),
                    interruptible: None,
                    params: ActionParams::default(),
                },
                ActionRequest {
                    channel: Channel::Dance,
                    name: "spin".into(),
                    start_time: Duration::ZERO,
                    duration: Duration::from_secs(2),
                    interruptible: None,
                    params: ActionParams::default(),
                },
            ],
        };
        let plan = request.into_plan();
        assert_eq!(plan.channels(), vec![Channel::Dance, Channel::Expression]);
    }

    #[test]
    fn test_timeline_sorted_by_start() {
        let mk = |start: u64| ActionRequest {
            channel: Channel::BasicAction,
            name: "nod".into(),
            start_time: Duration::from_secs(start),
            duration: Duration::from_secs(1),
            interruptible: None,
            params: ActionParams::default(),
        };
        let plan = PlanRequest {
            total_duration: Duration::from_secs(10),
            actions: vec![mk(4), mk(0), mk(2)],
        }
        .into_plan();

        let starts: Vec<u64> = plan
            .channel_timeline(Channel::BasicAction)
            .iter()
            .map(|a| a.start.as_secs())
            .collect();
        assert_eq!(starts, vec![0, 2, 4]);
    }
}
