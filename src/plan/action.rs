//! # Channels, timed actions, and the light vocabulary.
//!
//! An [`Action`] is one timed command on one [`Channel`]. The four channels
//! are independently schedulable streams that share a single physical
//! device: the robot's body (dance and basic-action), its face
//! (expression), and its indicator light.
//!
//! ## Channel rules
//! - **Motion channels** (dance, basic-action) hold the body exclusively:
//!   a running motion must be stopped before the channel's next command.
//! - **Discrete channels** (light, expression) are acknowledged set-and-hold
//!   commands; a later command implicitly replaces the earlier one.
//!
//! Channels are declared in dispatch-priority order (dance before light
//! before expression) and `Ord` follows declaration order; ties in
//! single-file execution are broken by this rank.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{secs, secs_opt};

/// Identifier of an action within one plan.
///
/// Assigned once when the plan is built and stable for the lifetime of the
/// run; reports and validation errors refer to actions by this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub u32);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the four independent command streams sharing the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// Long-running full-body dance moves.
    Dance,
    /// Short body motions filling gaps between dances.
    BasicAction,
    /// Indicator-light color/mode commands.
    Light,
    /// Facial expression commands.
    Expression,
}

impl Channel {
    /// All channels, in dispatch-priority order.
    pub const ALL: [Channel; 4] = [
        Channel::Dance,
        Channel::BasicAction,
        Channel::Light,
        Channel::Expression,
    ];

    /// Stable lowercase name, matching the wire shape.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Dance => "dance",
            Channel::BasicAction => "basic-action",
            Channel::Light => "light",
            Channel::Expression => "expression",
        }
    }

    /// Motion channels occupy the robot's body; their commands are
    /// long-running starts that must be stopped before the channel's next
    /// command.
    pub fn is_motion(self) -> bool {
        matches!(self, Channel::Dance | Channel::BasicAction)
    }

    /// Discrete channels await a per-command acknowledgement and need no
    /// explicit stop.
    pub fn is_discrete(self) -> bool {
        !self.is_motion()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator-light color. The vocabulary is fixed by the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Cyan,
    White,
}

impl LightColor {
    /// All seven device colors.
    pub const ALL: [LightColor; 7] = [
        LightColor::Red,
        LightColor::Green,
        LightColor::Blue,
        LightColor::Yellow,
        LightColor::Purple,
        LightColor::Cyan,
        LightColor::White,
    ];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            LightColor::Red => "red",
            LightColor::Green => "green",
            LightColor::Blue => "blue",
            LightColor::Yellow => "yellow",
            LightColor::Purple => "purple",
            LightColor::Cyan => "cyan",
            LightColor::White => "white",
        }
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator-light mode.
///
/// `Breath` is the sustained default; `Normal` (steady) is used for
/// emphasis near energy peaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightMode {
    /// Steady light.
    Normal,
    /// Slow pulse, period controlled by `breath_period`.
    #[default]
    Breath,
}

impl LightMode {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            LightMode::Normal => "normal",
            LightMode::Breath => "breath",
        }
    }
}

impl fmt::Display for LightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter bag attached to an action.
///
/// Only light actions use it today; absent fields fall back to scheduler
/// defaults at dispatch time (green, breath).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionParams {
    /// Light color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<LightColor>,
    /// Light mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<LightMode>,
    /// Pulse period for `breath` mode.
    #[serde(default, with = "secs_opt", skip_serializing_if = "Option::is_none")]
    pub breath_period: Option<Duration>,
}

impl ActionParams {
    /// Parameters for a light action.
    pub fn light(color: LightColor, mode: LightMode, breath_period: Option<Duration>) -> Self {
        Self {
            color: Some(color),
            mode: Some(mode),
            breath_period,
        }
    }

    /// True when no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.mode.is_none() && self.breath_period.is_none()
    }
}

/// One timed command on one channel.
///
/// `start` and `duration` are offsets relative to plan start; the occupied
/// interval is half-open, `[start, start + duration)`, so intervals may
/// touch but not overlap on a channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Plan-stable identifier.
    pub id: ActionId,
    /// Channel this action belongs to.
    pub channel: Channel,
    /// Command name understood by the gateway (move, expression) or a
    /// descriptive label (lights).
    pub name: String,
    /// Offset of the action start from plan start.
    #[serde(rename = "start_time", with = "secs")]
    pub start: Duration,
    /// How long the action occupies its channel.
    #[serde(with = "secs")]
    pub duration: Duration,
    /// Whether a later same-channel action may cut this one short.
    /// Interruptible actions are the repairable ones during validation.
    #[serde(default)]
    pub interruptible: bool,
    /// Channel-specific parameters.
    #[serde(default, skip_serializing_if = "ActionParams::is_empty")]
    pub params: ActionParams,
}

impl Action {
    /// Creates an action with the channel's default interruptibility:
    /// motions hold their slot, light and expression yield to later
    /// commands (dance > light > expression priority).
    pub fn new(
        id: ActionId,
        channel: Channel,
        name: impl Into<String>,
        start: Duration,
        duration: Duration,
    ) -> Self {
        Self {
            id,
            channel,
            name: name.into(),
            start,
            duration,
            interruptible: channel.is_discrete(),
            params: ActionParams::default(),
        }
    }

    /// Overrides the interruptible flag.
    pub fn with_interruptible(mut self, interruptible: bool) -> Self {
        self.interruptible = interruptible;
        self
    }

    /// Attaches parameters.
    pub fn with_params(mut self, params: ActionParams) -> Self {
        self.params = params;
        self
    }

    /// End offset of the occupied interval.
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }

    /// Half-open interval overlap with another action.
    pub fn overlaps(&self, other: &Action) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(start_ms: u64, dur_ms: u64) -> Action {
        Action::new(
            ActionId(0),
            Channel::Dance,
            "spin",
            Duration::from_millis(start_ms),
            Duration::from_millis(dur_ms),
        )
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let a = action(0, 1000);
        let b = action(1000, 500);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_overlapping_intervals() {
        let a = action(0, 1500);
        let b = action(1000, 500);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_default_interruptibility_follows_channel() {
        let dance = Action::new(
            ActionId(1),
            Channel::Dance,
            "spin",
            Duration::ZERO,
            Duration::from_secs(1),
        );
        let light = Action::new(
            ActionId(2),
            Channel::Light,
            "green",
            Duration::ZERO,
            Duration::from_secs(1),
        );
        assert!(!dance.interruptible);
        assert!(light.interruptible);
    }

    #[test]
    fn test_channel_rank_order() {
        assert!(Channel::Dance < Channel::BasicAction);
        assert!(Channel::BasicAction < Channel::Light);
        assert!(Channel::Light < Channel::Expression);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(Channel::BasicAction.as_str(), "basic-action");
        assert_eq!(LightColor::Cyan.as_str(), "cyan");
        assert_eq!(LightMode::default(), LightMode::Breath);
    }
}
