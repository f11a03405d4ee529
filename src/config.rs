//! # Engine configuration.
//!
//! [`Config`] defines the scheduler's runtime behavior: acknowledgement
//! deadlines and event-bus capacity. [`PlannerConfig`] defines the knobs of
//! plan generation: minimum move durations, expression windows, energy
//! thresholds, breath pacing, and the selection seed.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use showvisor::{Config, PlannerConfig};
//!
//! let mut cfg = Config::default();
//! cfg.ack_timeout = Duration::from_secs(3);
//!
//! let mut planner = PlannerConfig::default();
//! planner.emphasis_energy = 0.8;
//! planner.seed = 42;
//!
//! assert_eq!(cfg.ack_timeout, Duration::from_secs(3));
//! ```

use std::time::Duration;

/// Runtime configuration for the scheduler.
#[derive(Clone, Debug)]
pub struct Config {
    /// Deadline for a discrete command's acknowledgement. Exceeding it is
    /// treated as a per-action dispatch failure.
    pub ack_timeout: Duration,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `ack_timeout = 2s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(2),
            bus_capacity: 1024,
        }
    }
}

/// Configuration for plan generation.
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    /// Segments shorter than this get no dance action (expressions and
    /// lights are still scheduled).
    pub min_dance: Duration,
    /// Gaps on the motion channels shorter than this are left unfilled.
    pub min_gap_fill: Duration,
    /// Span of an expression window.
    pub expression_window: Duration,
    /// Minimum segment energy for scheduling any expression.
    pub expression_energy: f32,
    /// Segment energy at or above which emphasis kicks in: a steady
    /// mid-segment light and a second expression window.
    pub emphasis_energy: f32,
    /// Breath pulse period at zero energy.
    pub breath_slow: Duration,
    /// Breath pulse period at full energy.
    pub breath_fast: Duration,
    /// Seed for move/color/expression selection; equal seeds over equal
    /// analyses produce identical plans.
    pub seed: u64,
}

impl Default for PlannerConfig {
    /// Provides a default configuration:
    /// - `min_dance = 4s`, `min_gap_fill = 1.5s`
    /// - `expression_window = 1.5s`
    /// - `expression_energy = 0.35`, `emphasis_energy = 0.7`
    /// - `breath_slow = 1.2s`, `breath_fast = 400ms`
    /// - `seed = 0`
    fn default() -> Self {
        Self {
            min_dance: Duration::from_secs(4),
            min_gap_fill: Duration::from_millis(1500),
            expression_window: Duration::from_millis(1500),
            expression_energy: 0.35,
            emphasis_energy: 0.7,
            breath_slow: Duration::from_millis(1200),
            breath_fast: Duration::from_millis(400),
            seed: 0,
        }
    }
}

impl PlannerConfig {
    /// Breath pulse period for a segment's energy: linear interpolation
    /// from `breath_slow` at 0 to `breath_fast` at 1.
    pub fn breath_period(&self, energy: f32) -> Duration {
        let energy = energy.clamp(0.0, 1.0) as f64;
        let slow = self.breath_slow.as_secs_f64();
        let fast = self.breath_fast.as_secs_f64();
        Duration::from_secs_f64(slow + (fast - slow) * energy)
    }
}
