//! Music analysis input: the segmented description of a track.
//!
//! The engine does not analyze audio itself. It consumes a finished
//! [`MusicAnalysis`]: an ordered sequence of [`Segment`]s, each carrying a
//! time span, an energy value in `[0, 1]`, and an emotion label. The
//! planner turns this into a timed action plan.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::plan::secs;

/// A time-bounded slice of the analyzed track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Offset of the segment start from the beginning of the track.
    #[serde(with = "secs")]
    pub start: Duration,
    /// Offset of the segment end from the beginning of the track.
    #[serde(with = "secs")]
    pub end: Duration,
    /// Perceived energy in `[0, 1]`.
    pub energy: f32,
    /// Emotion label, e.g. `"energetic"` or `"calm"`. Labels are open-ended;
    /// unknown labels fall back to neutral planning defaults.
    pub emotion: String,
}

impl Segment {
    /// Creates a segment; `end` values before `start` are clamped to `start`.
    pub fn new(start: Duration, end: Duration, energy: f32, emotion: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            energy: energy.clamp(0.0, 1.0),
            emotion: emotion.into(),
        }
    }

    /// Length of the segment.
    pub fn span(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    /// Midpoint offset of the segment.
    ///
    /// Used as the emphasis anchor: the analysis carries one energy value
    /// per segment and no intra-segment peak positions.
    pub fn midpoint(&self) -> Duration {
        self.start + self.span() / 2
    }
}

/// Finished analysis of one music track.
///
/// Segments are kept ordered by start offset; [`MusicAnalysis::new`] sorts
/// them on construction so the planner can walk them front to back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MusicAnalysis {
    /// Total track duration. Actions are truncated so none outlives it.
    #[serde(with = "secs")]
    pub duration: Duration,
    /// Ordered segments covering the track.
    pub segments: Vec<Segment>,
}

impl MusicAnalysis {
    /// Creates an analysis, ordering segments by start offset.
    pub fn new(duration: Duration, mut segments: Vec<Segment>) -> Self {
        segments.sort_by_key(|s| s.start);
        Self { duration, segments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_span_and_midpoint() {
        let s = Segment::new(
            Duration::from_secs(2),
            Duration::from_secs(6),
            0.5,
            "happy",
        );
        assert_eq!(s.span(), Duration::from_secs(4));
        assert_eq!(s.midpoint(), Duration::from_secs(4));
    }

    #[test]
    fn test_segment_clamps_inverted_end_and_energy() {
        let s = Segment::new(Duration::from_secs(5), Duration::from_secs(1), 1.7, "calm");
        assert_eq!(s.span(), Duration::ZERO);
        assert_eq!(s.energy, 1.0);
    }

    #[test]
    fn test_analysis_orders_segments() {
        let a = MusicAnalysis::new(
            Duration::from_secs(10),
            vec![
                Segment::new(Duration::from_secs(5), Duration::from_secs(10), 0.5, "calm"),
                Segment::new(Duration::from_secs(0), Duration::from_secs(5), 0.9, "energetic"),
            ],
        );
        assert_eq!(a.segments[0].start, Duration::ZERO);
        assert_eq!(a.segments[1].start, Duration::from_secs(5));
    }
}
