//! # Choreography generation.
//!
//! [`ChoreographyPlanner`] converts a segmented music analysis into an
//! unvalidated [`ChoreographyPlan`]. Validation is a separate step — run
//! the result through the
//! [`TimelineValidator`](crate::TimelineValidator) before execution.
//!
//! ## Algorithm
//! ```text
//! for the dance channel:
//!   per segment, pick the dance whose natural duration best fits the span;
//!   a move longer than its segment spans contiguous follow-up segments
//!   (merged for the dance channel only); segments shorter than the
//!   minimum dance duration get no dance
//!
//! for the expression channel:
//!   energetic-enough segments get a short window anchored at the segment
//!   start; emphasis segments get a second window at the midpoint;
//!   windows never overlap each other
//!
//! for the light channel:
//!   one breath-mode light in an emotion-matched color spans the segment;
//!   emphasis segments add a steady light from the midpoint that
//!   implicitly ends the first (the validator clips the overlap)
//!
//! for the basic-action channel:
//!   gaps where no dance is active are filled with fitting basic motions
//!
//! finally, truncate everything to the plan's total duration
//! ```
//!
//! ## Rules
//! - Selection is seeded ([`PlannerConfig::seed`]): equal seed + equal
//!   analysis → identical plan.
//! - The planner only guarantees non-overlap on the channels it owns
//!   outright (dance, basic-action, expression); the intentional light
//!   overlap is left for the validator's repair pass.

use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::analysis::MusicAnalysis;
use crate::config::PlannerConfig;
use crate::plan::{Action, ActionId, ActionParams, Channel, ChoreographyPlan, LightColor, LightMode};
use crate::planner::{EmotionPalette, MotionLibrary};

/// Generates choreography plans from music analyses.
pub struct ChoreographyPlanner {
    cfg: PlannerConfig,
    library: MotionLibrary,
    palette: EmotionPalette,
}

impl Default for ChoreographyPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl ChoreographyPlanner {
    /// Creates a planner with the stock library and palette.
    pub fn new(cfg: PlannerConfig) -> Self {
        Self {
            cfg,
            library: MotionLibrary::default(),
            palette: EmotionPalette::default(),
        }
    }

    /// Replaces the move catalog.
    pub fn with_library(mut self, library: MotionLibrary) -> Self {
        self.library = library;
        self
    }

    /// Replaces the emotion palette.
    pub fn with_palette(mut self, palette: EmotionPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Generates an unvalidated plan for `analysis`.
    pub fn generate(&self, analysis: &MusicAnalysis) -> ChoreographyPlan {
        let total = analysis.duration;
        let mut rng = StdRng::seed_from_u64(self.cfg.seed);
        let mut ids = IdGen::default();
        let mut actions = Vec::new();

        let dance_spans = self.plan_dances(analysis, &mut ids, &mut actions);
        self.plan_expressions(analysis, &mut rng, &mut ids, &mut actions);
        self.plan_lights(analysis, &mut rng, &mut ids, &mut actions);
        self.plan_gap_fill(total, &dance_spans, &mut rng, &mut ids, &mut actions);

        // No action outlives the plan.
        actions.retain_mut(|a| {
            if a.start >= total {
                return false;
            }
            if a.end() > total {
                a.duration = total - a.start;
            }
            !a.duration.is_zero()
        });

        debug!(
            actions = actions.len(),
            total = ?total,
            "generated choreography plan"
        );
        ChoreographyPlan::new(total, actions)
    }

    /// Dance channel: best-fit move per segment, merging contiguous
    /// segments when the move outlasts its segment. Returns the occupied
    /// spans for gap filling.
    fn plan_dances(
        &self,
        analysis: &MusicAnalysis,
        ids: &mut IdGen,
        actions: &mut Vec<Action>,
    ) -> Vec<(Duration, Duration)> {
        let segments = &analysis.segments;
        let mut spans = Vec::new();
        let mut i = 0;

        while i < segments.len() {
            let seg = &segments[i];
            if seg.span() < self.cfg.min_dance {
                i += 1;
                continue;
            }
            let Some(def) = self.library.best_dance(seg.span()) else {
                break;
            };

            // A move longer than the segment spans contiguous follow-ups;
            // the consumed segments are merged for the dance channel only.
            let mut merged_end = seg.end;
            let mut j = i;
            while def.duration > merged_end.saturating_sub(seg.start)
                && j + 1 < segments.len()
                && segments[j + 1].start == segments[j].end
            {
                j += 1;
                merged_end = segments[j].end;
            }

            let available = merged_end.saturating_sub(seg.start);
            let duration = def.duration.min(available);
            if duration.is_zero() {
                i += 1;
                continue;
            }

            actions.push(Action::new(
                ids.next(),
                Channel::Dance,
                def.name.clone(),
                seg.start,
                duration,
            ));
            spans.push((seg.start, seg.start + duration));
            i = j + 1;
        }
        spans
    }

    /// Expression channel: short windows anchored at segment starts, plus a
    /// midpoint window on emphasis segments. Windows never overlap.
    fn plan_expressions(
        &self,
        analysis: &MusicAnalysis,
        rng: &mut StdRng,
        ids: &mut IdGen,
        actions: &mut Vec<Action>,
    ) {
        let mut last_end = Duration::ZERO;

        for seg in &analysis.segments {
            if seg.energy < self.cfg.expression_energy {
                continue;
            }

            let mut anchors = vec![seg.start];
            if seg.energy >= self.cfg.emphasis_energy {
                anchors.push(seg.midpoint());
            }

            for anchor in anchors {
                let start = anchor.max(last_end);
                let end = (start + self.cfg.expression_window).min(seg.end);
                if end <= start {
                    continue;
                }
                let candidates = self.library.expressions_for(&seg.emotion);
                if candidates.is_empty() {
                    return;
                }
                let pick = candidates[rng.random_range(0..candidates.len())];
                actions.push(Action::new(
                    ids.next(),
                    Channel::Expression,
                    pick.name.clone(),
                    start,
                    end - start,
                ));
                last_end = end;
            }
        }
    }

    /// Light channel: a breath light spanning each segment; emphasis
    /// segments add a steady light from the midpoint that implicitly ends
    /// the first (validator repair clips the overlap).
    fn plan_lights(
        &self,
        analysis: &MusicAnalysis,
        rng: &mut StdRng,
        ids: &mut IdGen,
        actions: &mut Vec<Action>,
    ) {
        for seg in &analysis.segments {
            if seg.span().is_zero() {
                continue;
            }
            let colors = self.palette.colors_for(&seg.emotion);
            let base = colors[rng.random_range(0..colors.len())];
            let breath = self.cfg.breath_period(seg.energy);

            actions.push(
                Action::new(
                    ids.next(),
                    Channel::Light,
                    light_name(base, LightMode::Breath),
                    seg.start,
                    seg.span(),
                )
                .with_params(ActionParams::light(base, LightMode::Breath, Some(breath))),
            );

            if seg.energy >= self.cfg.emphasis_energy {
                let emphasis = pick_other(colors, base, rng);
                let start = seg.midpoint();
                let span = seg.end.saturating_sub(start);
                if span.is_zero() {
                    continue;
                }
                actions.push(
                    Action::new(
                        ids.next(),
                        Channel::Light,
                        light_name(emphasis, LightMode::Normal),
                        start,
                        span,
                    )
                    .with_params(ActionParams::light(emphasis, LightMode::Normal, None)),
                );
            }
        }
    }

    /// Basic-action channel: fill stretches where no dance is active.
    fn plan_gap_fill(
        &self,
        total: Duration,
        dance_spans: &[(Duration, Duration)],
        rng: &mut StdRng,
        ids: &mut IdGen,
        actions: &mut Vec<Action>,
    ) {
        let mut gaps = Vec::new();
        let mut cursor = Duration::ZERO;
        for &(start, end) in dance_spans {
            if start > cursor {
                gaps.push((cursor, start));
            }
            cursor = cursor.max(end);
        }
        if total > cursor {
            gaps.push((cursor, total));
        }

        for (gap_start, gap_end) in gaps {
            let mut at = gap_start;
            loop {
                let remaining = gap_end.saturating_sub(at);
                if remaining < self.cfg.min_gap_fill {
                    break;
                }
                let candidates = self.library.basics_fitting(remaining);
                if candidates.is_empty() {
                    break;
                }
                let pick = candidates[rng.random_range(0..candidates.len())];
                actions.push(Action::new(
                    ids.next(),
                    Channel::BasicAction,
                    pick.name.clone(),
                    at,
                    pick.duration,
                ));
                at += pick.duration;
            }
        }
    }
}

/// Monotonic id source for one generation pass.
#[derive(Default)]
struct IdGen(u32);

impl IdGen {
    fn next(&mut self) -> ActionId {
        let id = ActionId(self.0);
        self.0 += 1;
        id
    }
}

fn light_name(color: LightColor, mode: LightMode) -> String {
    format!("{}_{}", color.as_str(), mode.as_str())
}

/// Picks a color different from `taken` when the set allows it.
fn pick_other(colors: &[LightColor], taken: LightColor, rng: &mut StdRng) -> LightColor {
    let others: Vec<LightColor> = colors.iter().copied().filter(|c| *c != taken).collect();
    if others.is_empty() {
        taken
    } else {
        others[rng.random_range(0..others.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Segment;
    use crate::plan::TimelineValidator;
    use crate::planner::MotionDef;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn two_segment_analysis() -> MusicAnalysis {
        MusicAnalysis::new(
            secs(16.0),
            vec![
                Segment::new(secs(0.0), secs(8.0), 0.9, "energetic"),
                Segment::new(secs(8.0), secs(16.0), 0.2, "calm"),
            ],
        )
    }

    fn channel_actions(plan: &ChoreographyPlan, channel: Channel) -> Vec<Action> {
        plan.channel_timeline(channel).into_iter().cloned().collect()
    }

    #[test]
    fn test_generated_plan_passes_validation() {
        let plan = ChoreographyPlanner::default().generate(&two_segment_analysis());
        let validated = TimelineValidator::new().validate(plan).expect("plan is valid");
        assert!(!validated.is_empty());
    }

    #[test]
    fn test_each_segment_gets_a_breath_light() {
        let plan = ChoreographyPlanner::default().generate(&two_segment_analysis());
        let lights = channel_actions(&plan, Channel::Light);

        let breath: Vec<&Action> = lights
            .iter()
            .filter(|a| a.params.mode == Some(LightMode::Breath))
            .collect();
        assert_eq!(breath.len(), 2);
        assert_eq!(breath[0].start, secs(0.0));
        assert_eq!(breath[1].start, secs(8.0));
        assert!(breath.iter().all(|a| a.interruptible));
    }

    #[test]
    fn test_emphasis_segment_gets_mid_segment_steady_light() {
        let plan = ChoreographyPlanner::default().generate(&two_segment_analysis());
        let lights = channel_actions(&plan, Channel::Light);

        let steady: Vec<&Action> = lights
            .iter()
            .filter(|a| a.params.mode == Some(LightMode::Normal))
            .collect();
        assert_eq!(steady.len(), 1, "only the energetic segment gets emphasis");
        assert_eq!(steady[0].start, secs(4.0), "anchored at the segment midpoint");
    }

    #[test]
    fn test_low_energy_segment_gets_no_expression() {
        let plan = ChoreographyPlanner::default().generate(&two_segment_analysis());
        let expressions = channel_actions(&plan, Channel::Expression);

        assert!(!expressions.is_empty());
        assert!(
            expressions.iter().all(|a| a.end() <= secs(8.0)),
            "calm segment (energy 0.2) schedules no expression"
        );
    }

    #[test]
    fn test_expressions_do_not_overlap() {
        let plan = ChoreographyPlanner::default().generate(&two_segment_analysis());
        let expressions = channel_actions(&plan, Channel::Expression);
        for pair in expressions.windows(2) {
            assert!(pair[0].end() <= pair[1].start);
        }
    }

    #[test]
    fn test_short_segment_gets_no_dance_but_keeps_light() {
        let analysis = MusicAnalysis::new(
            secs(2.0),
            vec![Segment::new(secs(0.0), secs(2.0), 0.5, "happy")],
        );
        let plan = ChoreographyPlanner::default().generate(&analysis);

        assert!(channel_actions(&plan, Channel::Dance).is_empty());
        assert!(!channel_actions(&plan, Channel::Light).is_empty());
    }

    #[test]
    fn test_long_dance_merges_contiguous_segments() {
        let library = MotionLibrary::default()
            .with_dances(vec![MotionDef::new("marathon", secs(10.0))]);
        let analysis = MusicAnalysis::new(
            secs(10.0),
            vec![
                Segment::new(secs(0.0), secs(4.0), 0.6, "happy"),
                Segment::new(secs(4.0), secs(10.0), 0.6, "happy"),
            ],
        );
        let plan = ChoreographyPlanner::default()
            .with_library(library)
            .generate(&analysis);

        let dances = channel_actions(&plan, Channel::Dance);
        assert_eq!(dances.len(), 1, "merged segments yield a single dance");
        assert_eq!(dances[0].start, secs(0.0));
        assert_eq!(dances[0].duration, secs(10.0));
    }

    #[test]
    fn test_gap_fill_covers_time_without_dance() {
        let library = MotionLibrary::default()
            .with_dances(vec![MotionDef::new("opener", secs(4.0))]);
        let analysis = MusicAnalysis::new(
            secs(12.0),
            vec![Segment::new(secs(0.0), secs(12.0), 0.6, "happy")],
        );
        let plan = ChoreographyPlanner::default()
            .with_library(library)
            .generate(&analysis);

        let basics = channel_actions(&plan, Channel::BasicAction);
        assert!(!basics.is_empty(), "time after the 4s dance gets basic fill");
        assert!(basics.iter().all(|a| a.start >= secs(4.0)));
        for pair in basics.windows(2) {
            assert!(pair[0].end() <= pair[1].start);
        }
    }

    #[test]
    fn test_actions_truncated_to_total_duration() {
        // Segment extends past the declared track duration.
        let analysis = MusicAnalysis::new(
            secs(5.0),
            vec![Segment::new(secs(0.0), secs(8.0), 0.9, "energetic")],
        );
        let plan = ChoreographyPlanner::default().generate(&analysis);

        let total = plan.total_duration();
        assert!(plan.actions().iter().all(|a| a.end() <= total));
    }

    #[test]
    fn test_same_seed_same_plan() {
        let analysis = two_segment_analysis();
        let a = ChoreographyPlanner::default().generate(&analysis);
        let b = ChoreographyPlanner::default().generate(&analysis);
        assert_eq!(a, b);
    }

    #[test]
    fn test_light_colors_come_from_emotion_palette() {
        let plan = ChoreographyPlanner::default().generate(&two_segment_analysis());
        let lights = channel_actions(&plan, Channel::Light);

        let energetic = &[LightColor::Red, LightColor::Yellow, LightColor::Cyan];
        let calm = &[LightColor::Blue, LightColor::Green, LightColor::White];
        for light in lights {
            let color = light.params.color.expect("light actions carry a color");
            if light.start < secs(8.0) {
                assert!(energetic.contains(&color), "{color} not an energetic color");
            } else {
                assert!(calm.contains(&color), "{color} not a calm color");
            }
        }
    }
}
