//! # Execution report: per-action outcomes and run-level metrics.
//!
//! [`ExecutionReport`] is pure aggregation: one outcome per planned action
//! (planned vs. actual timestamps, final state, error), the overall and
//! per-channel success rates, the strategy tiers that actually ran, any
//! downgrades with their triggering reasons, and a chronological execution
//! log. It is produced once per scheduler run and immutable thereafter.
//!
//! [`ReportBuilder`] is the run's single shared accumulator: every channel
//! loop writes through one lock, and the lock is never held across an
//! await. The builder is discarded once the report is produced.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::error::DeviceError;
use crate::events::Event;
use crate::plan::{secs, secs_opt, ActionId, Channel, ChoreographyPlan};
use crate::schedule::{DowngradeReason, ExecutionStrategy};

/// Per-action lifecycle state.
///
/// ```text
/// pending → dispatched → acknowledged → completed
///                      ↘ failed
///          (any non-terminal) → cancelled
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionState {
    /// Not yet handed to the gateway.
    Pending,
    /// Command sent, acknowledgement outstanding.
    Dispatched,
    /// Gateway acknowledged the command.
    Acknowledged,
    /// Dispatch failed or timed out; the channel moved on.
    Failed,
    /// The action ran to its planned end.
    Completed,
    /// The run ended before this action could finish.
    Cancelled,
}

impl ActionState {
    /// Terminal states never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ActionState::Failed | ActionState::Completed | ActionState::Cancelled
        )
    }
}

/// Final record for one planned action.
#[derive(Clone, Debug, Serialize)]
pub struct ActionOutcome {
    /// Action id from the plan.
    pub id: ActionId,
    /// Channel the action ran on.
    pub channel: Channel,
    /// Command name.
    pub name: String,
    /// Planned start offset.
    #[serde(with = "secs")]
    pub planned_start: Duration,
    /// Planned duration.
    #[serde(with = "secs")]
    pub planned_duration: Duration,
    /// Actual dispatch offset from the run's start reference, if the
    /// action was dispatched at all.
    #[serde(with = "secs_opt", skip_serializing_if = "Option::is_none")]
    pub dispatched_at: Option<Duration>,
    /// Final lifecycle state.
    pub state: ActionState,
    /// Failure detail, when `state == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Which strategy tiers actually ran during the cascade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FeaturesUsed {
    /// Full concurrent multi-channel execution.
    pub synchronized: bool,
    /// Sequential per-channel fallback.
    pub continuous: bool,
    /// One-action-at-a-time fallback.
    pub individual: bool,
}

/// Overall outcome of a scheduler run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// All channels drained.
    Completed,
    /// The external cancel signal ended the run early.
    Cancelled,
    /// Connectivity was lost on every channel; some actions may have
    /// executed, completion is not guaranteed.
    Aborted,
}

/// One recorded fallback-cascade downgrade.
#[derive(Clone, Debug, Serialize)]
pub struct Downgrade {
    /// Tier execution left.
    pub from: ExecutionStrategy,
    /// Tier execution continued on.
    pub to: ExecutionStrategy,
    /// What triggered the downgrade.
    pub reason: String,
}

/// One chronological log entry, rendered from a runtime event.
#[derive(Clone, Debug, Serialize)]
pub struct LogLine {
    /// Global event sequence number.
    pub seq: u64,
    /// Offset from the run's start reference, when the event carries one.
    #[serde(with = "secs_opt", skip_serializing_if = "Option::is_none")]
    pub offset: Option<Duration>,
    /// Human-readable entry.
    pub entry: String,
}

/// Aggregated result of one scheduler run.
#[derive(Clone, Debug, Serialize)]
pub struct ExecutionReport {
    /// Overall run status.
    pub status: RunStatus,
    /// One outcome per planned action, in plan order.
    pub outcomes: Vec<ActionOutcome>,
    /// Strategy tiers that ran.
    pub features_used: FeaturesUsed,
    /// Downgrades in the order they happened.
    pub downgrades: Vec<Downgrade>,
    /// `completed / total * 100` across all actions.
    pub success_rate: f64,
    /// `completed / total * 100` per channel.
    pub channel_success_rates: BTreeMap<Channel, f64>,
    /// Chronological execution log.
    pub execution_log: Vec<LogLine>,
}

impl ExecutionReport {
    /// Number of actions that reached `completed`.
    pub fn completed_actions(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == ActionState::Completed)
            .count()
    }

    /// Outcome of one action.
    pub fn outcome(&self, id: ActionId) -> Option<&ActionOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}

/// The run's single shared accumulator.
///
/// Wrapped in `Arc<tokio::sync::Mutex<_>>` by the scheduler; all writes go
/// through the lock and the guard is dropped before any await.
pub(crate) struct ReportBuilder {
    outcomes: Vec<ActionOutcome>,
    features: FeaturesUsed,
    downgrades: Vec<Downgrade>,
    log: Vec<LogLine>,
}

impl ReportBuilder {
    /// Starts an accumulator with every action pending.
    pub(crate) fn new(plan: &ChoreographyPlan) -> Self {
        let outcomes = plan
            .actions()
            .iter()
            .map(|a| ActionOutcome {
                id: a.id,
                channel: a.channel,
                name: a.name.clone(),
                planned_start: a.start,
                planned_duration: a.duration,
                dispatched_at: None,
                state: ActionState::Pending,
                error: None,
            })
            .collect();
        Self {
            outcomes,
            features: FeaturesUsed::default(),
            downgrades: Vec::new(),
            log: Vec::new(),
        }
    }

    fn entry(&mut self, id: ActionId) -> Option<&mut ActionOutcome> {
        self.outcomes.iter_mut().find(|o| o.id == id)
    }

    pub(crate) fn mark_dispatched(&mut self, id: ActionId, offset: Duration) {
        if let Some(o) = self.entry(id) {
            o.state = ActionState::Dispatched;
            o.dispatched_at = Some(offset);
            o.error = None;
        }
    }

    pub(crate) fn mark_acknowledged(&mut self, id: ActionId) {
        if let Some(o) = self.entry(id) {
            o.state = ActionState::Acknowledged;
        }
    }

    pub(crate) fn mark_completed(&mut self, id: ActionId) {
        if let Some(o) = self.entry(id) {
            o.state = ActionState::Completed;
        }
    }

    pub(crate) fn mark_failed(&mut self, id: ActionId, error: &DeviceError) {
        if let Some(o) = self.entry(id) {
            o.state = ActionState::Failed;
            o.error = Some(error.to_string());
        }
    }

    /// Marks every non-terminal action cancelled (run ended early).
    pub(crate) fn cancel_remaining(&mut self) {
        for o in &mut self.outcomes {
            if !o.state.is_terminal() {
                o.state = ActionState::Cancelled;
            }
        }
    }

    /// True once the action reached `completed`.
    pub(crate) fn is_completed(&self, id: ActionId) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.id == id && o.state == ActionState::Completed)
    }

    /// Flags a tier as having run.
    pub(crate) fn note_tier(&mut self, strategy: ExecutionStrategy) {
        match strategy {
            ExecutionStrategy::Synchronized => self.features.synchronized = true,
            ExecutionStrategy::Continuous => self.features.continuous = true,
            ExecutionStrategy::Individual => self.features.individual = true,
        }
    }

    /// Records a cascade downgrade.
    pub(crate) fn note_downgrade(
        &mut self,
        from: ExecutionStrategy,
        to: ExecutionStrategy,
        reason: &DowngradeReason,
    ) {
        self.downgrades.push(Downgrade {
            from,
            to,
            reason: reason.to_string(),
        });
    }

    /// Appends a rendered event to the chronological log.
    pub(crate) fn record_event(&mut self, ev: &Event) {
        self.log.push(LogLine {
            seq: ev.seq,
            offset: ev.offset,
            entry: render_event(ev),
        });
    }

    /// Produces the immutable report.
    pub(crate) fn build(&self, status: RunStatus) -> ExecutionReport {
        let mut channel_success_rates = BTreeMap::new();
        for channel in Channel::ALL {
            let total = self.outcomes.iter().filter(|o| o.channel == channel).count();
            if total == 0 {
                continue;
            }
            let completed = self
                .outcomes
                .iter()
                .filter(|o| o.channel == channel && o.state == ActionState::Completed)
                .count();
            channel_success_rates.insert(channel, rate(completed, total));
        }

        let completed = self
            .outcomes
            .iter()
            .filter(|o| o.state == ActionState::Completed)
            .count();

        ExecutionReport {
            status,
            outcomes: self.outcomes.clone(),
            features_used: self.features,
            downgrades: self.downgrades.clone(),
            success_rate: rate(completed, self.outcomes.len()),
            channel_success_rates,
            execution_log: self.log.clone(),
        }
    }
}

/// `completed / total * 100`; an empty set counts as fully successful.
fn rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

fn render_event(ev: &Event) -> String {
    let mut entry = format!("{:?}", ev.kind);
    if let Some(action) = ev.action {
        entry.push_str(&format!(" action={action}"));
    }
    if let Some(channel) = ev.channel {
        entry.push_str(&format!(" channel={channel}"));
    }
    if let Some(name) = &ev.name {
        entry.push_str(&format!(" name={name}"));
    }
    if let Some(strategy) = ev.strategy {
        entry.push_str(&format!(" strategy={strategy}"));
    }
    if let Some(reason) = &ev.reason {
        entry.push_str(&format!(" reason={reason}"));
    }
    if let Some(timeout) = ev.timeout {
        entry.push_str(&format!(" timeout={timeout:?}"));
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::plan::{Action, ActionParams, LightColor, LightMode};

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn sample_plan() -> ChoreographyPlan {
        ChoreographyPlan::new(
            secs(6.0),
            vec![
                Action::new(ActionId(0), Channel::Dance, "d1", secs(1.0), secs(4.0)),
                Action::new(ActionId(1), Channel::Light, "green_breath", secs(0.0), secs(3.0))
                    .with_params(ActionParams::light(LightColor::Green, LightMode::Breath, None)),
                Action::new(ActionId(2), Channel::Light, "yellow_normal", secs(3.0), secs(3.0)),
                Action::new(ActionId(3), Channel::Expression, "e1", secs(2.0), secs(2.5)),
            ],
        )
    }

    #[test]
    fn test_all_completed_yields_hundred_percent() {
        let mut builder = ReportBuilder::new(&sample_plan());
        for id in 0..4 {
            builder.mark_dispatched(ActionId(id), secs(0.1));
            builder.mark_acknowledged(ActionId(id));
            builder.mark_completed(ActionId(id));
        }
        let report = builder.build(RunStatus::Completed);

        assert_eq!(report.success_rate, 100.0);
        assert_eq!(report.completed_actions(), 4);
        assert!(report
            .channel_success_rates
            .values()
            .all(|r| *r == 100.0));
    }

    #[test]
    fn test_per_channel_rates() {
        let mut builder = ReportBuilder::new(&sample_plan());
        builder.mark_dispatched(ActionId(0), secs(1.0));
        builder.mark_completed(ActionId(0));
        builder.mark_dispatched(ActionId(1), secs(0.0));
        builder.mark_failed(ActionId(1), &DeviceError::Unreachable);
        builder.mark_dispatched(ActionId(2), secs(3.0));
        builder.mark_completed(ActionId(2));
        builder.mark_dispatched(ActionId(3), secs(2.0));
        builder.mark_completed(ActionId(3));
        let report = builder.build(RunStatus::Completed);

        assert_eq!(report.success_rate, 75.0);
        assert_eq!(report.channel_success_rates[&Channel::Dance], 100.0);
        assert_eq!(report.channel_success_rates[&Channel::Light], 50.0);
        assert_eq!(report.channel_success_rates[&Channel::Expression], 100.0);
        assert!(!report.channel_success_rates.contains_key(&Channel::BasicAction));
    }

    #[test]
    fn test_cancel_remaining_spares_terminal_states() {
        let mut builder = ReportBuilder::new(&sample_plan());
        builder.mark_dispatched(ActionId(0), secs(1.0));
        builder.mark_completed(ActionId(0));
        builder.mark_dispatched(ActionId(1), secs(0.0));
        builder.cancel_remaining();
        let report = builder.build(RunStatus::Cancelled);

        assert_eq!(report.outcome(ActionId(0)).unwrap().state, ActionState::Completed);
        assert_eq!(report.outcome(ActionId(1)).unwrap().state, ActionState::Cancelled);
        assert_eq!(report.outcome(ActionId(2)).unwrap().state, ActionState::Cancelled);
    }

    #[test]
    fn test_redispatch_clears_previous_error() {
        let mut builder = ReportBuilder::new(&sample_plan());
        builder.mark_dispatched(ActionId(0), secs(1.0));
        builder.mark_failed(ActionId(0), &DeviceError::Unreachable);
        assert!(!builder.is_completed(ActionId(0)));

        // A lower tier re-drives the action.
        builder.mark_dispatched(ActionId(0), secs(2.0));
        builder.mark_completed(ActionId(0));
        let report = builder.build(RunStatus::Completed);

        let outcome = report.outcome(ActionId(0)).unwrap();
        assert_eq!(outcome.state, ActionState::Completed);
        assert_eq!(outcome.error, None);
        assert_eq!(outcome.dispatched_at, Some(secs(2.0)));
    }

    #[test]
    fn test_features_and_downgrades_recorded() {
        let mut builder = ReportBuilder::new(&sample_plan());
        builder.note_tier(ExecutionStrategy::Synchronized);
        builder.note_downgrade(
            ExecutionStrategy::Synchronized,
            ExecutionStrategy::Continuous,
            &DowngradeReason::CapabilityUnsupported,
        );
        builder.note_tier(ExecutionStrategy::Continuous);
        let report = builder.build(RunStatus::Completed);

        assert!(report.features_used.synchronized);
        assert!(report.features_used.continuous);
        assert!(!report.features_used.individual);
        assert_eq!(report.downgrades.len(), 1);
        assert_eq!(report.downgrades[0].to, ExecutionStrategy::Continuous);
    }

    #[test]
    fn test_log_preserves_event_order() {
        let mut builder = ReportBuilder::new(&sample_plan());
        builder.record_event(&Event::new(EventKind::RunStarted));
        builder.record_event(
            &Event::new(EventKind::ActionDispatched)
                .with_action(ActionId(0))
                .with_channel(Channel::Dance),
        );
        let report = builder.build(RunStatus::Completed);

        assert_eq!(report.execution_log.len(), 2);
        assert!(report.execution_log[0].seq < report.execution_log[1].seq);
        assert!(report.execution_log[1].entry.contains("action=0"));
    }
}
