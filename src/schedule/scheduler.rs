//! # PerformanceScheduler: executes a validated plan against the gateway.
//!
//! The scheduler owns the event bus, a [`SubscriberSet`], and the runtime
//! configuration. One call to [`PerformanceScheduler::execute`] is one run:
//! it captures the monotonic start reference `t0` once, drives the strategy
//! cascade, and always returns an [`ExecutionReport`] — never a bare error.
//!
//! ## High-level architecture
//! ```text
//! execute(plan, gateway, cancel):
//!   ├─► probe gateway capability
//!   │     supports(synchronized)? ──no──► start at Continuous
//!   │
//!   ├─► Synchronized tier
//!   │     one ChannelActor per channel  (JoinSet, shared t0)
//!   │       dance ─┐
//!   │       basic ─┼── concurrent loops, tier CancellationToken
//!   │       light ─┤
//!   │       expr  ─┘
//!   │     first dispatch on any channel unreachable ──► downgrade
//!   │
//!   ├─► Continuous tier (sequential)
//!   │     drive motion timeline to completion, queue light/expression
//!   │     commands without fine-grained timing guarantees
//!   │     very first dispatch unreachable ──► downgrade
//!   │
//!   ├─► Individual tier (serial, best-effort timing)
//!   │     every plan channel unreachable on first dispatch ──► abort
//!   │
//!   └─► ReportBuilder.build(status) ──► ExecutionReport
//! ```
//!
//! ## Rules
//! - A downgrade is one-way; a run never re-attempts a higher tier.
//! - Each lower tier re-drives every action not already `completed`, from
//!   the same `t0`; one outcome per action, last tier wins.
//! - Per-action failures are absorbed and recorded; only first-dispatch
//!   connectivity errors move the cascade.
//! - Cancellation is cooperative, polled at every suspension point; the
//!   active motion is stopped where the gateway supports it and the partial
//!   report is returned immediately.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::DeviceError;
use crate::events::{Bus, Event, EventKind};
use crate::gateway::{Capability, GatewayRef};
use crate::plan::{Action, Channel, ChoreographyPlan};
use crate::report::{ExecutionReport, ReportBuilder, RunStatus};
use crate::schedule::channel::ChannelActor;
use crate::schedule::dispatch::{complete_action, dispatch_one, emit, stop_motion};
use crate::schedule::{ConnectivityProbe, DowngradeReason, ExecutionStrategy, TierOutcome};
use crate::subscribers::{Subscribe, SubscriberSet};

/// The run's shared accumulator handle.
pub(crate) type SharedReport = Arc<Mutex<ReportBuilder>>;

/// Coordinates channel loops, the fallback cascade, and report assembly.
pub struct PerformanceScheduler {
    cfg: Config,
    bus: Bus,
}

impl PerformanceScheduler {
    /// Creates a scheduler and wires the given subscribers to its bus.
    ///
    /// Must be called inside a tokio runtime: the subscriber listener and
    /// per-subscriber workers are spawned here.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let subs = Arc::new(SubscriberSet::new(subscribers));
        Self::spawn_listener(&bus, subs);
        Self { cfg, bus }
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget).
    fn spawn_listener(bus: &Bus, subs: Arc<SubscriberSet>) {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                subs.emit(&ev);
            }
        });
    }

    /// The scheduler's event bus, for additional receivers.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Executes a validated plan.
    ///
    /// Runs until every action reaches a terminal state, the external
    /// `cancel` token fires, or connectivity is lost on every channel at
    /// the lowest tier. The caller always receives a report; an `aborted`
    /// status means some actions may have executed and completion is not
    /// guaranteed.
    pub async fn execute(
        &self,
        plan: &ChoreographyPlan,
        gateway: GatewayRef,
        cancel: CancellationToken,
    ) -> ExecutionReport {
        let report: SharedReport = Arc::new(Mutex::new(ReportBuilder::new(plan)));
        let plan_channels = plan.channels();
        let t0 = Instant::now();

        // Capability probing happened at gateway construction; read the
        // static flag once per run.
        let synchronized_supported = gateway.supports(Capability::SynchronizedMultiChannel);
        let mut strategy = if synchronized_supported {
            ExecutionStrategy::Synchronized
        } else {
            ExecutionStrategy::Continuous
        };

        emit(
            &self.bus,
            &report,
            Event::new(EventKind::RunStarted).with_strategy(strategy),
        )
        .await;

        if !synchronized_supported {
            let reason = DowngradeReason::CapabilityUnsupported;
            report.lock().await.note_downgrade(
                ExecutionStrategy::Synchronized,
                ExecutionStrategy::Continuous,
                &reason,
            );
            emit(
                &self.bus,
                &report,
                Event::new(EventKind::StrategyDowngraded)
                    .with_strategy(ExecutionStrategy::Continuous)
                    .with_reason(reason.to_string()),
            )
            .await;
        }

        let status = loop {
            report.lock().await.note_tier(strategy);
            let remaining = self.remaining_actions(plan, &report).await;
            if remaining.is_empty() {
                break RunStatus::Completed;
            }
            debug!(strategy = %strategy, remaining = remaining.len(), "running tier");

            let outcome = match strategy {
                ExecutionStrategy::Synchronized => {
                    self.run_synchronized(&remaining, &gateway, t0, &report, &cancel)
                        .await
                }
                ExecutionStrategy::Continuous => {
                    self.run_continuous(&remaining, &gateway, t0, &report, &cancel)
                        .await
                }
                ExecutionStrategy::Individual => {
                    self.run_individual(&remaining, &plan_channels, &gateway, t0, &report, &cancel)
                        .await
                }
            };

            match outcome {
                TierOutcome::Completed => break RunStatus::Completed,
                TierOutcome::Cancelled => {
                    report.lock().await.cancel_remaining();
                    emit(&self.bus, &report, Event::new(EventKind::RunCancelled)).await;
                    break RunStatus::Cancelled;
                }
                TierOutcome::Downgrade(reason) => match strategy.next_tier() {
                    Some(lower) => {
                        warn!(from = %strategy, to = %lower, reason = %reason, "strategy downgraded");
                        report.lock().await.note_downgrade(strategy, lower, &reason);
                        emit(
                            &self.bus,
                            &report,
                            Event::new(EventKind::StrategyDowngraded)
                                .with_strategy(lower)
                                .with_reason(reason.to_string()),
                        )
                        .await;
                        strategy = lower;
                    }
                    None => {
                        report.lock().await.cancel_remaining();
                        emit(
                            &self.bus,
                            &report,
                            Event::new(EventKind::RunAborted).with_reason(reason.to_string()),
                        )
                        .await;
                        break RunStatus::Aborted;
                    }
                },
                TierOutcome::Abort(reason) => {
                    report.lock().await.cancel_remaining();
                    emit(
                        &self.bus,
                        &report,
                        Event::new(EventKind::RunAborted).with_reason(reason.to_string()),
                    )
                    .await;
                    break RunStatus::Aborted;
                }
            }
        };

        if status == RunStatus::Completed {
            emit(&self.bus, &report, Event::new(EventKind::RunCompleted)).await;
        }

        let report = report.lock().await.build(status);
        debug!(status = ?status, success_rate = report.success_rate, "run finished");
        report
    }

    /// Actions a lower tier still has to drive: everything not completed.
    async fn remaining_actions(
        &self,
        plan: &ChoreographyPlan,
        report: &SharedReport,
    ) -> Vec<Action> {
        let guard = report.lock().await;
        plan.actions()
            .iter()
            .filter(|a| !guard.is_completed(a.id))
            .cloned()
            .collect()
    }

    /// Synchronized tier: one concurrent loop per channel.
    async fn run_synchronized(
        &self,
        actions: &[Action],
        gateway: &GatewayRef,
        t0: Instant,
        report: &SharedReport,
        cancel: &CancellationToken,
    ) -> TierOutcome {
        let tier_token = cancel.child_token();
        let probe = Arc::new(ConnectivityProbe::new(tier_token.clone()));

        let mut set = JoinSet::new();
        for channel in Channel::ALL {
            let mut timeline: Vec<Action> = actions
                .iter()
                .filter(|a| a.channel == channel)
                .cloned()
                .collect();
            if timeline.is_empty() {
                continue;
            }
            timeline.sort_by_key(|a| (a.start, a.id));

            let actor = ChannelActor {
                channel,
                actions: timeline,
                gateway: Arc::clone(gateway),
                bus: self.bus.clone(),
                report: Arc::clone(report),
                ack_timeout: self.cfg.ack_timeout,
                probe: Arc::clone(&probe),
            };
            set.spawn(actor.run(t0, tier_token.clone()));
        }
        while set.join_next().await.is_some() {}

        if cancel.is_cancelled() {
            TierOutcome::Cancelled
        } else if let Some(reason) = probe.tripped() {
            TierOutcome::Downgrade(reason.clone())
        } else {
            TierOutcome::Completed
        }
    }

    /// Continuous tier: drive the motion timeline to completion while
    /// queuing discrete commands without fine-grained timing guarantees.
    async fn run_continuous(
        &self,
        actions: &[Action],
        gateway: &GatewayRef,
        t0: Instant,
        report: &SharedReport,
        cancel: &CancellationToken,
    ) -> TierOutcome {
        let mut motions: Vec<&Action> =
            actions.iter().filter(|a| a.channel.is_motion()).collect();
        motions.sort_by_key(|a| (a.start, a.channel, a.id));
        let mut discretes: Vec<&Action> =
            actions.iter().filter(|a| a.channel.is_discrete()).collect();
        discretes.sort_by_key(|a| (a.start, a.channel, a.id));

        let mut first = true;
        let mut di = 0;

        for (mi, motion) in motions.iter().enumerate() {
            // Queue discrete commands due before this motion begins,
            // back-to-back.
            while di < discretes.len() && discretes[di].start <= motion.start {
                let discrete = discretes[di];
                match self.dispatch_or_cancel(discrete, gateway, t0, report, cancel).await {
                    None => return TierOutcome::Cancelled,
                    Some(Ok(())) => complete_action(&self.bus, report, discrete).await,
                    Some(Err(err)) => {
                        if first && err.is_connectivity() {
                            return TierOutcome::Downgrade(
                                DowngradeReason::FirstDispatchConnectivity {
                                    channel: discrete.channel,
                                },
                            );
                        }
                    }
                }
                first = false;
                di += 1;
            }

            if wait_until(t0 + motion.start, cancel).await {
                return TierOutcome::Cancelled;
            }
            match self.dispatch_or_cancel(motion, gateway, t0, report, cancel).await {
                None => {
                    stop_motion(motion.channel, gateway, &self.bus, t0, report).await;
                    return TierOutcome::Cancelled;
                }
                Some(Err(err)) => {
                    if first && err.is_connectivity() {
                        return TierOutcome::Downgrade(
                            DowngradeReason::FirstDispatchConnectivity {
                                channel: motion.channel,
                            },
                        );
                    }
                    first = false;
                    continue;
                }
                Some(Ok(())) => {}
            }
            first = false;

            if wait_until(t0 + motion.end(), cancel).await {
                stop_motion(motion.channel, gateway, &self.bus, t0, report).await;
                return TierOutcome::Cancelled;
            }
            if motions[mi + 1..].iter().any(|m| m.channel == motion.channel) {
                stop_motion(motion.channel, gateway, &self.bus, t0, report).await;
            }
            complete_action(&self.bus, report, motion).await;
        }

        // Flush what the motion timeline didn't reach.
        while di < discretes.len() {
            let discrete = discretes[di];
            if wait_until(t0 + discrete.start, cancel).await {
                return TierOutcome::Cancelled;
            }
            match self.dispatch_or_cancel(discrete, gateway, t0, report, cancel).await {
                None => return TierOutcome::Cancelled,
                Some(Ok(())) => complete_action(&self.bus, report, discrete).await,
                Some(Err(err)) => {
                    if first && err.is_connectivity() {
                        return TierOutcome::Downgrade(DowngradeReason::FirstDispatchConnectivity {
                            channel: discrete.channel,
                        });
                    }
                }
            }
            first = false;
            di += 1;
        }
        TierOutcome::Completed
    }

    /// Individual tier: every action one at a time in plan order,
    /// best-effort timing, no concurrency.
    async fn run_individual(
        &self,
        actions: &[Action],
        plan_channels: &[Channel],
        gateway: &GatewayRef,
        t0: Instant,
        report: &SharedReport,
        cancel: &CancellationToken,
    ) -> TierOutcome {
        let mut ordered: Vec<&Action> = actions.iter().collect();
        ordered.sort_by_key(|a| (a.start, a.channel, a.id));

        // First-dispatch connectivity per channel; the run is only fatal
        // when every channel of the plan loses connectivity.
        let mut first_results: HashMap<Channel, bool> = HashMap::new();

        for (i, action) in ordered.iter().enumerate() {
            if wait_until(t0 + action.start, cancel).await {
                return TierOutcome::Cancelled;
            }
            let result = match self.dispatch_or_cancel(action, gateway, t0, report, cancel).await {
                None => {
                    if action.channel.is_motion() {
                        stop_motion(action.channel, gateway, &self.bus, t0, report).await;
                    }
                    return TierOutcome::Cancelled;
                }
                Some(r) => r,
            };

            if !first_results.contains_key(&action.channel) {
                let lost = matches!(&result, Err(err) if err.is_connectivity());
                first_results.insert(action.channel, lost);
                if first_results.len() == plan_channels.len()
                    && first_results.values().all(|lost| *lost)
                {
                    return TierOutcome::Abort(DowngradeReason::AllChannelsUnreachable);
                }
            }

            if result.is_err() {
                continue;
            }

            if action.channel.is_motion() {
                if wait_until(t0 + action.end(), cancel).await {
                    stop_motion(action.channel, gateway, &self.bus, t0, report).await;
                    return TierOutcome::Cancelled;
                }
                if ordered[i + 1..].iter().any(|b| b.channel == action.channel) {
                    stop_motion(action.channel, gateway, &self.bus, t0, report).await;
                }
            }
            complete_action(&self.bus, report, action).await;
        }
        TierOutcome::Completed
    }

    /// Dispatches with cancellation; `None` means the cancel token fired
    /// mid-dispatch.
    async fn dispatch_or_cancel(
        &self,
        action: &Action,
        gateway: &GatewayRef,
        t0: Instant,
        report: &SharedReport,
        cancel: &CancellationToken,
    ) -> Option<Result<(), DeviceError>> {
        tokio::select! {
            r = dispatch_one(action, gateway, self.cfg.ack_timeout, &self.bus, t0, report) => Some(r),
            _ = cancel.cancelled() => None,
        }
    }
}

/// Suspends until `due` (immediately for past instants); true when the
/// cancel token fired instead.
async fn wait_until(due: Instant, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = time::sleep_until(due) => false,
        _ = cancel.cancelled() => true,
    }
}
