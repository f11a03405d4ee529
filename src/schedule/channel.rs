//! # ChannelActor: one channel's execution loop.
//!
//! Runs a single channel's start-ordered timeline against the gateway in
//! synchronized mode. One actor per channel, all sharing the run's
//! monotonic start reference `t0` and a tier-wide cancellation token.
//!
//! ## Loop
//! ```text
//! for each action on the channel (start order):
//!   ├─► wait until t0 + action.start          (cancellable)
//!   ├─► dispatch to the gateway               (cancellable)
//!   │     ├─ Err on the channel's FIRST dispatch, connectivity
//!   │     │    → trip the tier's ConnectivityProbe, exit loop
//!   │     └─ Err otherwise → recorded, continue with next action
//!   ├─► discrete action: completed on ack
//!   └─► motion: wait until t0 + action.end    (cancellable)
//!         ├─ later action exists on channel → stop the motion
//!         └─ mark completed
//! ```
//!
//! ## Rules
//! - Actions execute strictly in `start` order, never concurrently with
//!   themselves; cross-channel ordering is only the shared `t0`.
//! - A failure on this channel never blocks or aborts sibling channels.
//! - Cancellation is checked at every suspension point (start wait, ack
//!   wait, duration wait); an active motion is stopped on the way out.
//! - On tier-token cancellation the actor exits **without** marking its
//!   remaining actions: the cascade decides whether they are cancelled
//!   (external cancel) or re-driven by a lower tier (downgrade).

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::events::Bus;
use crate::gateway::GatewayRef;
use crate::plan::{Action, Channel};
use crate::schedule::dispatch::{complete_action, dispatch_one, stop_motion};
use crate::schedule::scheduler::SharedReport;
use crate::schedule::ConnectivityProbe;

/// Executes one channel's timeline in synchronized mode.
pub(crate) struct ChannelActor {
    /// Channel this actor owns.
    pub(crate) channel: Channel,
    /// The channel's actions, start-ordered.
    pub(crate) actions: Vec<Action>,
    /// Shared gateway handle.
    pub(crate) gateway: GatewayRef,
    /// Event bus for lifecycle events.
    pub(crate) bus: Bus,
    /// Shared report accumulator.
    pub(crate) report: SharedReport,
    /// Acknowledgement deadline for discrete commands.
    pub(crate) ack_timeout: Duration,
    /// Tier-wide first-dispatch connectivity trip wire.
    pub(crate) probe: Arc<ConnectivityProbe>,
}

impl ChannelActor {
    /// Runs the loop until the timeline drains or the tier token cancels.
    pub(crate) async fn run(self, t0: Instant, token: CancellationToken) {
        let count = self.actions.len();

        for (i, action) in self.actions.iter().enumerate() {
            // Suspension point: wait for the action's start offset.
            tokio::select! {
                _ = time::sleep_until(t0 + action.start) => {}
                _ = token.cancelled() => return,
            }

            // Suspension point: the dispatch itself (ack wait for discrete
            // commands). Cancellation mid-dispatch stops an already-started
            // motion on the way out.
            let result = tokio::select! {
                r = dispatch_one(action, &self.gateway, self.ack_timeout, &self.bus, t0, &self.report) => r,
                _ = token.cancelled() => {
                    stop_motion(self.channel, &self.gateway, &self.bus, t0, &self.report).await;
                    return;
                }
            };

            match result {
                Ok(()) => {}
                Err(err) => {
                    if i == 0 && err.is_connectivity() {
                        self.probe.trip(self.channel);
                        return;
                    }
                    // Per-action failure: recorded by dispatch, channel
                    // continues.
                    continue;
                }
            }

            if action.channel.is_discrete() {
                complete_action(&self.bus, &self.report, action).await;
                continue;
            }

            // Suspension point: let the motion play out its duration.
            tokio::select! {
                _ = time::sleep_until(t0 + action.end()) => {}
                _ = token.cancelled() => {
                    stop_motion(self.channel, &self.gateway, &self.bus, t0, &self.report).await;
                    return;
                }
            }

            // The body is exclusive per channel: free it before the next
            // command.
            if i + 1 < count {
                stop_motion(self.channel, &self.gateway, &self.bus, t0, &self.report).await;
            }
            complete_action(&self.bus, &self.report, action).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Mutex;
    use tokio::task::JoinSet;

    use super::*;
    use crate::gateway::stub::{StubCall, StubGateway};
    use crate::plan::{ActionId, ChoreographyPlan};
    use crate::report::{ActionState, ReportBuilder, RunStatus};

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn dance(id: u32, start: f64, dur: f64) -> Action {
        Action::new(ActionId(id), Channel::Dance, format!("d{id}"), secs(start), secs(dur))
    }

    fn actor(
        actions: Vec<Action>,
        gateway: Arc<StubGateway>,
        report: SharedReport,
        probe: Arc<ConnectivityProbe>,
    ) -> ChannelActor {
        ChannelActor {
            channel: Channel::Dance,
            actions,
            gateway,
            bus: Bus::new(64),
            report,
            ack_timeout: secs(2.0),
            probe,
        }
    }

    fn shared_report(actions: &[Action]) -> SharedReport {
        let plan = ChoreographyPlan::new(secs(60.0), actions.to_vec());
        Arc::new(Mutex::new(ReportBuilder::new(&plan)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_motions_stop_between_commands() {
        let actions = vec![dance(0, 0.0, 2.0), dance(1, 2.0, 2.0)];
        let gw = Arc::new(StubGateway::always_ack());
        let report = shared_report(&actions);
        let token = CancellationToken::new();
        let probe = Arc::new(ConnectivityProbe::new(token.clone()));

        actor(actions, gw.clone(), report.clone(), probe)
            .run(Instant::now(), token)
            .await;

        // start d0, stop (later action exists), start d1, no trailing stop
        assert_eq!(
            gw.calls(),
            vec![
                StubCall::StartDance("d0".into()),
                StubCall::StopDance,
                StubCall::StartDance("d1".into()),
            ]
        );
        let rep = report.lock().await.build(RunStatus::Completed);
        assert_eq!(rep.success_rate, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_dispatch_connectivity_trips_probe() {
        let actions = vec![dance(0, 0.0, 2.0), dance(1, 2.0, 2.0)];
        let gw = Arc::new(StubGateway::always_ack().dance_unreachable());
        let report = shared_report(&actions);
        let token = CancellationToken::new();
        let probe = Arc::new(ConnectivityProbe::new(token.clone()));

        actor(actions, gw.clone(), report.clone(), probe.clone())
            .run(Instant::now(), token.clone())
            .await;

        assert!(probe.tripped().is_some());
        assert!(token.is_cancelled(), "probe cancels the tier token");
        // Only the first dispatch happened; the loop exited for the cascade.
        assert_eq!(gw.count(|c| matches!(c, StubCall::StartDance(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_motion_stops_it_and_exits() {
        let actions = vec![dance(0, 0.0, 10.0), dance(1, 10.0, 2.0)];
        let gw = Arc::new(StubGateway::always_ack());
        let report = shared_report(&actions);
        let token = CancellationToken::new();
        let probe = Arc::new(ConnectivityProbe::new(token.clone()));

        let mut set = JoinSet::new();
        set.spawn(actor(actions, gw.clone(), report.clone(), probe).run(Instant::now(), token.clone()));

        time::sleep(secs(3.0)).await;
        token.cancel();
        while set.join_next().await.is_some() {}

        assert_eq!(gw.count(|c| matches!(c, StubCall::StartDance(_))), 1);
        assert_eq!(gw.count(|c| matches!(c, StubCall::StopDance)), 1);

        let rep = {
            let mut guard = report.lock().await;
            guard.cancel_remaining();
            guard.build(RunStatus::Cancelled)
        };
        assert_eq!(rep.outcome(ActionId(0)).unwrap().state, ActionState::Cancelled);
        assert_eq!(rep.outcome(ActionId(1)).unwrap().state, ActionState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_is_isolated_and_never_trips_probe() {
        let actions = vec![dance(0, 0.0, 1.0), dance(1, 1.0, 1.0)];
        let gw = Arc::new(StubGateway::always_ack().dance_rejected());
        let report = shared_report(&actions);
        let token = CancellationToken::new();
        let probe = Arc::new(ConnectivityProbe::new(token.clone()));

        actor(actions, gw.clone(), report.clone(), probe.clone())
            .run(Instant::now(), token.clone())
            .await;

        assert!(probe.tripped().is_none(), "rejection is not a connectivity loss");
        assert!(!token.is_cancelled());
        // The channel kept going: both actions were attempted.
        assert_eq!(gw.count(|c| matches!(c, StubCall::StartDance(_))), 2);

        let rep = report.lock().await.build(RunStatus::Completed);
        assert_eq!(rep.success_rate, 0.0);
        assert_eq!(rep.outcome(ActionId(0)).unwrap().state, ActionState::Failed);
        assert_eq!(rep.outcome(ActionId(1)).unwrap().state, ActionState::Failed);
    }
}
