//! # Hand a single action to the gateway.
//!
//! Dispatches one action's command, publishes lifecycle events, and updates
//! the shared report accumulator.
//!
//! - **Motion starts** (dance, basic-action) are fire-and-forget: the call's
//!   ack confirms receipt, and the scheduler tracks the motion's duration
//!   itself.
//! - **Discrete commands** (expression, light) await an acknowledgement up
//!   to the configured deadline; exceeding it is a per-action failure,
//!   identical to any other dispatch failure.
//!
//! ## Event flow
//! ```text
//! Success:
//!   mark dispatched → gateway call → Ok → mark acknowledged
//!
//! Failure:
//!   mark dispatched → gateway call → Err → mark failed → ActionFailed
//!
//! Ack timeout:
//!   deadline exceeded → AckTimeoutHit → mark failed → ActionFailed
//! ```
//!
//! ## Rules
//! - Publishes `ActionDispatched` exactly once per attempt.
//! - `AckTimeoutHit` is published **in addition to** `ActionFailed`.
//! - The report lock is never held across a gateway await.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::debug;

use crate::error::DeviceError;
use crate::events::{Bus, Event, EventKind};
use crate::gateway::GatewayRef;
use crate::plan::{Action, Channel, LightColor};
use crate::schedule::scheduler::SharedReport;

/// Breath period used when a light action carries none.
const DEFAULT_BREATH: Duration = Duration::from_millis(800);

/// Publishes an event to the bus and mirrors it into the report log.
pub(crate) async fn emit(bus: &Bus, report: &SharedReport, ev: Event) {
    report.lock().await.record_event(&ev);
    bus.publish(ev);
}

/// Dispatches one action, recording its outcome.
///
/// Returns the gateway result so callers can inspect connectivity failures
/// for the cascade's first-dispatch rules. On `Ok` the action is in the
/// `acknowledged` state; terminal completion is the caller's call (a
/// discrete action completes on ack, a motion when its duration elapses).
pub(crate) async fn dispatch_one(
    action: &Action,
    gateway: &GatewayRef,
    ack_timeout: Duration,
    bus: &Bus,
    t0: Instant,
    report: &SharedReport,
) -> Result<(), DeviceError> {
    let offset = t0.elapsed();
    report.lock().await.mark_dispatched(action.id, offset);
    emit(
        bus,
        report,
        Event::new(EventKind::ActionDispatched)
            .with_action(action.id)
            .with_channel(action.channel)
            .with_name(action.name.clone())
            .with_offset(offset),
    )
    .await;

    let result = match action.channel {
        Channel::Dance => gateway.start_dance(&action.name).await,
        Channel::BasicAction => gateway.start_action(&action.name).await,
        Channel::Expression => {
            with_ack_deadline(ack_timeout, gateway.show_expression(&action.name)).await
        }
        Channel::Light => {
            let color = action.params.color.unwrap_or(LightColor::Green);
            let mode = action.params.mode.unwrap_or_default();
            let breath = action.params.breath_period.unwrap_or(DEFAULT_BREATH);
            with_ack_deadline(
                ack_timeout,
                gateway.set_light(color, mode, action.duration, breath),
            )
            .await
        }
    };

    match result {
        Ok(()) => {
            report.lock().await.mark_acknowledged(action.id);
            Ok(())
        }
        Err(err) => {
            debug!(action = %action.id, channel = %action.channel, error = %err, "dispatch failed");
            if let DeviceError::AckTimeout { timeout } = &err {
                emit(
                    bus,
                    report,
                    Event::new(EventKind::AckTimeoutHit)
                        .with_action(action.id)
                        .with_timeout(*timeout),
                )
                .await;
            }
            report.lock().await.mark_failed(action.id, &err);
            emit(
                bus,
                report,
                Event::new(EventKind::ActionFailed)
                    .with_action(action.id)
                    .with_channel(action.channel)
                    .with_reason(err.to_string()),
            )
            .await;
            Err(err)
        }
    }
}

/// Marks an action completed and publishes `ActionCompleted`.
pub(crate) async fn complete_action(bus: &Bus, report: &SharedReport, action: &Action) {
    report.lock().await.mark_completed(action.id);
    emit(
        bus,
        report,
        Event::new(EventKind::ActionCompleted)
            .with_action(action.id)
            .with_channel(action.channel),
    )
    .await;
}

/// Issues the stop command for a motion channel, if it has one.
pub(crate) async fn stop_motion(
    channel: Channel,
    gateway: &GatewayRef,
    bus: &Bus,
    t0: Instant,
    report: &SharedReport,
) {
    let result = match channel {
        Channel::Dance => gateway.stop_dance().await,
        Channel::BasicAction => gateway.stop_action().await,
        Channel::Light | Channel::Expression => return,
    };
    // A failed stop is not a plan failure; the next start supersedes it.
    if result.is_ok() {
        emit(
            bus,
            report,
            Event::new(EventKind::MotionStopped)
                .with_channel(channel)
                .with_offset(t0.elapsed()),
        )
        .await;
    }
}

/// Bounds a discrete command's acknowledgement wait.
async fn with_ack_deadline<F>(deadline: Duration, fut: F) -> Result<(), DeviceError>
where
    F: Future<Output = Result<(), DeviceError>>,
{
    match time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_elapsed) => Err(DeviceError::AckTimeout { timeout: deadline }),
    }
}
