//! # showvisor
//!
//! **Showvisor** is a music-synchronized performance choreography engine
//! for a performer robot.
//!
//! It turns a segmented music analysis (tempo/energy/emotion per time
//! slice) into a conflict-free multi-channel action timeline, and executes
//! that timeline against a single physical actuator connection with channel
//! exclusivity, cross-channel concurrency, cascading fallback strategies,
//! and partial-failure recovery.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  MusicAnalysis ──► ChoreographyPlanner ──► ChoreographyPlan (raw)
//!                                                  │
//!                                                  ▼
//!                                          TimelineValidator
//!                                                  │ (repair or reject)
//!                                                  ▼
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ PerformanceScheduler (one run, one monotonic start reference t0)   │
//! │                                                                    │
//! │  Synchronized tier:   dance │ basic │ light │ expression           │
//! │                       one cancellable loop per channel (JoinSet)   │
//! │  Continuous fallback: motion timeline driven to completion,        │
//! │                       discrete commands queued coarsely            │
//! │  Individual fallback: every action one at a time, best effort      │
//! │                                                                    │
//! │  Bus (broadcast) ──► SubscriberSet ──► LogWriter / custom subs     │
//! └─────────────────────────────────┬──────────────────────────────────┘
//!                                   ▼
//!                          ActuatorGateway (device seam)
//!                                   │
//!                                   ▼
//!                           ExecutionReport
//! ```
//!
//! ### Run lifecycle
//! ```text
//! execute(plan, gateway, cancel)
//!
//!   ├─► capability probe (static flag, resolved at gateway construction)
//!   ├─► tier loop:
//!   │     ├─► run tier over every action not yet completed
//!   │     ├─► Completed            ─► status = completed
//!   │     ├─► external cancel      ─► stop active motion, mark the rest
//!   │     │                           cancelled, status = cancelled
//!   │     ├─► first-dispatch connectivity error
//!   │     │       ├─ lower tier exists ─► downgrade (one-way), continue
//!   │     │       └─ lowest tier       ─► status = aborted
//!   │     └─► every plan channel unreachable ─► status = aborted
//!   │
//!   └─► ReportBuilder ─► ExecutionReport (always returned, never thrown)
//! ```
//!
//! ## Features
//! | Area            | Description                                                       | Key types                                    |
//! |-----------------|-------------------------------------------------------------------|----------------------------------------------|
//! | **Planning**    | Fit dances, expressions, lights, and gap fill to music segments.  | [`ChoreographyPlanner`], [`MotionLibrary`]   |
//! | **Validation**  | Per-channel invariants with overlap repair.                       | [`TimelineValidator`], [`PlanError`]         |
//! | **Execution**   | Concurrent channel loops, fallback cascade, failure isolation.    | [`PerformanceScheduler`], [`ExecutionStrategy`] |
//! | **Device seam** | Capability contract + exclusive-access adapter.                   | [`ActuatorGateway`], [`SerialGateway`]       |
//! | **Reporting**   | Per-action outcomes, success rates, chronological log.            | [`ExecutionReport`], [`RunStatus`]           |
//! | **Observability** | Seq-ordered runtime events fanned out to subscribers.           | [`Event`], [`Bus`], [`Subscribe`]            |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use showvisor::{
//!     ActionParams, ActionRequest, ActuatorGateway, Capability, Channel, Config,
//!     DeviceError, LightColor, LightMode, PerformanceScheduler, PlanRequest,
//!     TimelineValidator,
//! };
//!
//! struct AlwaysAck;
//!
//! #[async_trait]
//! impl ActuatorGateway for AlwaysAck {
//!     async fn start_dance(&self, _name: &str) -> Result<(), DeviceError> { Ok(()) }
//!     async fn stop_dance(&self) -> Result<(), DeviceError> { Ok(()) }
//!     async fn start_action(&self, _name: &str) -> Result<(), DeviceError> { Ok(()) }
//!     async fn stop_action(&self) -> Result<(), DeviceError> { Ok(()) }
//!     async fn show_expression(&self, _name: &str) -> Result<(), DeviceError> { Ok(()) }
//!     async fn set_light(
//!         &self,
//!         _color: LightColor,
//!         _mode: LightMode,
//!         _duration: Duration,
//!         _breath_period: Duration,
//!     ) -> Result<(), DeviceError> { Ok(()) }
//!     fn supports(&self, _capability: Capability) -> bool { true }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // A caller-submitted plan: one dance plus a breath light.
//!     let request = PlanRequest {
//!         total_duration: Duration::from_millis(300),
//!         actions: vec![
//!             ActionRequest {
//!                 channel: Channel::Dance,
//!                 name: "spin_groove".into(),
//!                 start_time: Duration::from_millis(50),
//!                 duration: Duration::from_millis(200),
//!                 interruptible: None,
//!                 params: ActionParams::default(),
//!             },
//!             ActionRequest {
//!                 channel: Channel::Light,
//!                 name: "green_breath".into(),
//!                 start_time: Duration::ZERO,
//!                 duration: Duration::from_millis(300),
//!                 interruptible: None,
//!                 params: ActionParams::light(LightColor::Green, LightMode::Breath, None),
//!             },
//!         ],
//!     };
//!
//!     let plan = TimelineValidator::new().validate(request.into_plan())?;
//!
//!     let scheduler = PerformanceScheduler::new(Config::default(), Vec::new());
//!     let report = scheduler
//!         .execute(&plan, Arc::new(AlwaysAck), CancellationToken::new())
//!         .await;
//!
//!     assert_eq!(report.success_rate, 100.0);
//!     Ok(())
//! }
//! ```

mod analysis;
mod config;
mod error;
mod events;
mod gateway;
mod plan;
mod planner;
mod report;
mod schedule;
mod subscribers;

// ---- Public re-exports ----

pub use analysis::{MusicAnalysis, Segment};
pub use config::{Config, PlannerConfig};
pub use error::{DeviceError, PlanError};
pub use events::{Bus, Event, EventKind};
pub use gateway::{ActuatorGateway, Capability, GatewayRef, SerialGateway};
pub use plan::{
    Action, ActionId, ActionParams, ActionRequest, Channel, ChoreographyPlan, LightColor,
    LightMode, PlanRequest, TimelineValidator,
};
pub use planner::{ChoreographyPlanner, EmotionPalette, ExpressionDef, MotionDef, MotionLibrary};
pub use report::{
    ActionOutcome, ActionState, Downgrade, ExecutionReport, FeaturesUsed, LogLine, RunStatus,
};
pub use schedule::{DowngradeReason, ExecutionStrategy, PerformanceScheduler};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
