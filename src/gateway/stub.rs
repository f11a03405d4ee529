//! Scripted gateway used by scheduler tests.
//!
//! Records every command it receives and fails selected command classes
//! with configured errors, so tests can drive the strategy cascade and the
//! failure-isolation paths deterministically.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DeviceError;
use crate::gateway::{ActuatorGateway, Capability};
use crate::plan::{LightColor, LightMode};

/// One recorded gateway call.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum StubCall {
    StartDance(String),
    StopDance,
    StartAction(String),
    StopAction,
    Expression(String),
    Light(LightColor, LightMode),
}

/// Scripted gateway: always acknowledges unless told otherwise.
pub(crate) struct StubGateway {
    calls: Mutex<Vec<StubCall>>,
    synchronized: bool,
    /// Error returned by every command.
    fail_all: Option<DeviceError>,
    /// Error returned by dance starts only.
    fail_dance: Option<DeviceError>,
    /// When set, expression commands never acknowledge.
    hang_expressions: bool,
}

impl StubGateway {
    pub(crate) fn always_ack() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            synchronized: true,
            fail_all: None,
            fail_dance: None,
            hang_expressions: false,
        }
    }

    pub(crate) fn without_synchronized(mut self) -> Self {
        self.synchronized = false;
        self
    }

    pub(crate) fn dance_unreachable(mut self) -> Self {
        self.fail_dance = Some(DeviceError::Unreachable);
        self
    }

    pub(crate) fn dance_rejected(mut self) -> Self {
        self.fail_dance = Some(DeviceError::Rejected {
            reason: "busy".into(),
        });
        self
    }

    pub(crate) fn all_unreachable(mut self) -> Self {
        self.fail_all = Some(DeviceError::Unreachable);
        self
    }

    pub(crate) fn hanging_expressions(mut self) -> Self {
        self.hang_expressions = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<StubCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&StubCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: StubCall) -> Result<(), DeviceError> {
        self.calls.lock().unwrap().push(call);
        match &self.fail_all {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ActuatorGateway for StubGateway {
    async fn start_dance(&self, name: &str) -> Result<(), DeviceError> {
        self.record(StubCall::StartDance(name.to_string()))?;
        match &self.fail_dance {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn stop_dance(&self) -> Result<(), DeviceError> {
        self.record(StubCall::StopDance)
    }

    async fn start_action(&self, name: &str) -> Result<(), DeviceError> {
        self.record(StubCall::StartAction(name.to_string()))
    }

    async fn stop_action(&self) -> Result<(), DeviceError> {
        self.record(StubCall::StopAction)
    }

    async fn show_expression(&self, name: &str) -> Result<(), DeviceError> {
        self.record(StubCall::Expression(name.to_string()))?;
        if self.hang_expressions {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn set_light(
        &self,
        color: LightColor,
        mode: LightMode,
        _duration: Duration,
        _breath_period: Duration,
    ) -> Result<(), DeviceError> {
        self.record(StubCall::Light(color, mode))
    }

    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::SynchronizedMultiChannel => self.synchronized,
        }
    }
}
