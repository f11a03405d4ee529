//! # Exclusive-access gateway adapter.
//!
//! Some transports tolerate concurrent sends on independent command types;
//! others require exclusive access per physical command. That policy
//! belongs to the gateway adapter, not to the scheduler's channel loops:
//! wrap the inner gateway in [`SerialGateway`] and every send goes through
//! one critical section, while the channel loops stay oblivious.
//!
//! ## Rules
//! - One in-flight physical command at a time; concurrent callers queue on
//!   the internal async mutex in arrival order.
//! - The capability flag passes through unchanged — serialized sends and
//!   synchronized multi-channel scheduling are orthogonal.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::DeviceError;
use crate::gateway::{ActuatorGateway, Capability};
use crate::plan::{LightColor, LightMode};

/// Serializes every physical send of the wrapped gateway through a single
/// critical section.
pub struct SerialGateway<G> {
    inner: G,
    lock: Mutex<()>,
}

impl<G: ActuatorGateway> SerialGateway<G> {
    /// Wraps `inner` so its commands never run concurrently.
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    /// Consumes the adapter, returning the inner gateway.
    pub fn into_inner(self) -> G {
        self.inner
    }
}

#[async_trait]
impl<G: ActuatorGateway> ActuatorGateway for SerialGateway<G> {
    async fn start_dance(&self, name: &str) -> Result<(), DeviceError> {
        let _guard = self.lock.lock().await;
        self.inner.start_dance(name).await
    }

    async fn stop_dance(&self) -> Result<(), DeviceError> {
        let _guard = self.lock.lock().await;
        self.inner.stop_dance().await
    }

    async fn start_action(&self, name: &str) -> Result<(), DeviceError> {
        let _guard = self.lock.lock().await;
        self.inner.start_action(name).await
    }

    async fn stop_action(&self) -> Result<(), DeviceError> {
        let _guard = self.lock.lock().await;
        self.inner.stop_action().await
    }

    async fn show_expression(&self, name: &str) -> Result<(), DeviceError> {
        let _guard = self.lock.lock().await;
        self.inner.show_expression(name).await
    }

    async fn set_light(
        &self,
        color: LightColor,
        mode: LightMode,
        duration: Duration,
        breath_period: Duration,
    ) -> Result<(), DeviceError> {
        let _guard = self.lock.lock().await;
        self.inner
            .set_light(color, mode, duration, breath_period)
            .await
    }

    fn supports(&self, capability: Capability) -> bool {
        self.inner.supports(capability)
    }
}
