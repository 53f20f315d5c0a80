//! Capacity toggle boundary
//!
//! Scheduled jobs scale services down at night and back up in the morning.
//! Those scale actions produce the deployment events the notifier consumes;
//! the notifier itself never calls this module.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::CapacityError;

/// Stabilization polling as the scheduler uses it: 15s apart, 40 attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 40;

/// Observed task counts of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceState {
    pub desired: u32,
    pub running: u32,
}

impl ServiceState {
    pub fn is_stable(&self) -> bool {
        self.running == self.desired
    }
}

/// Sets service capacity on some orchestrator
#[async_trait]
pub trait CapacityToggle: Send + Sync {
    async fn set_desired_count(&self, service: &str, count: u32) -> Result<ServiceState, CapacityError>;

    async fn describe(&self, service: &str) -> Result<ServiceState, CapacityError>;
}

/// Poll until the running count matches the desired count
pub async fn await_stable<T: CapacityToggle + ?Sized>(
    toggle: &T,
    service: &str,
    poll_interval: Duration,
    max_attempts: u32,
) -> Result<ServiceState, CapacityError> {
    let mut last = None;
    for attempt in 1..=max_attempts {
        let state = toggle.describe(service).await?;
        if state.is_stable() {
            debug!(service, attempt, "Service is stable");
            return Ok(state);
        }
        debug!(service, attempt, running = state.running, desired = state.desired, "Waiting for service");
        last = Some(state);
        if attempt < max_attempts {
            tokio::time::sleep(poll_interval).await;
        }
    }

    let state = last.unwrap_or(ServiceState { desired: 0, running: 0 });
    Err(CapacityError::NotStable {
        service: service.to_string(),
        attempts: max_attempts,
        running: state.running,
        desired: state.desired,
    })
}

/// Per-service result of a scale action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleResult {
    Success { service: String, new_count: u32 },
    Failed { service: String, error: String },
}

impl ScaleResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ScaleResult::Success { .. })
    }
}

/// Optional stabilization wait after scaling
#[derive(Debug, Clone, Copy)]
pub struct StabilityWait {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for StabilityWait {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Scale each service in turn. A failure on one service does not stop the
/// others.
pub async fn scale_services<T: CapacityToggle + ?Sized>(
    toggle: &T,
    targets: &[(String, u32)],
    wait: Option<StabilityWait>,
) -> Vec<ScaleResult> {
    let mut results = Vec::with_capacity(targets.len());
    for (service, count) in targets {
        let outcome = async {
            toggle.set_desired_count(service, *count).await?;
            if let Some(wait) = wait {
                await_stable(toggle, service, wait.poll_interval, wait.max_attempts).await?;
            }
            Ok::<_, CapacityError>(())
        }
        .await;

        match outcome {
            Ok(()) => {
                info!(service = %service, count, "Service scaled");
                results.push(ScaleResult::Success {
                    service: service.clone(),
                    new_count: *count,
                });
            }
            Err(e) => {
                warn!(service = %service, error = %e, "Failed to scale service");
                results.push(ScaleResult::Failed {
                    service: service.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    results
}
