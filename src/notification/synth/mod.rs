//! Message synthesizers - turn an envelope into a notification
//!
//! Each recognized event kind has its own synthesizer. They are pure: the
//! output depends only on the envelope and the status table, and any field
//! that cannot be resolved renders as `N/A` or is left out.

pub mod deployment;
pub mod service_action;
pub mod target_health;
pub mod task_state;

pub use deployment::DeploymentStateSynthesizer;
pub use service_action::ServiceActionSynthesizer;
pub use target_health::TargetHealthSynthesizer;
pub use task_state::TaskStateSynthesizer;

use serde::Serialize;

use super::message::NotificationMessage;
use super::status::StatusTable;
use crate::envelope::Envelope;

/// Placeholder for values that could not be resolved
pub const NOT_AVAILABLE: &str = "N/A";

/// Footer shared by the infrastructure monitors
pub const MONITOR_FOOTER: &str = "ECS Deployment Monitor";

/// Turns one kind of envelope into a notification
pub trait Synthesizer {
    fn synthesize(&self, envelope: &Envelope, statuses: &StatusTable) -> NotificationMessage;
}

/// Which synthesizer handles an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesizerKind {
    DeploymentState,
    TargetHealth,
    TaskState,
    ServiceAction,
}

impl SynthesizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesizerKind::DeploymentState => "deployment_state",
            SynthesizerKind::TargetHealth => "target_health",
            SynthesizerKind::TaskState => "task_state",
            SynthesizerKind::ServiceAction => "service_action",
        }
    }
}

impl std::fmt::Display for SynthesizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The configured set of synthesizers
#[derive(Debug, Clone, Default)]
pub struct Synthesizers {
    pub deployment: DeploymentStateSynthesizer,
    pub target_health: TargetHealthSynthesizer,
    pub task_state: TaskStateSynthesizer,
    pub service_action: ServiceActionSynthesizer,
}

impl Synthesizers {
    pub fn with_deployment(mut self, deployment: DeploymentStateSynthesizer) -> Self {
        self.deployment = deployment;
        self
    }

    pub fn synthesize(
        &self,
        kind: SynthesizerKind,
        envelope: &Envelope,
        statuses: &StatusTable,
    ) -> NotificationMessage {
        match kind {
            SynthesizerKind::DeploymentState => self.deployment.synthesize(envelope, statuses),
            SynthesizerKind::TargetHealth => self.target_health.synthesize(envelope, statuses),
            SynthesizerKind::TaskState => self.task_state.synthesize(envelope, statuses),
            SynthesizerKind::ServiceAction => self.service_action.synthesize(envelope, statuses),
        }
    }
}

/// Service name: explicit detail field, then the last path segment of the
/// first resource, then `N/A`.
pub fn resolve_service_name(explicit: Option<&str>, envelope: &Envelope) -> String {
    envelope
        .name_or_resource_tail(explicit)
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// Text after the last `separator`, or the whole value when absent
pub(crate) fn last_segment(value: &str, separator: char) -> &str {
    value.rsplit(separator).next().unwrap_or(value)
}
