//! Event router - decides which events become notifications
//!
//! Policy, in priority order:
//! 1. Compute-orchestration deployment state changes notify only in a
//!    terminal state (COMPLETED, FAILED). Rollouts emit many intermediate
//!    events; those are dropped here so no delivery call is made for them.
//! 2. Load-balancing target health changes always notify.
//! 3. With extended routes enabled, compute-orchestration task state changes
//!    and service actions notify as well.
//! 4. Everything else is suppressed.

use serde::Serialize;
use tracing::debug;

use super::synth::deployment::DeploymentOutcome;
use super::synth::SynthesizerKind;
use crate::envelope::{EventDetail, EventKind, Envelope, SourceKind};

/// Why an event does not produce a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SuppressReason {
    /// Deployment event in a non-terminal state
    NonTerminalDeployment { status: String },
    /// Recognized event whose route is switched off
    RouteDisabled { category: String },
    /// Source and category combination not handled
    Unrecognized { source: String, category: String },
}

impl std::fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuppressReason::NonTerminalDeployment { status } => {
                write!(f, "deployment status {status} is not terminal")
            }
            SuppressReason::RouteDisabled { category } => write!(f, "route for {category:?} is disabled"),
            SuppressReason::Unrecognized { source, category } => {
                write!(f, "no route for {category:?} from {source:?}")
            }
        }
    }
}

/// Classification result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    Synthesize { synthesizer: SynthesizerKind },
    Suppressed(SuppressReason),
}

impl Route {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Route::Suppressed(_))
    }

    pub fn synthesizer(&self) -> Option<SynthesizerKind> {
        match self {
            Route::Synthesize { synthesizer } => Some(*synthesizer),
            Route::Suppressed(_) => None,
        }
    }

    fn to(synthesizer: SynthesizerKind) -> Self {
        Route::Synthesize { synthesizer }
    }
}

/// Classifies envelopes. Pure; never performs delivery.
#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    extended_routes: bool,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also route task state changes and service actions
    pub fn with_extended_routes(mut self, enabled: bool) -> Self {
        self.extended_routes = enabled;
        self
    }

    pub fn classify(&self, envelope: &Envelope) -> Route {
        let route = match (envelope.source_kind(), envelope.kind()) {
            (SourceKind::ComputeOrchestration, EventKind::DeploymentStateChange) => {
                let status = match envelope.detail() {
                    EventDetail::Deployment(detail) => detail.deployment_status.as_deref(),
                    _ => None,
                };
                let outcome = DeploymentOutcome::from_status(status);
                if outcome.is_terminal() {
                    Route::to(SynthesizerKind::DeploymentState)
                } else {
                    Route::Suppressed(SuppressReason::NonTerminalDeployment {
                        status: status.unwrap_or("UNKNOWN").to_string(),
                    })
                }
            }
            (SourceKind::LoadBalancing, EventKind::TargetHealthChange) => {
                Route::to(SynthesizerKind::TargetHealth)
            }
            (SourceKind::ComputeOrchestration, EventKind::TaskStateChange) => {
                self.extended(envelope, SynthesizerKind::TaskState)
            }
            (SourceKind::ComputeOrchestration, EventKind::ServiceAction) => {
                self.extended(envelope, SynthesizerKind::ServiceAction)
            }
            _ => Route::Suppressed(SuppressReason::Unrecognized {
                source: envelope.source().to_string(),
                category: envelope.category().to_string(),
            }),
        };

        debug!(
            source = envelope.source(),
            category = envelope.category(),
            route = ?route,
            "Classified event"
        );
        route
    }

    fn extended(&self, envelope: &Envelope, synthesizer: SynthesizerKind) -> Route {
        if self.extended_routes {
            Route::to(synthesizer)
        } else {
            Route::Suppressed(SuppressReason::RouteDisabled {
                category: envelope.category().to_string(),
            })
        }
    }
}
