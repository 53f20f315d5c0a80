//! Load balancer target health notifications

use super::{Synthesizer, MONITOR_FOOTER, NOT_AVAILABLE};
use crate::envelope::{non_empty, Envelope, EventDetail, TargetHealthDetail};
use crate::notification::message::{MessageField, NotificationMessage};
use crate::notification::status::{Color, StatusTable};

/// Health state reported for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Unhealthy,
    /// initial, draining, unused, unavailable, ...
    Other,
}

impl HealthState {
    pub fn from_state(state: &str) -> Self {
        match state.trim().to_ascii_lowercase().as_str() {
            "healthy" => HealthState::Healthy,
            "unhealthy" => HealthState::Unhealthy,
            _ => HealthState::Other,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            HealthState::Healthy => Color::Positive,
            HealthState::Unhealthy => Color::Negative,
            HealthState::Other => Color::Caution,
        }
    }

    fn glyph(&self) -> &'static str {
        match self {
            HealthState::Healthy => "💚",
            HealthState::Unhealthy => "💔",
            HealthState::Other => "💛",
        }
    }
}

/// Synthesizer for target health changes
#[derive(Debug, Clone, Default)]
pub struct TargetHealthSynthesizer;

impl TargetHealthSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl Synthesizer for TargetHealthSynthesizer {
    fn synthesize(&self, envelope: &Envelope, _statuses: &StatusTable) -> NotificationMessage {
        let fallback = TargetHealthDetail::default();
        let detail = match envelope.detail() {
            EventDetail::TargetHealth(detail) => detail,
            _ => &fallback,
        };

        let state = non_empty(&detail.target_health.state).unwrap_or("unknown");
        let health = HealthState::from_state(state);

        let target_group = envelope.target_group().unwrap_or(NOT_AVAILABLE);

        let target_id = non_empty(&detail.target.id).unwrap_or(NOT_AVAILABLE);
        let target_port = non_empty(&detail.target.port).unwrap_or(NOT_AVAILABLE);

        let title = format!("{} Target Health: {}", health.glyph(), state.to_uppercase());

        NotificationMessage::new(
            title,
            health.color(),
            MessageField::labeled("Target Group", target_group, false),
        )
        .with_field(MessageField::labeled("Target", format!("{target_id}:{target_port}"), true))
        .with_field(MessageField::labeled("State", state, true))
        .with_optional_field(
            non_empty(&detail.target_health.reason).map(|r| MessageField::labeled("Reason", r, true)),
        )
        .with_optional_field(
            non_empty(&detail.target_health.description)
                .map(|d| MessageField::labeled("Description", d, false)),
        )
        .with_footer(MONITOR_FOOTER)
        .with_timestamp(envelope.occurred_at().epoch_seconds())
    }
}
