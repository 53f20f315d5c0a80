//! Service action notifications

use super::{resolve_service_name, Synthesizer, MONITOR_FOOTER};
use crate::envelope::{non_empty, Envelope, EventDetail, ServiceActionDetail};
use crate::notification::message::{MessageField, NotificationMessage};
use crate::notification::status::StatusTable;

/// Deployments listed per message
const MAX_DEPLOYMENTS: usize = 2;

/// Synthesizer for service actions (steady state, deployment start, ...)
#[derive(Debug, Clone, Default)]
pub struct ServiceActionSynthesizer;

impl ServiceActionSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl Synthesizer for ServiceActionSynthesizer {
    fn synthesize(&self, envelope: &Envelope, statuses: &StatusTable) -> NotificationMessage {
        let fallback = ServiceActionDetail::default();
        let detail = match envelope.detail() {
            EventDetail::ServiceAction(detail) => detail,
            _ => &fallback,
        };

        let event_type = non_empty(&detail.event_type).unwrap_or("UNKNOWN");
        let event_name = non_empty(&detail.event_name).unwrap_or("UNKNOWN");
        let service_name = resolve_service_name(None, envelope);

        let glyph = if event_name.contains("DEPLOYMENT") { "📦" } else { "🔄" };
        let title = format!("{glyph} ECS Service Update: {service_name}");

        let mut message = NotificationMessage::new(
            title,
            statuses.color_for(event_type),
            MessageField::labeled("Event", event_name, true),
        )
        .with_field(MessageField::labeled("Service", service_name.as_str(), true));

        for (idx, deployment) in detail.deployments.iter().take(MAX_DEPLOYMENTS).enumerate() {
            message = message.with_field(MessageField::labeled(
                format!("Deployment {}", idx + 1),
                format!(
                    "Status: {}\nDesired: {} | Running: {} | Pending: {}",
                    non_empty(&deployment.status).unwrap_or("unknown"),
                    deployment.desired_count,
                    deployment.running_count,
                    deployment.pending_count
                ),
                false,
            ));
        }

        message
            .with_footer(MONITOR_FOOTER)
            .with_timestamp(envelope.occurred_at().epoch_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::status::Color;
    use serde_json::json;

    fn synthesize(detail: serde_json::Value) -> NotificationMessage {
        let envelope = Envelope::from_value(json!({
            "source": "aws.ecs",
            "detail-type": "ECS Service Action",
            "time": "2024-01-01T00:00:00Z",
            "resources": ["arn:aws:ecs:ap-northeast-2:1:service/chatapp/chatapp-green"],
            "detail": detail
        }))
        .unwrap();
        ServiceActionSynthesizer::new().synthesize(&envelope, &StatusTable::standard())
    }

    #[test]
    fn test_deployment_event_lists_two_deployments() {
        let message = synthesize(json!({
            "eventType": "INFO",
            "eventName": "SERVICE_DEPLOYMENT_IN_PROGRESS",
            "deployments": [
                { "id": "ecs-svc/1", "status": "PRIMARY", "desiredCount": 2, "runningCount": 1, "pendingCount": 1 },
                { "id": "ecs-svc/2", "status": "ACTIVE", "desiredCount": 2, "runningCount": 2 },
                { "id": "ecs-svc/3", "status": "INACTIVE" }
            ]
        }));

        assert_eq!(message.title(), "📦 ECS Service Update: chatapp-green");
        assert_eq!(message.color(), Color::Neutral);
        assert_eq!(message.fields().len(), 4);
        assert_eq!(
            message.fields()[2].value,
            "Status: PRIMARY\nDesired: 2 | Running: 1 | Pending: 1"
        );
        assert_eq!(message.fields()[3].title.as_deref(), Some("Deployment 2"));
    }

    #[test]
    fn test_steady_state() {
        let message = synthesize(json!({
            "eventType": "ACTIVE",
            "eventName": "SERVICE_STEADY_STATE"
        }));
        assert_eq!(message.title(), "🔄 ECS Service Update: chatapp-green");
        assert_eq!(message.color(), Color::Positive);
        assert_eq!(message.fields().len(), 2);
    }
}
