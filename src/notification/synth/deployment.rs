//! Deployment state change notifications (Korean)
//!
//! Blue/green rollouts report `deploymentStatus` per service. The message
//! shows the environment, local deployment time, task counts and a closing
//! sentence for terminal states.

use chrono::{FixedOffset, Offset, Utc};

use super::{last_segment, resolve_service_name, Synthesizer, NOT_AVAILABLE};
use crate::envelope::{DeploymentDetail, Envelope, EventDetail};
use crate::notification::message::{MessageField, NotificationMessage};
use crate::notification::status::{Color, StatusTable};

/// Message text
pub mod msg {
    pub const COMPLETED: &str = "배포 완료 ✅";
    pub const FAILED: &str = "배포 실패 ❌";
    pub const IN_PROGRESS: &str = "배포 진행중";
    pub const ENVIRONMENT: &str = "환경";

    pub const SERVICE: &str = "서비스";
    pub const TASK_DEFINITION: &str = "Task 정의";
    pub const RUNNING: &str = "실행중";
    pub const PENDING: &str = "대기중";
    pub const FAILED_TASKS: &str = "실패";
    pub const ROLLOUT_STATE: &str = "Rollout 상태";
    pub const UNIT: &str = "개";

    pub const SUCCESS_SENTENCE: &str = "✨ 모든 태스크가 정상적으로 실행되었습니다.";
    pub const FAILURE_SENTENCE: &str = "⚠️ 배포가 실패했습니다. 로그를 확인해주세요.";

    pub const FOOTER: &str = "🚀 배포 알림";

    /// `2024년 01월 01일 09:00`
    pub const TIME_FORMAT: &str = "%Y년 %m월 %d일 %H:%M";
}

/// Default display offset: KST
pub const DEFAULT_OFFSET_HOURS: i32 = 9;

/// Deployment status as far as notifications are concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    Completed,
    Failed,
    InProgress,
    /// Any other label, kept verbatim for the title
    Other(String),
}

impl DeploymentOutcome {
    /// Status labels match exactly; a missing or empty status is `UNKNOWN`.
    pub fn from_status(status: Option<&str>) -> Self {
        let status = status.filter(|s| !s.is_empty()).unwrap_or("UNKNOWN");
        match status {
            "COMPLETED" => DeploymentOutcome::Completed,
            "FAILED" => DeploymentOutcome::Failed,
            "IN_PROGRESS" => DeploymentOutcome::InProgress,
            _ => DeploymentOutcome::Other(status.to_string()),
        }
    }

    /// Only terminal states are worth a notification
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentOutcome::Completed | DeploymentOutcome::Failed)
    }

    fn glyph(&self) -> &'static str {
        match self {
            DeploymentOutcome::Completed => "🎉",
            DeploymentOutcome::Failed => "🚨",
            DeploymentOutcome::InProgress => "⏳",
            DeploymentOutcome::Other(_) => "📦",
        }
    }

    fn label(&self) -> &str {
        match self {
            DeploymentOutcome::Completed => msg::COMPLETED,
            DeploymentOutcome::Failed => msg::FAILED,
            DeploymentOutcome::InProgress => msg::IN_PROGRESS,
            DeploymentOutcome::Other(status) => status,
        }
    }

    fn color(&self, statuses: &StatusTable) -> Color {
        match self {
            DeploymentOutcome::Completed => statuses.color_for("COMPLETED"),
            DeploymentOutcome::Failed => statuses.color_for("FAILED"),
            DeploymentOutcome::InProgress => Color::Caution,
            DeploymentOutcome::Other(_) => Color::Neutral,
        }
    }
}

/// Blue/green side of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Blue,
    Green,
    Unknown,
}

impl Environment {
    /// Case-insensitive substring match; "blue" wins over "green".
    pub fn from_service_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("blue") {
            Environment::Blue
        } else if name.contains("green") {
            Environment::Green
        } else {
            Environment::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Blue => "Blue",
            Environment::Green => "Green",
            Environment::Unknown => "Unknown",
        }
    }

    fn glyph(&self) -> &'static str {
        match self {
            Environment::Blue => "🔵",
            Environment::Green => "🟢",
            Environment::Unknown => "📦",
        }
    }
}

/// Synthesizer for deployment state changes
#[derive(Debug, Clone)]
pub struct DeploymentStateSynthesizer {
    display_offset: FixedOffset,
}

impl DeploymentStateSynthesizer {
    pub fn new() -> Self {
        Self::with_offset_hours(DEFAULT_OFFSET_HOURS)
    }

    /// Offsets outside ±23h fall back to the default
    pub fn with_offset_hours(hours: i32) -> Self {
        let display_offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(default_offset);
        Self { display_offset }
    }

    /// Local display time, or the raw event time when it did not parse
    fn display_time(&self, envelope: &Envelope) -> String {
        match envelope.occurred_at().instant() {
            Some(instant) => instant
                .with_timezone(&self.display_offset)
                .format(msg::TIME_FORMAT)
                .to_string(),
            None => envelope.occurred_at().raw(),
        }
    }
}

impl Default for DeploymentStateSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

impl Synthesizer for DeploymentStateSynthesizer {
    fn synthesize(&self, envelope: &Envelope, statuses: &StatusTable) -> NotificationMessage {
        let fallback = DeploymentDetail::default();
        let detail = match envelope.detail() {
            EventDetail::Deployment(detail) => detail,
            _ => &fallback,
        };
        let deployment = &detail.deployment;

        let service_name = resolve_service_name(detail.service_name.as_deref(), envelope);
        let environment = Environment::from_service_name(&service_name);
        let outcome = DeploymentOutcome::from_status(detail.deployment_status.as_deref());

        let title = format!(
            "{} {} {} {} - {}",
            outcome.glyph(),
            environment.glyph(),
            environment.as_str(),
            msg::ENVIRONMENT,
            outcome.label()
        );

        let revision = deployment
            .task_definition
            .as_deref()
            .filter(|td| td.contains(':'))
            .map(|td| last_segment(td, ':'))
            .unwrap_or(NOT_AVAILABLE);

        let mut lines = vec![
            format!("🕒 {}", self.display_time(envelope)),
            format!("🎯 {}: `{}`", msg::SERVICE, service_name),
            format!("📦 {}: `revision {}`", msg::TASK_DEFINITION, revision),
            format!(
                "🔢 {}: *{}/{}{}*",
                msg::RUNNING,
                deployment.running_count,
                deployment.desired_count,
                msg::UNIT
            ),
        ];
        if deployment.pending_count > 0 {
            lines.push(format!("⏳ {}: {}{}", msg::PENDING, deployment.pending_count, msg::UNIT));
        }
        if deployment.failed_tasks > 0 {
            lines.push(format!("❌ {}: *{}{}*", msg::FAILED_TASKS, deployment.failed_tasks, msg::UNIT));
        }
        if let Some(rollout) = crate::envelope::non_empty(&deployment.rollout_state) {
            lines.push(format!("📊 {}: {}", msg::ROLLOUT_STATE, rollout));
        }

        let closing = match outcome {
            DeploymentOutcome::Completed if deployment.failed_tasks == 0 => {
                Some(MessageField::text(msg::SUCCESS_SENTENCE))
            }
            DeploymentOutcome::Failed => Some(MessageField::text(msg::FAILURE_SENTENCE)),
            _ => None,
        };

        NotificationMessage::new(title, outcome.color(statuses), MessageField::text(lines.join("\n")))
            .with_optional_field(closing)
            .with_footer(msg::FOOTER)
            .with_timestamp(envelope.occurred_at().epoch_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(detail: serde_json::Value) -> Envelope {
        Envelope::from_value(json!({
            "source": "compute-orchestration",
            "detail-type": "Deployment State Change",
            "time": "2024-01-01T00:00:00Z",
            "resources": ["arn:aws:ecs:ap-northeast-2:123456789012:service/chatapp/svc-blue-42"],
            "detail": detail
        }))
        .unwrap()
    }

    fn synthesize(detail: serde_json::Value) -> NotificationMessage {
        DeploymentStateSynthesizer::new().synthesize(&envelope(detail), &StatusTable::standard())
    }

    #[test]
    fn test_completed_green() {
        let message = synthesize(json!({
            "deploymentStatus": "COMPLETED",
            "serviceName": "svc-green",
            "deployment": {
                "desiredCount": 2, "runningCount": 2, "pendingCount": 0, "failedTasks": 0,
                "taskDefinition": "arn:aws:ecs:ap-northeast-2:1:task-definition/chatapp:17"
            }
        }));

        assert_eq!(message.color(), Color::Positive);
        assert_eq!(message.title(), "🎉 🟢 Green 환경 - 배포 완료 ✅");
        assert!(message.contains_text("실행중: *2/2개*"));
        assert!(message.contains_text("`revision 17`"));
        assert!(message.contains_text("`svc-green`"));
        assert!(message.contains_text(msg::SUCCESS_SENTENCE));
        assert_eq!(message.fields().len(), 2);
        assert_eq!(message.footer(), msg::FOOTER);
        assert_eq!(message.timestamp(), Some(1_704_067_200));
    }

    #[test]
    fn test_completed_with_failed_tasks_has_no_closing_sentence() {
        let message = synthesize(json!({
            "deploymentStatus": "COMPLETED",
            "deployment": { "desiredCount": 2, "runningCount": 2, "failedTasks": 1 }
        }));
        assert_eq!(message.color(), Color::Positive);
        assert!(message.contains_text("❌ 실패: *1개*"));
        assert!(!message.contains_text(msg::SUCCESS_SENTENCE));
        assert_eq!(message.fields().len(), 1);
    }

    #[test]
    fn test_failed_always_has_failure_sentence() {
        let message = synthesize(json!({
            "deploymentStatus": "FAILED",
            "deployment": { "desiredCount": 2, "runningCount": 0, "failedTasks": 0 }
        }));
        assert_eq!(message.color(), Color::Negative);
        assert!(message.title().starts_with("🚨"));
        assert!(message.contains_text(msg::FAILURE_SENTENCE));

        let message = synthesize(json!({ "deploymentStatus": "FAILED" }));
        assert_eq!(message.color(), Color::Negative);
        assert!(message.contains_text(msg::FAILURE_SENTENCE));
    }

    #[test]
    fn test_in_progress_and_other_statuses() {
        let message = synthesize(json!({ "deploymentStatus": "IN_PROGRESS" }));
        assert_eq!(message.color(), Color::Caution);
        assert!(message.title().ends_with(msg::IN_PROGRESS));
        assert_eq!(message.fields().len(), 1);

        let message = synthesize(json!({ "deploymentStatus": "PENDING" }));
        assert_eq!(message.color(), Color::Neutral);
        assert!(message.title().starts_with("📦"));
        assert!(message.title().ends_with("PENDING"));
    }

    #[test]
    fn test_name_falls_back_to_resource() {
        let message = synthesize(json!({ "deploymentStatus": "COMPLETED" }));
        assert!(message.contains_text("`svc-blue-42`"));
        assert!(message.title().contains("Blue"));
    }

    #[test]
    fn test_missing_everything_renders_defaults() {
        let envelope = Envelope::from_value(json!({
            "source": "aws.ecs",
            "detail-type": "ECS Deployment State Change"
        }))
        .unwrap();
        let message = DeploymentStateSynthesizer::new().synthesize(&envelope, &StatusTable::standard());

        assert!(message.title().contains("Unknown"));
        assert!(message.title().ends_with("UNKNOWN"));
        assert!(message.contains_text("`N/A`"));
        assert!(message.contains_text("`revision N/A`"));
        assert!(message.contains_text("*0/0개*"));
        assert!(message.contains_text("🕒 N/A"));
        assert_eq!(message.timestamp(), None);
    }

    #[test]
    fn test_display_time_uses_offset() {
        let message = synthesize(json!({ "deploymentStatus": "COMPLETED" }));
        assert!(message.contains_text("🕒 2024년 01월 01일 09:00"));

        let envelope = envelope(json!({ "deploymentStatus": "COMPLETED" }));
        let message = DeploymentStateSynthesizer::with_offset_hours(0)
            .synthesize(&envelope, &StatusTable::standard());
        assert!(message.contains_text("🕒 2024년 01월 01일 00:00"));
    }

    #[test]
    fn test_unparsed_time_displays_raw() {
        let envelope = Envelope::from_value(json!({
            "source": "aws.ecs",
            "detail-type": "ECS Deployment State Change",
            "time": "not-a-time",
            "detail": { "deploymentStatus": "COMPLETED" }
        }))
        .unwrap();
        let message = DeploymentStateSynthesizer::new().synthesize(&envelope, &StatusTable::standard());
        assert!(message.contains_text("🕒 not-a-time"));
        assert_eq!(message.timestamp(), None);
    }

    #[test]
    fn test_optional_lines() {
        let message = synthesize(json!({
            "deploymentStatus": "COMPLETED",
            "deployment": { "desiredCount": 3, "runningCount": 1, "pendingCount": 2, "rolloutState": "IN_PROGRESS" }
        }));
        assert!(message.contains_text("⏳ 대기중: 2개"));
        assert!(message.contains_text("📊 Rollout 상태: IN_PROGRESS"));
        assert!(!message.contains_text("❌"));

        let message = synthesize(json!({ "deploymentStatus": "COMPLETED" }));
        assert!(!message.contains_text("대기중"));
        assert!(!message.contains_text("Rollout"));
    }

    #[test]
    fn test_outcome_from_status() {
        assert_eq!(DeploymentOutcome::from_status(Some("COMPLETED")), DeploymentOutcome::Completed);
        assert_eq!(DeploymentOutcome::from_status(Some("FAILED")), DeploymentOutcome::Failed);
        assert_eq!(
            DeploymentOutcome::from_status(Some("completed")),
            DeploymentOutcome::Other("completed".to_string())
        );
        assert!(!DeploymentOutcome::from_status(Some(" FAILED ")).is_terminal());
        assert_eq!(DeploymentOutcome::from_status(None), DeploymentOutcome::Other("UNKNOWN".to_string()));
        assert!(DeploymentOutcome::Completed.is_terminal());
        assert!(!DeploymentOutcome::InProgress.is_terminal());
        assert!(!DeploymentOutcome::from_status(Some("PENDING")).is_terminal());
    }

    #[test]
    fn test_environment_from_name() {
        assert_eq!(Environment::from_service_name("chatapp-BLUE"), Environment::Blue);
        assert_eq!(Environment::from_service_name("svc-green"), Environment::Green);
        assert_eq!(Environment::from_service_name("svc-blue-green"), Environment::Blue);
        assert_eq!(Environment::from_service_name("N/A"), Environment::Unknown);
    }

    #[test]
    fn test_invalid_offset_uses_default() {
        let envelope = envelope(json!({ "deploymentStatus": "COMPLETED" }));
        let message = DeploymentStateSynthesizer::with_offset_hours(48)
            .synthesize(&envelope, &StatusTable::standard());
        assert!(message.contains_text("🕒 2024년 01월 01일 09:00"));
    }
}
