//! Task state change notifications

use super::{last_segment, Synthesizer, MONITOR_FOOTER, NOT_AVAILABLE};
use crate::envelope::{non_empty, Envelope, EventDetail, TaskStateDetail};
use crate::notification::message::{MessageField, NotificationMessage};
use crate::notification::status::StatusTable;

/// Characters of the task id shown before the ellipsis
const TASK_ID_PREFIX_LEN: usize = 13;

/// Synthesizer for task state changes
#[derive(Debug, Clone, Default)]
pub struct TaskStateSynthesizer;

impl TaskStateSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

fn glyph(last_status: &str) -> &'static str {
    match last_status {
        "RUNNING" => "🚀",
        "STOPPED" => "🛑",
        _ => "⏳",
    }
}

impl Synthesizer for TaskStateSynthesizer {
    fn synthesize(&self, envelope: &Envelope, statuses: &StatusTable) -> NotificationMessage {
        let fallback = TaskStateDetail::default();
        let detail = match envelope.detail() {
            EventDetail::TaskState(detail) => detail,
            _ => &fallback,
        };

        let last_status = non_empty(&detail.last_status).unwrap_or("UNKNOWN");
        let desired_status = non_empty(&detail.desired_status).unwrap_or("UNKNOWN");

        let task_id = non_empty(&detail.task_arn)
            .map(|arn| last_segment(arn, '/'))
            .unwrap_or(NOT_AVAILABLE);
        let short_task_id: String = task_id.chars().take(TASK_ID_PREFIX_LEN).collect();

        let cluster = non_empty(&detail.cluster_arn)
            .map(|arn| last_segment(arn, '/'))
            .unwrap_or(NOT_AVAILABLE);

        // The resources list names the task itself, never the service
        let service = detail.service_name().unwrap_or(NOT_AVAILABLE);

        let containers: Vec<String> = detail
            .containers
            .iter()
            .map(|c| {
                format!(
                    "{}: {}",
                    non_empty(&c.name).unwrap_or("unknown"),
                    non_empty(&c.last_status).unwrap_or("unknown")
                )
            })
            .collect();

        let title = format!("{} ECS Task {}", glyph(last_status), last_status);

        NotificationMessage::new(
            title,
            statuses.color_for(last_status),
            MessageField::labeled("Service", service, true),
        )
        .with_field(MessageField::labeled("Cluster", cluster, true))
        .with_field(MessageField::labeled("Task ID", format!("`{short_task_id}...`"), true))
        .with_field(MessageField::labeled(
            "Status",
            format!("{last_status} → {desired_status}"),
            true,
        ))
        .with_optional_field(
            (!containers.is_empty()).then(|| MessageField::labeled("Containers", containers.join("\n"), false)),
        )
        .with_optional_field(
            non_empty(&detail.stopped_reason).map(|r| MessageField::labeled("Stop Reason", r, false)),
        )
        .with_optional_field(non_empty(&detail.stop_code).map(|c| MessageField::labeled("Stop Code", c, true)))
        .with_footer(MONITOR_FOOTER)
        .with_timestamp(envelope.occurred_at().epoch_seconds())
    }
}
