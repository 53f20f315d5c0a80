//! Rendered notification and its Slack wire form

use serde::{Deserialize, Serialize};

use super::status::Color;

/// One entry of the attachment field list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageField {
    /// Label; unlabeled fields render as plain text blocks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub value: String,
    /// Whether Slack may place the field next to another one
    pub short: bool,
}

impl MessageField {
    pub fn labeled(title: impl Into<String>, value: impl Into<String>, short: bool) -> Self {
        Self {
            title: Some(title.into()),
            value: value.into(),
            short,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            title: None,
            value: value.into(),
            short: false,
        }
    }
}

/// Notification produced for a single event.
///
/// Always holds at least one field: the constructor takes the primary one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    title: String,
    color: Color,
    fields: Vec<MessageField>,
    footer: String,
    timestamp: Option<i64>,
}

impl NotificationMessage {
    pub fn new(title: impl Into<String>, color: Color, primary: MessageField) -> Self {
        Self {
            title: title.into(),
            color,
            fields: vec![primary],
            footer: String::new(),
            timestamp: None,
        }
    }

    /// Append a field after the existing ones
    pub fn with_field(mut self, field: MessageField) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a field only when `field` is `Some`
    pub fn with_optional_field(mut self, field: Option<MessageField>) -> Self {
        self.fields.extend(field);
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    /// Epoch seconds of the event; `None` when the event time did not parse
    pub fn with_timestamp(mut self, timestamp: Option<i64>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn fields(&self) -> &[MessageField] {
        &self.fields
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Whether any field value contains `needle`
    pub fn contains_text(&self, needle: &str) -> bool {
        self.fields.iter().any(|f| f.value.contains(needle))
    }
}

/// Slack incoming-webhook payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackPayload {
    pub attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackAttachment {
    pub color: String,
    pub title: String,
    pub fields: Vec<MessageField>,
    pub footer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl From<&NotificationMessage> for SlackPayload {
    fn from(message: &NotificationMessage) -> Self {
        Self {
            attachments: vec![SlackAttachment {
                color: message.color.slack_color().to_string(),
                title: message.title.clone(),
                fields: message.fields.clone(),
                footer: message.footer.clone(),
                ts: message.timestamp,
            }],
        }
    }
}

impl SlackPayload {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
