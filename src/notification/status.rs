//! Status to severity classification
//!
//! Maps status labels reported by the orchestrator (task, deployment and
//! service states) to the color tier used when rendering a notification:
//! - POSITIVE: the resource reached a healthy state (RUNNING, COMPLETED)
//! - NEGATIVE: the resource stopped or failed (STOPPED, FAILED)
//! - CAUTION: the resource is between states (PENDING, DRAINING)
//! - NEUTRAL: anything not listed

/// Severity tier of a notification, rendered as the attachment color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Positive,
    Negative,
    Caution,
    Neutral,
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Positive => "positive",
            Color::Negative => "negative",
            Color::Caution => "caution",
            Color::Neutral => "neutral",
        }
    }

    /// Value of the Slack attachment `color` field
    pub fn slack_color(&self) -> &'static str {
        match self {
            Color::Positive => "good",
            Color::Negative => "danger",
            Color::Caution => "warning",
            Color::Neutral => "#439FE0",
        }
    }
}

/// Statuses with a known tier. Keys are upper case.
const STATUS_COLORS: &[(&str, Color)] = &[
    ("RUNNING", Color::Positive),
    ("COMPLETED", Color::Positive),
    ("PRIMARY", Color::Positive),
    ("ACTIVE", Color::Positive),
    ("STOPPED", Color::Negative),
    ("FAILED", Color::Negative),
    ("INACTIVE", Color::Negative),
    ("PENDING", Color::Caution),
    ("DEPROVISIONING", Color::Caution),
    ("STOPPING", Color::Caution),
    ("DRAINING", Color::Caution),
];

/// Lookup table from status label to color tier
#[derive(Debug, Clone, Copy)]
pub struct StatusTable {
    entries: &'static [(&'static str, Color)],
}

impl StatusTable {
    pub const fn standard() -> Self {
        Self {
            entries: STATUS_COLORS,
        }
    }

    /// Color for a status label.
    ///
    /// Matching ignores case and surrounding whitespace. Unknown labels are
    /// `Neutral`, never an error.
    pub fn color_for(&self, status: &str) -> Color {
        let status = status.trim();
        self.entries
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(status))
            .map(|(_, color)| *color)
            .unwrap_or(Color::Neutral)
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Shorthand for `StatusTable::standard().color_for(status)`
pub fn color_for(status: &str) -> Color {
    StatusTable::standard().color_for(status)
}
