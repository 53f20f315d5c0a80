//! Error types for event processing and delivery.

use thiserror::Error;

/// The inbound payload could not be turned into an envelope at all.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Not valid JSON
    #[error("event payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON, but not an object
    #[error("event payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Failed to look up the webhook endpoint.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The backing entry does not exist
    #[error("webhook endpoint not found: {0}")]
    NotFound(String),

    /// The entry exists but holds nothing usable
    #[error("webhook endpoint entry {0} is empty")]
    Empty(String),

    /// The backing store could not be read
    #[error("failed to read webhook endpoint from {location}: {source}")]
    Unreadable {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a single failed delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The endpoint answered with a non-2xx status
    #[error("webhook rejected the message with {status}: {body}")]
    Rejected { status: u16, body: String },

    /// No answer within the configured deadline
    #[error("webhook did not answer within {0}s")]
    Timeout(u64),

    /// Connection, DNS, TLS or similar failure
    #[error("webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The HTTP client itself could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Cause of a failed invocation.
#[derive(Debug, Error)]
pub enum ProcessingCause {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The event time is required as epoch seconds but did not parse
    #[error("event time {0:?} is not a valid RFC 3339 instant")]
    InvalidTimestamp(String),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// A failed invocation, with enough context for triage.
#[derive(Debug, Error)]
#[error("failed to process {category:?} event for {resource}: {cause}")]
pub struct ProcessingError {
    pub category: String,
    pub resource: String,
    #[source]
    pub cause: ProcessingCause,
}

impl ProcessingError {
    pub fn new(
        category: impl Into<String>,
        resource: impl Into<String>,
        cause: impl Into<ProcessingCause>,
    ) -> Self {
        Self {
            category: category.into(),
            resource: resource.into(),
            cause: cause.into(),
        }
    }
}

/// Errors from the capacity toggle boundary.
#[derive(Debug, Error)]
pub enum CapacityError {
    #[error("service {0} not found")]
    ServiceNotFound(String),

    #[error("service {service} not stable after {attempts} attempts (running {running}/{desired})")]
    NotStable {
        service: String,
        attempts: u32,
        running: u32,
        desired: u32,
    },

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_error_carries_context() {
        let err = ProcessingError::new(
            "ECS Deployment State Change",
            "svc-blue",
            ProcessingCause::InvalidTimestamp("yesterday".to_string()),
        );
        let text = err.to_string();
        assert!(text.contains("ECS Deployment State Change"));
        assert!(text.contains("svc-blue"));
        assert!(text.contains("yesterday"));
    }

    #[test]
    fn test_rejected_display() {
        let err = DeliveryError::Rejected {
            status: 404,
            body: "no_service".to_string(),
        };
        assert_eq!(err.to_string(), "webhook rejected the message with 404: no_service");
    }
}
