//! Top-level event handler
//!
//! One call handles one inbound event: build the envelope, classify it,
//! synthesize the message, resolve the webhook endpoint and deliver. The
//! endpoint is only resolved once a message exists, so suppressed events
//! never touch the secret store or the network.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use super::message::SlackPayload;
use super::router::{EventRouter, Route, SuppressReason};
use super::secret::SecretResolver;
use super::status::StatusTable;
use super::synth::{SynthesizerKind, Synthesizers};
use super::webhook::{DeliveryAck, DeliveryTransport};
use crate::envelope::Envelope;
use crate::error::{ProcessingCause, ProcessingError};

pub const BODY_SENT: &str = "Notification sent successfully";
pub const BODY_NOT_APPLICABLE: &str = "Event not applicable for notification";
pub const BODY_RENDERED: &str = "Notification rendered (dry run)";

/// What happened to an event that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    Delivered {
        synthesizer: SynthesizerKind,
        ack: DeliveryAck,
    },
    /// Dry run: rendered but not sent
    Rendered {
        synthesizer: SynthesizerKind,
        payload: SlackPayload,
    },
    Suppressed(SuppressReason),
}

/// Invocation result in the shape the runtime expects
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationOutcome {
    pub status_code: u16,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<SlackPayload>,
}

impl InvocationOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl From<Result<Handled, ProcessingError>> for InvocationOutcome {
    fn from(result: Result<Handled, ProcessingError>) -> Self {
        match result {
            Ok(Handled::Delivered { .. }) => Self {
                status_code: 200,
                body: BODY_SENT.to_string(),
                payload: None,
            },
            Ok(Handled::Rendered { payload, .. }) => Self {
                status_code: 200,
                body: BODY_RENDERED.to_string(),
                payload: Some(payload),
            },
            Ok(Handled::Suppressed(_)) => Self {
                status_code: 200,
                body: BODY_NOT_APPLICABLE.to_string(),
                payload: None,
            },
            Err(e) => Self {
                status_code: 500,
                body: format!("Error: {e}"),
                payload: None,
            },
        }
    }
}

/// Event handler
pub struct EventHandler {
    resolver: Arc<dyn SecretResolver>,
    transport: Arc<dyn DeliveryTransport>,
    router: EventRouter,
    synthesizers: Synthesizers,
    statuses: StatusTable,
    dry_run: bool,
}

impl EventHandler {
    pub fn new(resolver: Arc<dyn SecretResolver>, transport: Arc<dyn DeliveryTransport>) -> Self {
        Self {
            resolver,
            transport,
            router: EventRouter::new(),
            synthesizers: Synthesizers::default(),
            statuses: StatusTable::standard(),
            dry_run: false,
        }
    }

    pub fn with_router(mut self, router: EventRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_synthesizers(mut self, synthesizers: Synthesizers) -> Self {
        self.synthesizers = synthesizers;
        self
    }

    /// Render only; skip endpoint resolution and delivery
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Classify only
    pub fn classify(&self, envelope: &Envelope) -> Route {
        self.router.classify(envelope)
    }

    /// Handle one raw event and report the outcome
    pub async fn handle(&self, event: serde_json::Value) -> InvocationOutcome {
        let result = self.process(event).await;
        if let Err(e) = &result {
            error!(
                category = %e.category,
                resource = %e.resource,
                error = %e.cause,
                "Error processing event"
            );
        }
        result.into()
    }

    /// Handle one raw event
    pub async fn process(&self, event: serde_json::Value) -> Result<Handled, ProcessingError> {
        let envelope = Envelope::from_value(event)
            .map_err(|e| ProcessingError::new("unknown", "N/A", e))?;

        let synthesizer = match self.router.classify(&envelope) {
            Route::Synthesize { synthesizer } => synthesizer,
            Route::Suppressed(reason) => {
                info!(
                    category = envelope.category(),
                    reason = %reason,
                    "No message generated for event"
                );
                return Ok(Handled::Suppressed(reason));
            }
        };

        let context = |cause: ProcessingCause| {
            ProcessingError::new(envelope.category(), envelope.resource_name(), cause)
        };

        let message = self.synthesizers.synthesize(synthesizer, &envelope, &self.statuses);

        // The footer timestamp must be a real instant
        if message.timestamp().is_none() {
            return Err(context(ProcessingCause::InvalidTimestamp(envelope.occurred_at().raw())));
        }

        if self.dry_run {
            return Ok(Handled::Rendered {
                synthesizer,
                payload: SlackPayload::from(&message),
            });
        }

        let endpoint = self
            .resolver
            .resolve_webhook_endpoint()
            .await
            .map_err(|e| context(e.into()))?;

        let ack = self
            .transport
            .deliver(&endpoint, &message)
            .await
            .map_err(|e| context(e.into()))?;

        info!(
            transport = self.transport.name(),
            category = envelope.category(),
            synthesizer = %synthesizer,
            status = ack.status,
            "Notification delivered"
        );
        Ok(Handled::Delivered { synthesizer, ack })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeliveryError, SecretError};
    use crate::notification::message::NotificationMessage;
    use crate::notification::secret::StaticSecretResolver;
    use crate::notification::webhook::WebhookEndpoint;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records delivered messages
    #[derive(Default)]
    struct MockTransport {
        sent: Mutex<Vec<NotificationMessage>>,
        reject_with: Option<u16>,
    }

    impl MockTransport {
        fn rejecting(status: u16) -> Self {
            Self {
                reject_with: Some(status),
                ..Default::default()
            }
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DeliveryTransport for MockTransport {
        fn name(&self) -> &str {
            "mock"
        }

        async fn deliver(
            &self,
            _endpoint: &WebhookEndpoint,
            message: &NotificationMessage,
        ) -> Result<DeliveryAck, DeliveryError> {
            self.sent.lock().unwrap().push(message.clone());
            match self.reject_with {
                Some(status) => Err(DeliveryError::Rejected {
                    status,
                    body: "invalid_payload".to_string(),
                }),
                None => Ok(DeliveryAck { status: 200 }),
            }
        }
    }

    /// Counts lookups and always fails
    #[derive(Default)]
    struct FailingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SecretResolver for FailingResolver {
        async fn resolve_webhook_endpoint(&self) -> Result<WebhookEndpoint, SecretError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SecretError::NotFound("/chatapp/slack/webhook-url".to_string()))
        }
    }

    fn handler(transport: Arc<MockTransport>) -> EventHandler {
        EventHandler::new(
            Arc::new(StaticSecretResolver::new("https://hooks.example.com/T/B/secret-token")),
            transport,
        )
    }

    fn deployment(status: &str, time: &str) -> serde_json::Value {
        json!({
            "source": "aws.ecs",
            "detail-type": "ECS Deployment State Change",
            "time": time,
            "resources": ["arn:aws:ecs:ap-northeast-2:1:service/chatapp/chatapp-blue"],
            "detail": {
                "deploymentStatus": status,
                "deployment": { "desiredCount": 1, "runningCount": 1 }
            }
        })
    }

    #[tokio::test]
    async fn test_delivers_terminal_deployment() {
        let transport = Arc::new(MockTransport::default());
        let outcome = handler(transport.clone())
            .handle(deployment("COMPLETED", "2024-01-01T00:00:00Z"))
            .await;

        assert_eq!(outcome.status_code, 200);
        assert_eq!(outcome.body, BODY_SENT);
        assert_eq!(transport.sent_count(), 1);
        assert!(transport.sent.lock().unwrap()[0].title().contains("Blue"));
    }

    #[tokio::test]
    async fn test_suppressed_event_is_not_delivered() {
        let transport = Arc::new(MockTransport::default());
        let resolver = Arc::new(FailingResolver::default());
        let handler = EventHandler::new(resolver.clone(), transport.clone());

        let outcome = handler.handle(deployment("IN_PROGRESS", "2024-01-01T00:00:00Z")).await;
        assert_eq!(outcome.status_code, 200);
        assert_eq!(outcome.body, BODY_NOT_APPLICABLE);
        assert_eq!(transport.sent_count(), 0);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);

        let outcome = handler
            .handle(json!({ "source": "aws.s3", "detail-type": "Object Created", "detail": {} }))
            .await;
        assert_eq!(outcome.body, BODY_NOT_APPLICABLE);
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_secret_failure_is_fatal() {
        let transport = Arc::new(MockTransport::default());
        let handler = EventHandler::new(Arc::new(FailingResolver::default()), transport.clone());

        let result = handler.process(deployment("FAILED", "2024-01-01T00:00:00Z")).await;
        let err = result.unwrap_err();
        assert!(matches!(err.cause, ProcessingCause::Secret(SecretError::NotFound(_))));
        assert_eq!(err.resource, "chatapp-blue");
        assert_eq!(err.category, "ECS Deployment State Change");
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_timestamp_is_processing_error() {
        let transport = Arc::new(MockTransport::default());
        let outcome = handler(transport.clone())
            .handle(deployment("COMPLETED", "not-a-time"))
            .await;

        assert_eq!(outcome.status_code, 500);
        assert!(outcome.body.starts_with("Error: "));
        assert!(outcome.body.contains("not-a-time"));
        assert!(outcome.body.contains("chatapp-blue"));
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_rejection_reported_without_secret() {
        let transport = Arc::new(MockTransport::rejecting(400));
        let outcome = handler(transport.clone())
            .handle(deployment("FAILED", "2024-01-01T00:00:00Z"))
            .await;

        assert_eq!(outcome.status_code, 500);
        assert!(outcome.body.contains("400"));
        assert!(!outcome.body.contains("secret-token"));
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_renders_without_delivery() {
        let transport = Arc::new(MockTransport::default());
        let resolver = Arc::new(FailingResolver::default());
        let handler = EventHandler::new(resolver.clone(), transport.clone()).with_dry_run(true);

        let outcome = handler.handle(deployment("COMPLETED", "2024-01-01T00:00:00Z")).await;
        assert_eq!(outcome.status_code, 200);
        assert_eq!(outcome.body, BODY_RENDERED);
        let payload = outcome.payload.unwrap();
        assert_eq!(payload.attachments[0].color, "good");
        assert_eq!(payload.attachments[0].ts, Some(1_704_067_200));
        assert_eq!(transport.sent_count(), 0);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_object_event() {
        let transport = Arc::new(MockTransport::default());
        let outcome = handler(transport).handle(json!("hello")).await;
        assert_eq!(outcome.status_code, 500);
        assert!(outcome.body.contains("JSON object"));
    }

    #[tokio::test]
    async fn test_extended_routes() {
        let transport = Arc::new(MockTransport::default());
        let event = json!({
            "source": "aws.ecs",
            "detail-type": "ECS Task State Change",
            "time": "2024-01-01T00:00:00Z",
            "detail": { "lastStatus": "STOPPED", "desiredStatus": "STOPPED" }
        });

        let outcome = handler(transport.clone()).handle(event.clone()).await;
        assert_eq!(outcome.body, BODY_NOT_APPLICABLE);

        let outcome = handler(transport.clone())
            .with_router(EventRouter::new().with_extended_routes(true))
            .handle(event)
            .await;
        assert_eq!(outcome.body, BODY_SENT);
        assert_eq!(transport.sent.lock().unwrap()[0].title(), "🛑 ECS Task STOPPED");
    }

    #[test]
    fn test_outcome_serializes_like_lambda_response() {
        let outcome = InvocationOutcome::from(Ok(Handled::Suppressed(SuppressReason::RouteDisabled {
            category: "ECS Task State Change".to_string(),
        })));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "statusCode": 200, "body": BODY_NOT_APPLICABLE })
        );
        assert!(outcome.is_success());
    }
}
