//! deploy-notify - deployment and target health notifications for Slack
//!
//! Events arrive as JSON envelopes. The router picks the ones worth a
//! message, a synthesizer renders them, and the webhook transport posts the
//! result.

pub mod capacity;
pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod notification;

pub use capacity::{await_stable, scale_services, CapacityToggle, ScaleResult, ServiceState, StabilityWait};
pub use config::NotifierConfig;
pub use envelope::{Envelope, EventDetail, EventKind, OccurredAt, SourceKind};
pub use error::{CapacityError, DeliveryError, EnvelopeError, ProcessingCause, ProcessingError, SecretError};
pub use notification::{
    EventHandler, EventRouter, Handled, InvocationOutcome, NotificationMessage, Route, SlackPayload,
    SuppressReason, SynthesizerKind,
};
