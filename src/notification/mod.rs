//! Notification pipeline
//!
//! An [`Envelope`](crate::envelope::Envelope) flows through:
//! 1. `EventRouter` decides whether the event notifies and which synthesizer builds it
//! 2. A `Synthesizer` turns it into a `NotificationMessage`
//! 3. A `SecretResolver` yields the webhook endpoint
//! 4. A `DeliveryTransport` posts the message
//!
//! `EventHandler` wires the steps together for one invocation.

pub mod handler;
pub mod message;
pub mod router;
pub mod secret;
pub mod status;
pub mod synth;
pub mod webhook;

pub use handler::{EventHandler, Handled, InvocationOutcome};
pub use message::{MessageField, NotificationMessage, SlackAttachment, SlackPayload};
pub use router::{EventRouter, Route, SuppressReason};
pub use secret::{EnvSecretResolver, FileSecretResolver, SecretResolver, StaticSecretResolver};
pub use status::{color_for, Color, StatusTable};
pub use synth::{Synthesizer, SynthesizerKind, Synthesizers};
pub use webhook::{DeliveryAck, DeliveryTransport, WebhookClient, WebhookConfig, WebhookEndpoint};
