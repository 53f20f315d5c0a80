//! Inbound event envelope
//!
//! One envelope is built per invocation from the raw event JSON:
//!
//! ```json
//! {
//!   "source": "aws.ecs",
//!   "detail-type": "ECS Deployment State Change",
//!   "time": "2024-01-01T00:00:00Z",
//!   "resources": ["arn:aws:ecs:ap-northeast-2:123456789012:service/cluster/svc-blue"],
//!   "detail": { ... }
//! }
//! ```
//!
//! `detail` is parsed into a typed variant chosen by `detail-type`. Every field
//! of every variant is optional on the wire: missing keys, `null`, or values of
//! the wrong shape fall back to defaults instead of failing the parse. Keys a
//! variant does not know about are ignored.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::EnvelopeError;

/// Producer of the event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Container orchestration (ECS)
    ComputeOrchestration,
    /// Load balancer target groups
    LoadBalancing,
    Other,
}

impl SourceKind {
    pub fn from_source(source: &str) -> Self {
        match source.trim() {
            "aws.ecs" | "compute-orchestration" => SourceKind::ComputeOrchestration,
            "aws.elasticloadbalancing" | "load-balancing" => SourceKind::LoadBalancing,
            _ => SourceKind::Other,
        }
    }
}

/// Event category, derived from `detail-type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    DeploymentStateChange,
    TaskStateChange,
    ServiceAction,
    TargetHealthChange,
    Other,
}

impl EventKind {
    /// Provider prefixes ("ECS ...") are accepted as well as the bare names.
    pub fn from_category(category: &str) -> Self {
        let category = category.trim();
        if category.ends_with("Deployment State Change") {
            EventKind::DeploymentStateChange
        } else if category.ends_with("Task State Change") {
            EventKind::TaskStateChange
        } else if category.ends_with("Service Action") {
            EventKind::ServiceAction
        } else if category.contains("Target Health") {
            EventKind::TargetHealthChange
        } else {
            EventKind::Other
        }
    }
}

/// Event time as supplied by the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccurredAt {
    At(DateTime<Utc>),
    /// Present but not a valid instant; kept for display
    Unparsed(String),
    Missing,
}

impl OccurredAt {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return OccurredAt::Missing;
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return OccurredAt::At(dt.with_timezone(&Utc));
        }
        // Offset-less timestamps are taken as UTC
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return OccurredAt::At(naive.and_utc());
        }
        OccurredAt::Unparsed(raw.to_string())
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            OccurredAt::At(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn epoch_seconds(&self) -> Option<i64> {
        self.instant().map(|dt| dt.timestamp())
    }

    /// Raw text for display when the instant is unusable
    pub fn raw(&self) -> String {
        match self {
            OccurredAt::At(dt) => dt.to_rfc3339(),
            OccurredAt::Unparsed(raw) => raw.clone(),
            OccurredAt::Missing => "N/A".to_string(),
        }
    }
}

/// Typed `detail` payload
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
    Deployment(DeploymentDetail),
    TaskState(TaskStateDetail),
    ServiceAction(ServiceActionDetail),
    TargetHealth(TargetHealthDetail),
    /// Unrecognized category; its detail is not inspected
    Other,
}

/// Detail of a deployment state change
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDetail {
    #[serde(default, deserialize_with = "lenient::text")]
    pub deployment_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub service_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub event_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::record")]
    pub deployment: DeploymentInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub task_definition: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rollout_state: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub desired_count: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub running_count: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub pending_count: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub failed_tasks: u64,
}

/// Detail of a task state change
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateDetail {
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub desired_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub task_arn: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub cluster_arn: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub group: Option<String>,
    #[serde(default, deserialize_with = "lenient::record")]
    pub containers: Vec<ContainerState>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub stopped_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub stop_code: Option<String>,
}

impl TaskStateDetail {
    /// Service that launched the task. Only a `service:<name>` group names
    /// one; standalone tasks have none.
    pub fn service_name(&self) -> Option<&str> {
        non_empty(&self.group)
            .and_then(|group| group.strip_prefix("service:"))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerState {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_status: Option<String>,
}

/// Detail of a service action (steady state, deployment start, ...)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceActionDetail {
    #[serde(default, deserialize_with = "lenient::text")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub event_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::record")]
    pub deployments: Vec<ServiceDeployment>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeployment {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub desired_count: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub running_count: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub pending_count: u64,
}

/// Detail of a load balancer target health change
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHealthDetail {
    #[serde(default, deserialize_with = "lenient::record")]
    pub target: TargetRef,
    #[serde(default, deserialize_with = "lenient::record")]
    pub target_health: TargetHealth,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TargetRef {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub port: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TargetHealth {
    #[serde(default, deserialize_with = "lenient::text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
}

/// Wire shape of the envelope. `detail` is held untyped only until the
/// category is known.
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default, deserialize_with = "lenient::text")]
    source: Option<String>,
    #[serde(rename = "detail-type", default, deserialize_with = "lenient::text")]
    detail_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    time: Option<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    resources: Vec<String>,
    #[serde(default)]
    detail: serde_json::Value,
}

/// One inbound lifecycle event. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    source: String,
    category: String,
    occurred_at: OccurredAt,
    detail: EventDetail,
    resources: Vec<String>,
}

impl Envelope {
    /// Parse an envelope from raw event text
    pub fn from_json(raw: &str) -> Result<Self, EnvelopeError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Build an envelope from an already decoded event.
    ///
    /// Only a non-object payload is an error; everything below the top level
    /// degrades to defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self, EnvelopeError> {
        let kind = match &value {
            serde_json::Value::Object(_) => None,
            serde_json::Value::Null => Some("null"),
            serde_json::Value::Bool(_) => Some("a boolean"),
            serde_json::Value::Number(_) => Some("a number"),
            serde_json::Value::String(_) => Some("a string"),
            serde_json::Value::Array(_) => Some("an array"),
        };
        if let Some(kind) = kind {
            return Err(EnvelopeError::NotAnObject(kind));
        }

        let raw: RawEnvelope = serde_json::from_value(value)?;
        let category = raw.detail_type.unwrap_or_default();
        let detail = match EventKind::from_category(&category) {
            EventKind::DeploymentStateChange => EventDetail::Deployment(typed_detail(raw.detail)),
            EventKind::TaskStateChange => EventDetail::TaskState(typed_detail(raw.detail)),
            EventKind::ServiceAction => EventDetail::ServiceAction(typed_detail(raw.detail)),
            EventKind::TargetHealthChange => EventDetail::TargetHealth(typed_detail(raw.detail)),
            EventKind::Other => EventDetail::Other,
        };

        Ok(Self {
            source: raw.source.unwrap_or_default(),
            category,
            occurred_at: OccurredAt::parse(raw.time.as_deref()),
            detail,
            resources: raw.resources,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_kind(&self) -> SourceKind {
        SourceKind::from_source(&self.source)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from_category(&self.category)
    }

    pub fn occurred_at(&self) -> &OccurredAt {
        &self.occurred_at
    }

    pub fn detail(&self) -> &EventDetail {
        &self.detail
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Name derived from the first resource: the text after the last
    /// `separator`, or the whole identifier when it has none.
    pub fn resource_tail(&self, separator: char) -> Option<&str> {
        let first = self.resources.first()?.trim();
        let tail = first.rsplit(separator).next().unwrap_or(first);
        if tail.is_empty() {
            None
        } else {
            Some(tail)
        }
    }

    /// `explicit` when it has content, else the last path segment of the
    /// first resource
    pub fn name_or_resource_tail<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or_else(|| self.resource_tail('/'))
    }

    /// Target group of a health event: everything after the last ':' of the
    /// first resource (`targetgroup/<name>/<id>` for a full ARN)
    pub fn target_group(&self) -> Option<&str> {
        self.resource_tail(':')
    }

    /// Resource name for logs and error context. Resolved per event kind the
    /// same way the message shows it.
    pub fn resource_name(&self) -> String {
        let name = match &self.detail {
            EventDetail::Deployment(d) => self.name_or_resource_tail(d.service_name.as_deref()),
            EventDetail::TaskState(d) => d.service_name(),
            EventDetail::TargetHealth(_) => self.target_group(),
            EventDetail::ServiceAction(_) | EventDetail::Other => self.resource_tail('/'),
        };
        name.unwrap_or("N/A").to_string()
    }
}

fn typed_detail<T>(detail: serde_json::Value) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match serde_json::from_value(detail) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(error = %e, "Unusable event detail, using defaults");
            T::default()
        }
    }
}

/// `Some` only for values with visible content
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Deserializers that never fail on a present-but-wrong value.
mod lenient {
    use serde::de::{DeserializeOwned, IgnoredAny};
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Int(i64),
        Float(f64),
        Text(String),
        Bool(bool),
        Other(IgnoredAny),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeRecord<T> {
        Record(T),
        Other(IgnoredAny),
    }

    /// Strings stay strings, numbers and booleans are stringified, anything else is absent.
    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Scalar>::deserialize(d)? {
            Some(Scalar::Text(s)) => Some(s),
            Some(Scalar::Int(n)) => Some(n.to_string()),
            Some(Scalar::Float(f)) => Some(f.to_string()),
            Some(Scalar::Bool(b)) => Some(b.to_string()),
            Some(Scalar::Other(_)) | None => None,
        })
    }

    /// Non-negative counts; everything unusable is 0.
    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        Ok(match Option::<Scalar>::deserialize(d)? {
            Some(Scalar::Int(n)) => u64::try_from(n).unwrap_or(0),
            Some(Scalar::Float(f)) if f.is_finite() && f >= 0.0 => f as u64,
            Some(Scalar::Text(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeText {
        Text(String),
        Other(IgnoredAny),
    }

    /// String lists; non-string elements are skipped, a non-list is empty.
    pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Option::<MaybeRecord<Vec<MaybeText>>>::deserialize(d)? {
            Some(MaybeRecord::Record(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    MaybeText::Text(s) => Some(s),
                    MaybeText::Other(_) => None,
                })
                .collect(),
            Some(MaybeRecord::Other(_)) | None => Vec::new(),
        })
    }

    /// Nested records and lists; a wrong shape yields the default.
    pub fn record<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(match Option::<MaybeRecord<T>>::deserialize(d)? {
            Some(MaybeRecord::Record(value)) => value,
            Some(MaybeRecord::Other(_)) | None => T::default(),
        })
    }
}
