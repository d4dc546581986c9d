use serde::{Deserialize, Serialize};

use crate::transport::delivery::DeliveryError;

/// A notification submitted by a publisher, `{ subscriptionType, value }` on
/// the wire. The value is opaque and passes through to every resolved target
/// unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub subscription_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Notification {
    pub fn new(topic: &str, value: serde_json::Value) -> Self {
        Self {
            subscription_type: topic.to_string(),
            value,
        }
    }
}

/// Per-target result of one fan-out delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub connection_id: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<DeliveryFailure>,
}

impl DeliveryOutcome {
    pub fn succeeded(connection_id: String) -> Self {
        Self {
            connection_id,
            delivered: true,
            failure: None,
        }
    }

    pub fn failed(connection_id: String, failure: DeliveryFailure) -> Self {
        Self {
            connection_id,
            delivered: false,
            failure: Some(failure),
        }
    }
}

/// Failure classification reported in a `DeliveryOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryFailure {
    /// Target connection closed or stale on the gateway side.
    Gone,
    /// Transient network or service failure, including timeouts. Not retried.
    Transport,
    /// Anything else.
    Unknown,
}

impl From<&DeliveryError> for DeliveryFailure {
    fn from(err: &DeliveryError) -> Self {
        match err {
            DeliveryError::Gone => DeliveryFailure::Gone,
            DeliveryError::Transport(_) => DeliveryFailure::Transport,
            DeliveryError::Unknown(_) => DeliveryFailure::Unknown,
        }
    }
}
