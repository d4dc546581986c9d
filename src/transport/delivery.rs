use async_trait::async_trait;
use thiserror::Error;

use crate::broker::message::Notification;

/// Per-delivery failure raised by a transport realization.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The target connection is closed or stale on the gateway side. The
    /// notifier reacts by removing the target's registry entry.
    #[error("connection is gone")]
    Gone,

    /// Transient network or service failure. Not retried.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Defensive catch-all.
    #[error("delivery failed: {0}")]
    Unknown(String),
}

/// Push one notification to one connection.
///
/// The fan-out notifier is written against this contract only, never against
/// a concrete transport's error shape, so realizations can be swapped by
/// configuration without touching fan-out logic.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn send(
        &self,
        connection_id: &str,
        notification: &Notification,
    ) -> Result<(), DeliveryError>;
}
