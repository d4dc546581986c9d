//! Error taxonomy for the registry and broker layers.
//!
//! Delivery-level failures have their own type, `DeliveryError`, defined next
//! to the `DeliveryTransport` trait in the `transport` module; they are
//! contained per target and never surface through `BrokerError`.

use thiserror::Error;

/// Errors raised by registry and broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The backing connection store could not be read or written. Logged and
    /// surfaced to the caller; never tears down the client's live connection.
    #[error("connection store unavailable: {0}")]
    StoreUnavailable(#[from] sled::Error),

    /// A stored connection record that no longer decodes.
    #[error("corrupt connection record for {id}: {source}")]
    CorruptRecord {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A malformed control frame or publish body. No state is mutated.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
