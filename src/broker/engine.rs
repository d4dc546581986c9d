use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::broker::message::{DeliveryFailure, DeliveryOutcome, Notification};
use crate::registry::ConnectionStore;
use crate::transport::delivery::{DeliveryError, DeliveryTransport};
use crate::transport::message::{ControlFrame, SubscriptionAction};
use crate::utils::error::BrokerError;

/// The notification broker.
///
/// Tracks connection lifecycle and subscriptions in the shared registry and
/// fans published notifications out to every subscribed connection. All
/// cross-event state lives in the `ConnectionStore`; the broker itself holds
/// only shared handles and is safe to share across concurrently handled
/// gateway events.
pub struct Broker {
    store: ConnectionStore,
    transport: Arc<dyn DeliveryTransport>,
    delivery_timeout: Duration,
    default_subscriptions: Vec<String>,
}

impl Broker {
    pub fn new(
        store: ConnectionStore,
        transport: Arc<dyn DeliveryTransport>,
        delivery_timeout: Duration,
        default_subscriptions: Vec<String>,
    ) -> Self {
        Self {
            store,
            transport,
            delivery_timeout,
            default_subscriptions,
        }
    }

    /// CONNECT: register the connection with the configured default
    /// subscription set (empty unless `broker.default_subscriptions` is set).
    ///
    /// A `StoreUnavailable` failure is surfaced to the caller but must not
    /// close the underlying socket; the connection stays up in a degraded
    /// mode where it receives no fan-outs.
    pub fn on_connect(&self, connection_id: &str) -> Result<(), BrokerError> {
        self.store
            .create_connection(connection_id, &self.default_subscriptions)?;
        info!(connection_id, "connection registered");
        Ok(())
    }

    /// DISCONNECT: drop the connection's record. Idempotent; deregistering an
    /// unknown id succeeds as a no-op.
    pub fn on_disconnect(&self, connection_id: &str) -> Result<(), BrokerError> {
        self.store.remove_connection(connection_id)?;
        info!(connection_id, "connection deregistered");
        Ok(())
    }

    /// MESSAGE: parse and apply a client control frame. Malformed frames are
    /// rejected as `InvalidRequest` without touching any state.
    pub fn handle_control_frame(&self, connection_id: &str, raw: &str) -> Result<(), BrokerError> {
        let frame: ControlFrame = serde_json::from_str(raw)
            .map_err(|e| BrokerError::InvalidRequest(format!("bad control frame: {e}")))?;
        self.on_subscription_change(connection_id, &frame)
    }

    /// Apply a subscribe/unsubscribe to the connection's subscription set.
    /// Both directions are idempotent. An id with no registry entry (race
    /// with a concurrent disconnect) is a no-op success.
    pub fn on_subscription_change(
        &self,
        connection_id: &str,
        frame: &ControlFrame,
    ) -> Result<(), BrokerError> {
        if frame.subscription_type.is_empty() {
            return Err(BrokerError::InvalidRequest(
                "missing subscriptionType".to_string(),
            ));
        }
        match frame.value {
            SubscriptionAction::Subscribe => self
                .store
                .add_subscription(connection_id, &frame.subscription_type)?,
            SubscriptionAction::Unsubscribe => self
                .store
                .remove_subscription(connection_id, &frame.subscription_type)?,
        }
        debug!(
            connection_id,
            topic = %frame.subscription_type,
            action = ?frame.value,
            "subscription updated"
        );
        Ok(())
    }

    /// PUBLISH: resolve the topic's subscribers and deliver to each of them
    /// in parallel, waiting for every attempt to settle.
    ///
    /// Returns one outcome per resolved target. Delivery failures never fail
    /// the publish itself; a topic with no subscribers yields an empty list.
    pub async fn publish(
        &self,
        notification: &Notification,
    ) -> Result<Vec<DeliveryOutcome>, BrokerError> {
        let topic = notification.subscription_type.as_str();
        if topic.is_empty() {
            return Err(BrokerError::InvalidRequest(
                "missing subscriptionType".to_string(),
            ));
        }

        let targets = self.store.subscribers_of(topic)?;
        if targets.is_empty() {
            debug!(topic, "publish resolved no subscribers");
            return Ok(Vec::new());
        }

        let deliveries = targets
            .into_iter()
            .map(|record| self.deliver(record.id, notification));
        let outcomes = join_all(deliveries).await;

        let failed = outcomes.iter().filter(|o| !o.delivered).count();
        info!(topic, targets = outcomes.len(), failed, "fan-out complete");
        Ok(outcomes)
    }

    pub fn connection_count(&self) -> usize {
        self.store.connection_count()
    }

    /// One delivery attempt, bounded by the configured timeout. Never
    /// escalates: every failure mode collapses into the outcome.
    async fn deliver(&self, connection_id: String, notification: &Notification) -> DeliveryOutcome {
        let attempt = self.transport.send(&connection_id, notification);
        match timeout(self.delivery_timeout, attempt).await {
            Ok(Ok(())) => DeliveryOutcome::succeeded(connection_id),
            Ok(Err(DeliveryError::Gone)) => {
                warn!(connection_id = %connection_id, "target gone, removing stale registry entry");
                // Self-healing: the record outlived its connection.
                if let Err(e) = self.store.remove_connection(&connection_id) {
                    warn!(connection_id = %connection_id, error = %e, "stale entry cleanup failed");
                }
                DeliveryOutcome::failed(connection_id, DeliveryFailure::Gone)
            }
            Ok(Err(e)) => {
                warn!(connection_id = %connection_id, error = %e, "delivery failed");
                DeliveryOutcome::failed(connection_id, DeliveryFailure::from(&e))
            }
            Err(_) => {
                warn!(
                    connection_id = %connection_id,
                    timeout_ms = self.delivery_timeout.as_millis() as u64,
                    "delivery timed out"
                );
                DeliveryOutcome::failed(connection_id, DeliveryFailure::Transport)
            }
        }
    }
}
