use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{RwLock, mpsc};
use tokio_tungstenite::accept_async;
use tracing::{error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::Broker;
use crate::broker::message::Notification;
use crate::transport::delivery::{DeliveryError, DeliveryTransport};
use crate::utils::error::BrokerError;

/// In-process push transport: the gateway's native connection-management
/// surface. Holds one outbound channel per live WebSocket connection.
///
/// Constructed once at process start and shared; the gateway loop registers
/// and unregisters channels as connections come and go.
#[derive(Debug, Default)]
pub struct GatewayPush {
    senders: RwLock<HashMap<String, mpsc::UnboundedSender<WsMessage>>>,
}

impl GatewayPush {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection_id: &str, sender: mpsc::UnboundedSender<WsMessage>) {
        self.senders
            .write()
            .await
            .insert(connection_id.to_string(), sender);
    }

    pub async fn unregister(&self, connection_id: &str) {
        self.senders.write().await.remove(connection_id);
    }

    pub async fn live_connections(&self) -> usize {
        self.senders.read().await.len()
    }
}

#[async_trait]
impl DeliveryTransport for GatewayPush {
    async fn send(
        &self,
        connection_id: &str,
        notification: &Notification,
    ) -> Result<(), DeliveryError> {
        let text = serde_json::to_string(notification)
            .map_err(|e| DeliveryError::Unknown(e.to_string()))?;
        let senders = self.senders.read().await;
        let sender = senders.get(connection_id).ok_or(DeliveryError::Gone)?;
        // A send error means the receive half is dropped: the connection's
        // forward task has already exited.
        sender
            .send(WsMessage::text(text))
            .map_err(|_| DeliveryError::Gone)
    }
}

/// Accept WebSocket connections and drive the broker with the CONNECT /
/// MESSAGE / DISCONNECT events of each one.
pub async fn start_gateway(
    addr: &str,
    broker: Arc<Broker>,
    push: Arc<GatewayPush>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr, "gateway listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let broker = broker.clone();
        let push = push.clone();
        let connection_id = format!("conn-{}", uuid::Uuid::new_v4());

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "websocket handshake failed");
                    return;
                }
            };

            info!(connection_id = %connection_id, peer = %peer, "connection opened");

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

            push.register(&connection_id, tx).await;

            // Registration failure leaves the socket up (degraded mode): the
            // client stays connected but receives no fan-outs.
            if let Err(e) = broker.on_connect(&connection_id) {
                error!(connection_id = %connection_id, error = %e, "connection registration failed");
            }

            // Forward broker pushes to the socket.
            let forward_id = connection_id.clone();
            let forward = tokio::spawn(async move {
                while let Some(msg) = rx.recv().await {
                    if let Err(e) = ws_sender.send(msg).await {
                        warn!(connection_id = %forward_id, error = %e, "push send failed");
                        break;
                    }
                }
            });

            // Control frames are applied in the order this connection sends
            // them. A bad frame is logged and dropped, never fatal.
            while let Some(Ok(msg)) = ws_receiver.next().await {
                if !msg.is_text() {
                    continue;
                }
                let Ok(text) = msg.to_text() else { continue };
                match broker.handle_control_frame(&connection_id, text) {
                    Ok(()) => {}
                    Err(e @ BrokerError::InvalidRequest(_)) => {
                        warn!(connection_id = %connection_id, error = %e, "control frame dropped");
                    }
                    Err(e) => {
                        error!(connection_id = %connection_id, error = %e, "control frame not applied");
                    }
                }
            }

            info!(connection_id = %connection_id, "connection closed");

            push.unregister(&connection_id).await;
            if let Err(e) = broker.on_disconnect(&connection_id) {
                error!(connection_id = %connection_id, error = %e, "connection deregistration failed");
            }
            forward.abort();
        });
    }
}
