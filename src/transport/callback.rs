use async_trait::async_trait;
use reqwest::StatusCode;

use crate::broker::message::Notification;
use crate::transport::delivery::{DeliveryError, DeliveryTransport};

/// HTTP callback transport: POSTs each notification to the target's
/// per-connection management URL (`{base_url}/{connectionId}`).
///
/// The `reqwest::Client` is built once and shared; it pools connections
/// across deliveries.
#[derive(Debug, Clone)]
pub struct HttpCallback {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCallback {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, connection_id: &str) -> String {
        format!("{}/{}", self.base_url, connection_id)
    }
}

/// Map a callback response status onto the delivery failure taxonomy:
/// 2xx is a success, 404/410 mean the target connection no longer exists,
/// anything else is a transient transport failure.
pub(crate) fn classify_status(status: StatusCode) -> Result<(), DeliveryError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        Err(DeliveryError::Gone)
    } else {
        Err(DeliveryError::Transport(format!(
            "callback returned {status}"
        )))
    }
}

#[async_trait]
impl DeliveryTransport for HttpCallback {
    async fn send(
        &self,
        connection_id: &str,
        notification: &Notification,
    ) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.endpoint(connection_id))
            .json(notification)
            .send()
            .await;
        match response {
            Ok(r) => classify_status(r.status()),
            Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                Err(DeliveryError::Transport(e.to_string()))
            }
            Err(e) => Err(DeliveryError::Unknown(e.to_string())),
        }
    }
}
