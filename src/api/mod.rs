//! HTTP API for internal publishers.
//!
//! `POST /publish` triggers a fan-out and always answers HTTP 200: delivery
//! failures are reported in the body, never via the status line. `GET
//! /health` reports liveness and the current registry size.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::broker::Broker;
use crate::broker::message::{DeliveryOutcome, Notification};

#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<Broker>,
}

/// Fan-out summary returned to the publisher.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub subscription_type: String,
    pub resolved: usize,
    pub delivered: usize,
    pub failed: usize,
    pub outcomes: Vec<DeliveryOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

impl PublishResponse {
    fn from_outcomes(subscription_type: String, outcomes: Vec<DeliveryOutcome>) -> Self {
        let delivered = outcomes.iter().filter(|o| o.delivered).count();
        Self {
            subscription_type,
            resolved: outcomes.len(),
            delivered,
            failed: outcomes.len() - delivered,
            outcomes,
            error: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    fn rejected(subscription_type: String, error: String) -> Self {
        Self {
            subscription_type,
            resolved: 0,
            delivered: 0,
            failed: 0,
            outcomes: Vec::new(),
            error: Some(error),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub timestamp: i64,
}

/// Build the Axum router with all routes.
pub fn router(broker: Arc<Broker>) -> Router {
    Router::new()
        .route("/publish", post(publish_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { broker })
}

pub async fn serve(addr: &str, broker: Arc<Broker>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "publish api listening");
    axum::serve(listener, router(broker)).await
}

/// POST /publish
async fn publish_handler(
    State(state): State<AppState>,
    Json(request): Json<Notification>,
) -> Json<PublishResponse> {
    match state.broker.publish(&request).await {
        Ok(outcomes) => Json(PublishResponse::from_outcomes(
            request.subscription_type,
            outcomes,
        )),
        Err(e) => {
            error!(topic = %request.subscription_type, error = %e, "publish rejected");
            Json(PublishResponse::rejected(
                request.subscription_type,
                e.to_string(),
            ))
        }
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.broker.connection_count(),
        timestamp: Utc::now().timestamp_millis(),
    })
}

#[cfg(test)]
mod tests;
