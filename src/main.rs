use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use notihub::api;
use notihub::broker::Broker;
use notihub::config::{DeliveryMode, load_config};
use notihub::registry::ConnectionStore;
use notihub::transport::callback::HttpCallback;
use notihub::transport::delivery::DeliveryTransport;
use notihub::transport::gateway::{GatewayPush, start_gateway};
use notihub::utils::logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let settings = load_config().expect("Failed to load configuration");
    logging::init(&settings.log_level);

    let store =
        ConnectionStore::open(&settings.store.path).expect("Failed to open connection store");

    let push = Arc::new(GatewayPush::new());
    let transport: Arc<dyn DeliveryTransport> = match settings.delivery.mode {
        DeliveryMode::Push => push.clone(),
        DeliveryMode::Callback => {
            // Presence is validated by load_config.
            let url = settings
                .delivery
                .callback_url
                .as_deref()
                .expect("delivery.callback_url is required in callback mode");
            Arc::new(HttpCallback::new(url))
        }
    };

    let broker = Arc::new(Broker::new(
        store,
        transport,
        Duration::from_millis(settings.delivery.timeout_ms),
        settings.broker.default_subscriptions.clone(),
    ));

    let gateway_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let api_addr = format!("{}:{}", settings.api.host, settings.api.port);
    info!(mode = ?settings.delivery.mode, "starting notihub");

    tokio::try_join!(
        start_gateway(&gateway_addr, broker.clone(), push),
        api::serve(&api_addr, broker.clone()),
    )
    .expect("server terminated");
}
