use config::ConfigError;
use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub log_level: String,
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub store: StoreSettings,
    pub delivery: DeliverySettings,
    pub broker: BrokerSettings,
}

/// WebSocket gateway bind address.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Publish/health HTTP API bind address.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

/// Connection registry storage.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub path: String,
}

/// Delivery transport selection and per-delivery bounds.
#[derive(Debug, Deserialize, Clone)]
pub struct DeliverySettings {
    pub mode: DeliveryMode,
    pub timeout_ms: u64,
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Push through the gateway's own connection channels.
    Push,
    /// POST to a per-connection management URL.
    Callback,
}

/// Broker policy knobs.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    /// Topics every new connection starts subscribed to. Empty by default:
    /// broadcast topics are ordinary topics clients subscribe to explicitly.
    pub default_subscriptions: Vec<String>,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub log_level: Option<String>,
    pub server: Option<PartialBindSettings>,
    pub api: Option<PartialBindSettings>,
    pub store: Option<PartialStoreSettings>,
    pub delivery: Option<PartialDeliverySettings>,
    pub broker: Option<PartialBrokerSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBindSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialStoreSettings {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialDeliverySettings {
    pub mode: Option<DeliveryMode>,
    pub timeout_ms: Option<u64>,
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub default_subscriptions: Option<Vec<String>>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            api: ApiSettings {
                host: "127.0.0.1".to_string(),
                port: 8081,
            },
            store: StoreSettings {
                path: "notihub_db".to_string(),
            },
            delivery: DeliverySettings {
                mode: DeliveryMode::Push,
                timeout_ms: 3000,
                callback_url: None,
            },
            broker: BrokerSettings {
                default_subscriptions: Vec::new(),
            },
        }
    }
}

impl Settings {
    /// Fill in every field missing from `partial` with its default value.
    pub fn merged(partial: PartialSettings) -> Self {
        let default = Settings::default();

        Settings {
            log_level: partial.log_level.unwrap_or(default.log_level),
            server: ServerSettings {
                host: partial
                    .server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: partial
                    .server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
            },
            api: ApiSettings {
                host: partial
                    .api
                    .as_ref()
                    .and_then(|a| a.host.clone())
                    .unwrap_or(default.api.host),
                port: partial
                    .api
                    .as_ref()
                    .and_then(|a| a.port)
                    .unwrap_or(default.api.port),
            },
            store: StoreSettings {
                path: partial
                    .store
                    .as_ref()
                    .and_then(|s| s.path.clone())
                    .unwrap_or(default.store.path),
            },
            delivery: DeliverySettings {
                mode: partial
                    .delivery
                    .as_ref()
                    .and_then(|d| d.mode)
                    .unwrap_or(default.delivery.mode),
                timeout_ms: partial
                    .delivery
                    .as_ref()
                    .and_then(|d| d.timeout_ms)
                    .unwrap_or(default.delivery.timeout_ms),
                callback_url: partial
                    .delivery
                    .as_ref()
                    .and_then(|d| d.callback_url.clone())
                    .or(default.delivery.callback_url),
            },
            broker: BrokerSettings {
                default_subscriptions: partial
                    .broker
                    .and_then(|b| b.default_subscriptions)
                    .unwrap_or(default.broker.default_subscriptions),
            },
        }
    }

    /// Reject structural misconfiguration before startup proceeds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delivery.mode == DeliveryMode::Callback && self.delivery.callback_url.is_none() {
            return Err(ConfigError::Message(
                "delivery.callback_url is required when delivery.mode is \"callback\"".to_string(),
            ));
        }
        if self.delivery.timeout_ms == 0 {
            return Err(ConfigError::Message(
                "delivery.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
