use serial_test::serial;

use super::load_config;
use super::settings::{
    PartialBindSettings, PartialDeliverySettings, PartialSettings, Settings,
};
use crate::config::DeliveryMode;

fn empty_partial() -> PartialSettings {
    PartialSettings {
        log_level: None,
        server: None,
        api: None,
        store: None,
        delivery: None,
        broker: None,
    }
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.log_level, "info");
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.api.port, 8081);
    assert_eq!(settings.store.path, "notihub_db");
    assert_eq!(settings.delivery.mode, DeliveryMode::Push);
    assert_eq!(settings.delivery.timeout_ms, 3000);
    assert!(settings.delivery.callback_url.is_none());
    assert!(settings.broker.default_subscriptions.is_empty());
}

#[test]
fn test_merged_empty_partial_equals_defaults() {
    let merged = Settings::merged(empty_partial());
    assert_eq!(merged.server.port, Settings::default().server.port);
    assert_eq!(merged.delivery.timeout_ms, Settings::default().delivery.timeout_ms);
}

#[test]
fn test_merged_partial_overrides_defaults() {
    let partial = PartialSettings {
        server: Some(PartialBindSettings {
            host: None,
            port: Some(9000),
        }),
        delivery: Some(PartialDeliverySettings {
            mode: Some(DeliveryMode::Callback),
            timeout_ms: None,
            callback_url: Some("http://gateway.internal/connections".to_string()),
        }),
        ..empty_partial()
    };

    let merged = Settings::merged(partial);
    assert_eq!(merged.server.port, 9000);
    assert_eq!(merged.server.host, "127.0.0.1");
    assert_eq!(merged.delivery.mode, DeliveryMode::Callback);
    assert_eq!(merged.delivery.timeout_ms, 3000);
    assert_eq!(
        merged.delivery.callback_url.as_deref(),
        Some("http://gateway.internal/connections")
    );
}

#[test]
fn test_validate_rejects_callback_mode_without_url() {
    let mut settings = Settings::default();
    settings.delivery.mode = DeliveryMode::Callback;
    assert!(settings.validate().is_err());

    settings.delivery.callback_url = Some("http://gateway.internal/connections".to_string());
    assert!(settings.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_timeout() {
    let mut settings = Settings::default();
    settings.delivery.timeout_ms = 0;
    assert!(settings.validate().is_err());
}

#[test]
#[serial]
fn test_env_overrides_settings() {
    temp_env::with_vars(
        [
            ("SERVER__PORT", Some("9999")),
            ("LOG_LEVEL", Some("debug")),
        ],
        || {
            let settings = load_config().unwrap();
            assert_eq!(settings.server.port, 9999);
            assert_eq!(settings.log_level, "debug");
        },
    );
}

#[test]
#[serial]
fn test_load_config_without_env_uses_defaults() {
    temp_env::with_vars(
        [("SERVER__PORT", None::<&str>), ("LOG_LEVEL", None)],
        || {
            let settings = load_config().unwrap();
            assert_eq!(settings.server.port, 8080);
            assert_eq!(settings.delivery.mode, DeliveryMode::Push);
        },
    );
}
