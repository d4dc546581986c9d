mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{
    ApiSettings, BrokerSettings, DeliveryMode, DeliverySettings, ServerSettings, Settings,
    StoreSettings,
};

/// Loads the configuration from the default file and environment variables.
/// Merges the configuration with default values and validates the result;
/// a structurally invalid configuration (callback mode without a callback
/// URL) fails here, before any event is processed.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("__"));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    let merged = Settings::merged(partial);
    merged.validate()?;
    Ok(merged)
}

#[cfg(test)]
mod tests;
