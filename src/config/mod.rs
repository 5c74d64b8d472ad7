//! Application configuration module
//!
//! Configuration is read from environment variables with the `ROOMCAST`
//! prefix; nested values use `__` as separator. Every value has a default,
//! so an empty environment yields a runnable development server.
//!
//! # Example
//!
//! ```no_run
//! use roomcast::config::RoomcastConfig;
//!
//! let config = RoomcastConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod rooms;
mod server;

pub use error::{ConfigError, ValidationError};
pub use rooms::RoomsConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomcastConfig {
    /// Server configuration (host, port, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Room tuning (formats, buffers, hibernation, attachments)
    #[serde(default)]
    pub rooms: RoomsConfig,
}

impl RoomcastConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `ROOMCAST__*` variables:
    ///
    /// - `ROOMCAST__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ROOMCAST__ROOMS__DEFAULT_FORMAT=msgpack` -> `rooms.default_format`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ROOMCAST")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.rooms.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::protocol::WireFormat;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "ROOMCAST__SERVER__PORT",
        "ROOMCAST__SERVER__ENVIRONMENT",
        "ROOMCAST__SERVER__LOG_JSON",
        "ROOMCAST__ROOMS__DEFAULT_FORMAT",
        "ROOMCAST__ROOMS__IDLE_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = RoomcastConfig::load().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rooms.default_format, WireFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ROOMCAST__SERVER__PORT", "3000");
        env::set_var("ROOMCAST__SERVER__LOG_JSON", "true");
        env::set_var("ROOMCAST__ROOMS__DEFAULT_FORMAT", "msgpack");
        env::set_var("ROOMCAST__ROOMS__IDLE_TIMEOUT_SECS", "0");
        let result = RoomcastConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.server.log_json);
        assert_eq!(config.rooms.default_format, WireFormat::MsgPack);
        assert_eq!(config.rooms.idle_timeout(), None);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ROOMCAST__SERVER__ENVIRONMENT", "production");
        let result = RoomcastConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_unparseable_value_is_load_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ROOMCAST__SERVER__PORT", "not-a-port");
        let result = RoomcastConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
