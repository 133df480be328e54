//! Application configuration loaded from environment variables.

use lifecycle::{LifecycleConfig, StatusPolicy};

use crate::DEFAULT_EVENT_BUFFER;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: Postgres connection string (unset: in-memory store)
/// - `API_KEY`: value required in the `x-api-key` header (unset: no check)
/// - `STATUS_POLICY`: `permissive` or `strict` (default: `permissive`)
/// - `EVENT_BUFFER`: events buffered per event subscriber (default: `256`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub status_policy: StatusPolicy,
    pub event_buffer: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: get("DATABASE_URL"),
            api_key: get("API_KEY"),
            status_policy: get("STATUS_POLICY")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.status_policy),
            event_buffer: get("EVENT_BUFFER")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.event_buffer),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the options handed to the lifecycle coordinator.
    pub fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig::default().with_status_policy(self.status_policy)
    }

    /// Returns the transport guard settings.
    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            api_key: self.api_key.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            api_key: None,
            status_policy: StatusPolicy::default(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// Settings of the API key guard on the order routes.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Required `x-api-key` value. None disables the check.
    pub api_key: Option<String>,
}

impl AuthConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    /// Returns true if a request presenting `presented` may proceed.
    pub fn permits(&self, presented: Option<&str>) -> bool {
        match &self.api_key {
            None => true,
            Some(expected) => presented == Some(expected.as_str()),
        }
    }
}
