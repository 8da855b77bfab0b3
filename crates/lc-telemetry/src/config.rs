//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every event
    pub service_name: String,

    /// Filter directive (`info`, `lc_light_client=debug`, ...)
    pub log_level: String,

    /// Emit JSON lines instead of human-readable text
    pub json_logs: bool,

    /// Include the event target
    pub with_target: bool,

    /// Include thread ids
    pub with_thread_ids: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "light-client".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_target: true,
            with_thread_ids: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LC_SERVICE_NAME`: Service name (default: light-client)
    /// - `LC_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `LC_JSON_LOGS`: JSON output (default: false, true in containers)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("LC_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("LC_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: lookup("LC_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            ..defaults
        }
    }
}
