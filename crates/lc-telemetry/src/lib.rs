//! # LC Telemetry
//!
//! Logging bootstrap for the light client binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lc_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LC_SERVICE_NAME` | `light-client` | Service name in log events |
//! | `LC_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `LC_JSON_LOGS` | `false` (`true` in containers) | JSON line output |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber is already installed or could not be set.
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    /// The filter directive did not parse.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
