//! # Telemetry
//!
//! Process-wide `tracing` subscriber setup.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from
//! [`LoggingConfig::level`]. JSON output is opt-in.

use crate::config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive did not parse.
    #[error("invalid log filter '{directive}': {message}")]
    InvalidFilter {
        /// Directive that failed.
        directive: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already initialised: {0}")]
    AlreadyInitialised(String),
}

/// Builds the filter for `config`, preferring `RUST_LOG`.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the configured level is not a
/// valid filter directive.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| TelemetryError::InvalidFilter {
            directive: config.level.clone(),
            message: e.to_string(),
        }),
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| TelemetryError::AlreadyInitialised(e.to_string()))
}
