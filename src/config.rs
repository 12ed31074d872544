//! # Configuration
//!
//! Layered application configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults ([`AppConfig::default`])
//! 2. An optional TOML file
//! 3. Environment variables prefixed `AGRI`, nested with `__`
//!    (`AGRI__SETTLEMENT__FEE_RATE=0.04`)
//!
//! A `.env` file in the working directory is loaded before the environment
//! is read.
//!
//! # Examples
//!
//! ```
//! use agri_contracts::config::AppConfig;
//!
//! let config = AppConfig::from_toml_str("[settlement]\ncurrency = \"eur\"\n").unwrap();
//! assert_eq!(config.settlement.currency, "eur");
//! assert_eq!(config.settlement.fee_rate.to_string(), "0.05");
//! ```

use crate::application::services::{CollaboratorPolicy, SettlementPolicy};
use crate::domain::services::FeeSchedule;
use crate::domain::value_objects::{FeeRate, Rounding};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AGRI";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Fee and payout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Platform fee rate in `[0, 1)`.
    pub fee_rate: Decimal,
    /// Rounding applied to the fee.
    pub rounding: Rounding,
    /// Payout currency code.
    pub currency: String,
    /// Upper bound on a single payout issuance call.
    pub issuance_timeout_ms: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            fee_rate: FeeRate::default().as_decimal(),
            rounding: Rounding::HalfUp,
            currency: "usd".to_string(),
            issuance_timeout_ms: 10_000,
        }
    }
}

/// Timeouts for the party directory and notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorConfig {
    /// Upper bound on a single directory lookup.
    pub lookup_timeout_ms: u64,
    /// Upper bound on a single notification delivery.
    pub notify_timeout_ms: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 2_000,
            notify_timeout_ms: 5_000,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Include the event target.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            with_target: true,
        }
    }
}

/// HTTP payment processor settings.
///
/// When `base_url` is unset the in-memory issuer is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentGatewayConfig {
    /// Processor API root, e.g. `https://payments.example.com`.
    pub base_url: Option<String>,
    /// Bearer token.
    pub api_key: Option<String>,
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fee and payout settings.
    pub settlement: SettlementConfig,
    /// Collaborator timeouts.
    pub collaborators: CollaboratorConfig,
    /// Log output.
    pub logging: LoggingConfig,
    /// Payment processor.
    pub payment_gateway: PaymentGatewayConfig,
}

impl AppConfig {
    /// Loads configuration from defaults, an optional file, and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source fails to parse or validation fails.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();

        let mut builder = Self::builder_with_defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        info!(
            fee_rate = %config.settlement.fee_rate,
            currency = %config.settlement.currency,
            http_gateway = config.payment_gateway.base_url.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Loads configuration from defaults overlaid with a TOML document.
    ///
    /// The environment is not consulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the document fails to parse or validation
    /// fails.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = Self::builder_with_defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder().add_source(Config::try_from(&Self::default())?))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fee_schedule()?;
        if self.settlement.currency.trim().is_empty() {
            return Err(ConfigError::invalid("settlement.currency must not be empty"));
        }
        let timeouts = [
            ("settlement.issuance_timeout_ms", self.settlement.issuance_timeout_ms),
            ("collaborators.lookup_timeout_ms", self.collaborators.lookup_timeout_ms),
            ("collaborators.notify_timeout_ms", self.collaborators.notify_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::invalid(format!("{name} must be positive")));
            }
        }
        if let Some(url) = &self.payment_gateway.base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::invalid(format!(
                "payment_gateway.base_url '{url}' must be an http(s) URL"
            )));
        }
        Ok(())
    }

    /// Returns the fee schedule.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the fee rate is out of range.
    pub fn fee_schedule(&self) -> Result<FeeSchedule, ConfigError> {
        let rate = FeeRate::new(self.settlement.fee_rate)
            .map_err(|e| ConfigError::invalid(format!("settlement.fee_rate: {e}")))?;
        Ok(FeeSchedule::new(rate, self.settlement.rounding))
    }

    /// Returns the settlement policy.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the fee rate is out of range.
    pub fn settlement_policy(&self) -> Result<SettlementPolicy, ConfigError> {
        Ok(SettlementPolicy {
            fees: self.fee_schedule()?,
            currency: self.settlement.currency.trim().to_ascii_lowercase(),
            issuance_timeout: Duration::from_millis(self.settlement.issuance_timeout_ms),
        })
    }

    /// Returns the collaborator timeouts.
    #[must_use]
    pub fn collaborator_policy(&self) -> CollaboratorPolicy {
        CollaboratorPolicy {
            lookup_timeout: Duration::from_millis(self.collaborators.lookup_timeout_ms),
            notify_timeout: Duration::from_millis(self.collaborators.notify_timeout_ms),
        }
    }
}
