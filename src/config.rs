//! Configuration module
//!
//! Reads `config.toml` (default `~/.config/courier-billing/config.toml`,
//! overridable with `COURIER_BILLING_CONFIG`). A missing file yields the
//! defaults; a malformed one is an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::tax::TaxSettings;
use crate::shared::types::InfraError;
use crate::shared::utills::RetryConfig;
use crate::shared::validations::validate_input;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "COURIER_BILLING_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub billing: BillingConfig,
    pub logging: LoggingConfig,
}

/// Back-office endpoint and resolution fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BackendConfig {
    #[validate(url(message = "must be an absolute URL"))]
    pub base_url: String,
    #[validate(range(min = 1, max = 600, message = "must be between 1 and 600"))]
    pub timeout_secs: u64,
    /// Concurrent rate lookups per batch
    #[validate(range(min = 1, max = 64, message = "must be between 1 and 64"))]
    pub max_concurrency: usize,
    /// Attempts per rate lookup; only connection failures and timeouts are retried
    #[validate(range(min = 1, max = 10, message = "must be between 1 and 10"))]
    pub retry_attempts: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 30,
            max_concurrency: 8,
            retry_attempts: 2,
        }
    }
}

impl BackendConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_attempts(self.retry_attempts)
    }
}

/// Tax defaults for a new invoicing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BillingConfig {
    #[validate(range(min = 0.0, max = 100.0, message = "must be a percentage"))]
    pub cgst: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "must be a percentage"))]
    pub sgst: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "must be a percentage"))]
    pub igst: f64,
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub profit_percent: f64,
    pub include_gst: bool,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            cgst: 9.0,
            sgst: 9.0,
            igst: 0.0,
            profit_percent: 0.0,
            include_gst: false,
        }
    }
}

impl BillingConfig {
    /// IGST wins when both sides are configured.
    pub fn tax_settings(&self) -> TaxSettings {
        TaxSettings::from_rates(self.cgst, self.sgst, self.igst)
            .with_profit_percent(self.profit_percent)
            .with_include_gst(self.include_gst)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `courier_billing=debug`
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| InfraError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Write as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), InfraError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self).map_err(|e| InfraError::Config(e.to_string()))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Check value ranges of every section.
    pub fn validate(&self) -> Result<(), InfraError> {
        let sections = [
            ("backend", validate_input(&self.backend)),
            ("billing", validate_input(&self.billing)),
        ];
        let problems: Vec<String> = sections
            .into_iter()
            .filter_map(|(name, result)| result.err().map(|e| format!("[{}] {}", name, e)))
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(InfraError::Config(problems.join("; ")))
        }
    }
}

/// `~/.config/courier-billing/config.toml`, or `./config.toml` when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("courier-billing"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

/// Config path from [`CONFIG_ENV`], falling back to [`default_config_path`].
pub fn config_path_from_env() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Initialize tracing (logging) from the application config.
///
/// `RUST_LOG` takes precedence over `logging.level`. Call once at startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
