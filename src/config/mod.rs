//! Application configuration loaded from billing.toml
//!
//! Every setting has a default, so a missing file is not an error. The
//! `DATABASE_URL` environment variable takes precedence over the file.

/// Database connection and schema bootstrap
pub mod database;

use crate::core::pricing::PricingTable;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Database used when neither the environment nor the config file names one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/billing.sqlite?mode=rwc";

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "billing.toml";

/// Settings read from billing.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Database connection string
    pub database_url: Option<String>,
    /// Seconds between overdue scans; 0 runs a single scan and exits
    #[serde(default)]
    pub reconcile_interval_secs: u64,
    /// Tuition table; the built-in table is used when absent
    pub pricing: Option<PricingTable>,
}

impl AppConfig {
    /// Resolves the database URL: environment, then file, then default.
    #[must_use]
    pub fn database_url(&self) -> String {
        self.resolve_database_url(std::env::var("DATABASE_URL").ok())
    }

    fn resolve_database_url(&self, from_env: Option<String>) -> String {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.database_url.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }

    /// The configured pricing table, or the built-in one.
    #[must_use]
    pub fn pricing_table(&self) -> PricingTable {
        self.pricing.clone().unwrap_or_default()
    }
}

/// Loads the configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the billing.toml file
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or is not valid TOML
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse billing.toml: {e}"),
    })
}

/// Loads ./billing.toml, falling back to defaults when the file does not exist.
pub fn load_default_config() -> Result<AppConfig> {
    load_config_or_default(DEFAULT_CONFIG_PATH)
}

/// Loads a config file, falling back to defaults when it does not exist.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if path.exists() {
        let config = load_config(path)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::pricing::{CourseLevel, CoursePeriod, Quote};
    use crate::entities::InvoiceType;

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
            database_url = "sqlite::memory:"
            reconcile_interval_secs = 3600

            [pricing.MESTRADO]
            LABORAL = 6000.0
            "#,
        )
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.reconcile_interval_secs, 3600);
        assert_eq!(
            config.pricing_table().quote(
                InvoiceType::Mensalidade,
                CourseLevel::Mestrado,
                CoursePeriod::Laboral
            ),
            Quote::Listed(6000.0)
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert!(config.database_url.is_none());
        assert_eq!(config.reconcile_interval_secs, 0);
        assert_eq!(config.pricing_table(), PricingTable::default());
        assert_eq!(config.resolve_database_url(None), DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_env_url_overrides_file() {
        let config = AppConfig {
            database_url: Some("sqlite://from-file.sqlite".to_string()),
            ..Default::default()
        };

        assert_eq!(
            config.resolve_database_url(Some("sqlite://from-env.sqlite".to_string())),
            "sqlite://from-env.sqlite"
        );
        assert_eq!(
            config.resolve_database_url(Some(String::new())),
            "sqlite://from-file.sqlite"
        );
        assert_eq!(config.resolve_database_url(None), "sqlite://from-file.sqlite");
    }

    #[test]
    fn test_invalid_toml() {
        let result: std::result::Result<AppConfig, _> =
            toml::from_str("reconcile_interval_secs = \"soon\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config_or_default("does-not-exist/billing.toml").unwrap();
        assert!(config.database_url.is_none());

        let err = load_config("does-not-exist/billing.toml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
