use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;

use emi_core::emi::EmiLimits;
use emi_core::Currency;

use crate::input::file::resolve_path;
use crate::OutputFormat;

/// Environment variable naming a config file when `--config` is absent
pub const CONFIG_ENV: &str = "EMI_CONFIG";

/// Settings read from an optional TOML file. Command-line flags take precedence.
///
/// ```toml
/// currency = "INR"
/// output = "table"
///
/// [limits]
/// max_annual_rate_percent = "50"
/// max_tenure_months = 600
/// max_principal = "1000000000000000"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub currency: Option<String>,
    pub output: Option<String>,
    pub limits: EmiLimits,
}

impl CliConfig {
    pub fn from_toml(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: CliConfig = toml::from_str(contents)?;
        config.output_format()?;
        Ok(config)
    }

    pub fn output_format(&self) -> Result<Option<OutputFormat>, Box<dyn std::error::Error>> {
        match &self.output {
            Some(name) => OutputFormat::from_str(name, true)
                .map(Some)
                .map_err(|e| format!("Invalid output format '{name}' in config: {e}").into()),
            None => Ok(None),
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
            .as_deref()
            .map(Currency::from_code)
            .unwrap_or_default()
    }
}

/// Load configuration from `path`, else from `$EMI_CONFIG`, else built-in defaults.
pub fn load(path: Option<&str>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let from_env = std::env::var(CONFIG_ENV).ok();
    let Some(path) = path.or(from_env.as_deref()) else {
        tracing::debug!("no config file; using defaults");
        return Ok(CliConfig::default());
    };

    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let config = CliConfig::from_toml(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    tracing::info!(path = %canonical.display(), "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CliConfig::from_toml("").unwrap();
        assert_eq!(config.limits, EmiLimits::default());
        assert_eq!(config.currency(), Currency::INR);
        assert!(config.output_format().unwrap().is_none());
    }

    #[test]
    fn test_full_config() {
        let config = CliConfig::from_toml(
            r#"
            currency = "usd"
            output = "Table"

            [limits]
            max_annual_rate_percent = "36"
            max_tenure_months = 360
            "#,
        )
        .unwrap();
        assert_eq!(config.currency(), Currency::USD);
        assert!(matches!(
            config.output_format().unwrap(),
            Some(OutputFormat::Table)
        ));
        assert_eq!(config.limits.max_annual_rate_percent, dec!(36));
        assert_eq!(config.limits.max_tenure_months, 360);
    }

    #[test]
    fn test_partial_limits_keep_other_default() {
        let config = CliConfig::from_toml("[limits]\nmax_tenure_months = 84\n").unwrap();
        assert_eq!(config.limits.max_tenure_months, 84);
        assert_eq!(config.limits.max_annual_rate_percent, dec!(50));
        assert_eq!(config.limits.max_principal, EmiLimits::default().max_principal);
    }

    #[test]
    fn test_bad_output_rejected() {
        assert!(CliConfig::from_toml("output = \"xml\"").is_err());
    }
}
