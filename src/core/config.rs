use crate::core::period::PeriodToken;
use crate::core::transaction::{DEFAULT_EXPENSE_CATEGORIES, DEFAULT_INCOME_CATEGORIES};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RateSourceKind {
    ExchangeRateApi,
    Frankfurter,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RateSourceConfig {
    pub kind: RateSourceKind,
    pub base_url: String,
}

fn default_sources() -> Vec<RateSourceConfig> {
    vec![
        RateSourceConfig {
            kind: RateSourceKind::ExchangeRateApi,
            base_url: "https://api.exchangerate-api.com".to_string(),
        },
        RateSourceConfig {
            kind: RateSourceKind::Frankfurter,
            base_url: "https://api.frankfurter.app".to_string(),
        },
    ]
}

fn default_cache_ttl_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retry_delay_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RatesConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_sources")]
    pub sources: Vec<RateSourceConfig>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            cache_ttl_secs: default_cache_ttl_secs(),
            timeout_secs: default_timeout_secs(),
            retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
            sources: default_sources(),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn default_income_categories() -> Vec<String> {
    to_strings(DEFAULT_INCOME_CATEGORIES)
}

fn default_expense_categories() -> Vec<String> {
    to_strings(DEFAULT_EXPENSE_CATEGORIES)
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CategoriesConfig {
    #[serde(default = "default_income_categories")]
    pub income: Vec<String>,
    #[serde(default = "default_expense_categories")]
    pub expense: Vec<String>,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        CategoriesConfig {
            income: default_income_categories(),
            expense: default_expense_categories(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub default_period: PeriodToken,
    pub data_path: Option<String>,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub categories: CategoriesConfig,
}

impl AppConfig {
    /// Loads the config from the default location, or the built-in defaults if none exists.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
default_period: quarter
data_path: "/tmp/fintrack"
rates:
  cache_ttl_secs: 60
  timeout_secs: 5
  retries: 2
  sources:
    - kind: frankfurter
      base_url: "http://example.com/frankfurter"
categories:
  income: ["Salary", "Freelance"]
  expense: ["Rent", "Food"]
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.default_period, PeriodToken::Quarter);
        assert_eq!(config.data_path.as_deref(), Some("/tmp/fintrack"));
        assert_eq!(config.rates.cache_ttl_secs, 60);
        assert_eq!(config.rates.timeout_secs, 5);
        assert_eq!(config.rates.retries, 2);
        assert_eq!(config.rates.retry_delay_ms, 500);
        assert_eq!(config.rates.sources.len(), 1);
        assert_eq!(config.rates.sources[0].kind, RateSourceKind::Frankfurter);
        assert_eq!(
            config.rates.sources[0].base_url,
            "http://example.com/frankfurter"
        );
        assert_eq!(config.categories.income, vec!["Salary", "Freelance"]);
        assert_eq!(config.categories.expense, vec!["Rent", "Food"]);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/fintrack")
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.default_period, PeriodToken::Month);
        assert_eq!(config.rates.cache_ttl_secs, 30);
        assert_eq!(config.rates.timeout_secs, 10);
        assert_eq!(config.rates.sources[0].kind, RateSourceKind::ExchangeRateApi);
        assert_eq!(config.rates.sources[1].kind, RateSourceKind::Frankfurter);
        assert_eq!(config.categories.expense.len(), 6);
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load_from_path(dir.path().join("missing.yaml"));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
