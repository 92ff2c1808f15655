//! Configuration loading from environment.

use billing_types::AccountId;
use billing_types::domain::DEFAULT_DATE_FORMAT;

/// Log output format for the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("Unknown LOG_FORMAT: {} (expected text or json)", other),
        }
    }
}

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub account_id: AccountId,
    pub date_format: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration through `get`, which maps a variable name to its
    /// value.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let account_id = get("BILLING_ACCOUNT_ID")
            .ok_or_else(|| anyhow::anyhow!("BILLING_ACCOUNT_ID environment variable is required"))?
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid BILLING_ACCOUNT_ID: {}", e))?;

        let date_format = get("BILLING_DATE_FORMAT")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());

        let log_format = get("LOG_FORMAT").unwrap_or_default().parse()?;

        Ok(Self {
            database_url,
            account_id,
            date_format,
            log_format,
        })
    }
}
