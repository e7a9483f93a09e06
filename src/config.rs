//! Configuration management for the ledger submitter
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "LEDGER_SUBMITTER_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub node: NodeConfig,
    pub transaction: TransactionConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// REST base URLs, first is primary
    pub rest_urls: Vec<String>,
    /// Absent on networks without a faucet
    pub faucet_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rest_urls: vec!["http://localhost:8080/v1".to_string()],
            faucet_url: Some("http://localhost:8081".to_string()),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    /// Seconds from construction until the transaction expires
    pub expiration_secs: u64,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_gas_amount: 1_000,
            gas_unit_price: 1,
            expiration_secs: 10,
            confirmation_timeout_secs: 30,
            poll_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9184,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Environment variable holding the hex private key served by the wallet bridge
    pub private_key_env: Option<String>,
}

impl Settings {
    /// Load settings from `$LEDGER_SUBMITTER_CONFIG` or `config/default.toml`
    pub fn load() -> Result<Self> {
        let config_path = env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.node.rest_urls.is_empty() {
            anyhow::bail!("At least one ledger REST URL must be configured");
        }

        for url in &self.node.rest_urls {
            url::Url::parse(url).with_context(|| format!("Invalid ledger REST URL: {}", url))?;
        }

        match &self.node.faucet_url {
            Some(url) => {
                url::Url::parse(url).with_context(|| format!("Invalid faucet URL: {}", url))?;
            }
            None => tracing::warn!("No faucet URL configured - funding is unavailable"),
        }

        if self.transaction.max_gas_amount == 0 {
            anyhow::bail!("transaction.max_gas_amount must be positive");
        }
        if self.transaction.expiration_secs == 0 {
            anyhow::bail!("transaction.expiration_secs must be positive");
        }
        if self.transaction.poll_interval_ms == 0 {
            anyhow::bail!("transaction.poll_interval_ms must be positive");
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    lazy_static::lazy_static! {
        static ref ENV_VAR: regex::Regex = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    }

    ENV_VAR
        .replace_all(input, |caps: &regex::Captures| {
            env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}
