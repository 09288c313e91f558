use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::deserialize_duration;

fn default_etherscan_base_url() -> String {
    "https://api.etherscan.io/v2/api".to_string()
}

fn default_alphavantage_base_url() -> String {
    "https://www.alphavantage.co/query".to_string()
}

fn default_rentcast_base_url() -> String {
    "https://api.rentcast.io/v1".to_string()
}

/// Default deadline for one orchestration pass.
fn default_fetch_timeout() -> Duration {
    Duration::from_secs(60)
}

/// One property to value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyConfig {
    pub address: String,
    pub property_type: String,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_footage: u32,
}

/// Fetch-run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Deadline for one orchestration pass.
    #[serde(
        default = "default_fetch_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,

    /// Disable per-source rate budgets. Meant for tests and benchmarks
    /// hitting local mock servers; leave off against real providers.
    pub unlimited_rate: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_fetch_timeout(),
            unlimited_rate: false,
        }
    }
}

/// Application configuration.
///
/// API keys and base URLs can also come from the environment
/// (`ETHERSCAN_API_KEY`, `ETHERSCAN_BASE_URL`, ...); environment values
/// take precedence over the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub etherscan_api_key: String,
    pub alphavantage_api_key: String,
    pub rentcast_api_key: String,

    #[serde(default = "default_etherscan_base_url")]
    pub etherscan_base_url: String,

    #[serde(default = "default_alphavantage_base_url")]
    pub alphavantage_base_url: String,

    #[serde(default = "default_rentcast_base_url")]
    pub rentcast_base_url: String,

    /// Wallet addresses to value.
    pub ethereum_wallets: Vec<String>,

    /// Stock symbols to quote.
    pub stock_symbols: Vec<String>,

    /// Properties to value.
    pub properties: Vec<PropertyConfig>,

    /// Fetch-run settings.
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            etherscan_api_key: String::new(),
            alphavantage_api_key: String::new(),
            rentcast_api_key: String::new(),
            etherscan_base_url: default_etherscan_base_url(),
            alphavantage_base_url: default_alphavantage_base_url(),
            rentcast_base_url: default_rentcast_base_url(),
            ethereum_wallets: Vec::new(),
            stock_symbols: Vec::new(),
            properties: Vec::new(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a file, or start from defaults (plus environment
    /// overrides) if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 6] = [
            ("ETHERSCAN_API_KEY", &mut self.etherscan_api_key),
            ("ALPHAVANTAGE_API_KEY", &mut self.alphavantage_api_key),
            ("RENTCAST_API_KEY", &mut self.rentcast_api_key),
            ("ETHERSCAN_BASE_URL", &mut self.etherscan_base_url),
            ("ALPHAVANTAGE_BASE_URL", &mut self.alphavantage_base_url),
            ("RENTCAST_BASE_URL", &mut self.rentcast_base_url),
        ];

        for (name, field) in overrides {
            if let Ok(value) = std::env::var(name) {
                if !value.is_empty() {
                    *field = value;
                }
            }
        }
    }

    /// Check that every configured source has its API key.
    ///
    /// A key is only required when at least one unit of that source is
    /// configured; missing keys are reported together by their environment
    /// variable names.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if !self.ethereum_wallets.is_empty() && self.etherscan_api_key.is_empty() {
            missing.push("ETHERSCAN_API_KEY");
        }
        if !self.stock_symbols.is_empty() && self.alphavantage_api_key.is_empty() {
            missing.push("ALPHAVANTAGE_API_KEY");
        }
        if !self.properties.is_empty() && self.rentcast_api_key.is_empty() {
            missing.push("RENTCAST_API_KEY");
        }

        if !missing.is_empty() {
            bail!("missing required configuration: {}", missing.join(", "));
        }

        Ok(())
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./finfetch.toml` if it exists in the current directory
/// 2. `~/.local/share/finfetch/finfetch.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("finfetch.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("finfetch").join("finfetch.toml");
    }

    local_config
}
