//! Configuration resolution for wallink.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config_dir>/wallink/settings.json`)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

/// Complete wallink configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub wallet: WalletConfig,
    pub dapp: DappConfig,
    pub attempt: AttemptConfig,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wallet: WalletConfig::default(),
            dapp: DappConfig::default(),
            attempt: AttemptConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Where the wallet's universal-link endpoints live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Base endpoint; action segments such as `connect` are appended to it.
    pub base_url: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            base_url: "https://phantom.app/ul/v1/".to_string(),
        }
    }
}

/// How this dapp identifies itself to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DappConfig {
    /// Target network, e.g. `devnet` or `mainnet-beta`.
    pub cluster: String,
    /// Origin the wallet shows to the user.
    pub app_url: String,
    /// Deep link the wallet redirects back to after `connect`.
    pub redirect_link: String,
    /// Path segment that marks a redirect as a connect response.
    pub response_path: String,
}

impl Default for DappConfig {
    fn default() -> Self {
        Self {
            cluster: "devnet".to_string(),
            app_url: "https://phantom.app".to_string(),
            redirect_link: "wallink://onConnect".to_string(),
            response_path: "onConnect".to_string(),
        }
    }
}

/// Connection attempt policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttemptConfig {
    /// Abandon an attempt whose redirect arrives later than this. `None`
    /// waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl AttemptConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Check that every URL parses and required fields are present.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.wallet.base_url)
            .map_err(|e| Error::Config(format!("wallet.base_url: {e}")))?;
        Url::parse(&self.dapp.app_url).map_err(|e| Error::Config(format!("dapp.app_url: {e}")))?;
        Url::parse(&self.dapp.redirect_link)
            .map_err(|e| Error::Config(format!("dapp.redirect_link: {e}")))?;
        if self.dapp.cluster.trim().is_empty() {
            return Err(Error::Config("dapp.cluster must not be empty".into()));
        }
        if self.dapp.response_path.trim().is_empty() {
            return Err(Error::Config("dapp.response_path must not be empty".into()));
        }
        Ok(())
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let global = global_config_path().filter(|p| p.exists());
    let mut config = load_layered(global.as_deref(), explicit)?;
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wallink").join("settings.json"))
}

/// Overlay each file present onto the defaults; a later file only replaces
/// the keys it actually sets.
fn load_layered(global: Option<&Path>, explicit: Option<&Path>) -> Result<Config> {
    let mut merged = serde_json::to_value(Config::default())?;
    for path in [global, explicit].into_iter().flatten() {
        merge_json(&mut merged, read_config_value(path)?);
    }
    serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))
}

fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn read_config_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    if !value.is_object() {
        return Err(Error::Config(format!(
            "Config file {} must contain a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(val) = lookup("WALLINK_BASE_URL") {
        config.wallet.base_url = val;
    }
    if let Some(val) = lookup("WALLINK_CLUSTER") {
        config.dapp.cluster = val;
    }
    if let Some(val) = lookup("WALLINK_APP_URL") {
        config.dapp.app_url = val;
    }
    if let Some(val) = lookup("WALLINK_REDIRECT_LINK") {
        config.dapp.redirect_link = val;
    }
    if let Some(val) = lookup("WALLINK_RESPONSE_PATH") {
        config.dapp.response_path = val;
    }
    if let Some(val) = lookup("WALLINK_ATTEMPT_TIMEOUT_SECS") {
        let secs = val.trim().parse().map_err(|e| {
            Error::Config(format!("WALLINK_ATTEMPT_TIMEOUT_SECS={val:?}: {e}"))
        })?;
        config.attempt.timeout_secs = Some(secs);
    }
    if let Some(val) = lookup("WALLINK_LOG_LEVEL") {
        config.log_level = val;
    }
    Ok(())
}
