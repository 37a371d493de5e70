use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "HTTPFROMTCP_CONFIG";
/// Environment variable overriding the listen address.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// Deadline for receiving a complete request head. `None` waits forever.
    pub read_timeout_secs: Option<u64>,
    /// Largest request head accepted before answering with a 500. `None` is unbounded.
    pub max_head_bytes: Option<usize>,
    pub accept_backoff: BackoffConfig,
}

/// Delay applied between failed `accept` calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub max_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:42069".to_string(),
            read_timeout_secs: Some(30),
            max_head_bytes: Some(64 * 1024),
            accept_backoff: BackoffConfig::default(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 10,
            max_ms: 1000,
        }
    }
}

impl Config {
    /// Loads the config file named by `HTTPFROMTCP_CONFIG` when set, then
    /// applies the `LISTEN` override.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            cfg.listen_addr = listen_addr;
        }
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}
