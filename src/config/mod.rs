//! Configuration management

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub telephony: TelephonyConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelephonyConfig {
    /// JSON-RPC endpoint of the voice provider.
    pub endpoint: String,
    /// Per-call bound applied by the dispatcher.
    pub call_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the retry pass from within this process. Disable when an external
    /// cron drives POST /scheduler/run instead.
    pub enabled: bool,
    pub interval_secs: u64,
    pub concurrency: usize,
    pub batch_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            telephony: TelephonyConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://postgres@localhost/outdial".to_string(),
        }
    }
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:7070".to_string(),
            call_timeout_secs: 300,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300,
            concurrency: 4,
            batch_limit: 500,
        }
    }
}

impl Config {
    /// Load from `outdial.toml` (optional) with `OUTDIAL_*` environment
    /// overrides, e.g. `OUTDIAL_SERVER__PORT=9090`.
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("outdial").required(false))
            .add_source(config::Environment::with_prefix("OUTDIAL").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
