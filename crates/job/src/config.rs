use std::path::{Path, PathBuf};
use std::time::Duration;

use collector::RetryPolicy;
use meter_core::Level;
use serde::Deserialize;

use crate::error::Result;

/// Runtime configuration, loaded from an optional TOML file. Every field has
/// a default, so an absent file or an empty one is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Query endpoint of the metrics source.
    pub metrics_url: String,
    pub db_path: PathBuf,
    /// Directory receiving the daily tick log files.
    pub log_dir: PathBuf,
    pub fetch_retries: u32,
    pub fetch_pause_secs: u64,
    /// Levels whose `Merged` rows are deleted each tick. Empty keeps the full
    /// audit trail at every level.
    pub purge_merged: Vec<Level>,
    pub port: u16,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            metrics_url: "http://prometheus-k8s.monitoring:9090/api/v1/query".to_string(),
            db_path: PathBuf::from("nsmeter.db"),
            log_dir: PathBuf::from("."),
            fetch_retries: 10,
            fetch_pause_secs: 5,
            purge_merged: Vec::new(),
            port: 8080,
        }
    }
}

impl MeterConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.fetch_retries,
            pause: Duration::from_secs(self.fetch_pause_secs),
        }
    }
}
