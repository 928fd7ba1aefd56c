//! Engine configuration: TOML file, environment overrides, validation.
//!
//! Precedence (lowest to highest): built-in defaults, optional TOML file,
//! `RELIAFLEET_*` environment variables, CLI flags (applied in `main`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Configuration errors, surfaced at startup only.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime settings for the engine and its HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Address the report API binds to.
    pub listen_addr: String,
    /// Path to the JSON maintenance snapshot served by the demo binary.
    pub snapshot_path: PathBuf,
    /// Deadline for each individual store query, in seconds.
    pub query_timeout_secs: u64,
    /// Upper bound on concurrently in-flight sub-aggregations per report.
    pub max_concurrent_queries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            snapshot_path: PathBuf::from("data/snapshot.json"),
            query_timeout_secs: 10,
            max_concurrent_queries: 8,
        }
    }
}

impl EngineConfig {
    /// Load configuration: defaults, then the TOML file if given, then env.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let parsed: Self = toml::from_str(&raw)?;
                info!(path = %path.display(), "Loaded engine config");
                parsed
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `RELIAFLEET_*` environment overrides.
    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("RELIAFLEET_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Ok(path) = std::env::var("RELIAFLEET_SNAPSHOT_PATH") {
            self.snapshot_path = PathBuf::from(path);
        }
        if let Ok(secs) = std::env::var("RELIAFLEET_QUERY_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.query_timeout_secs = secs;
            }
        }
        if let Ok(n) = std::env::var("RELIAFLEET_MAX_CONCURRENT_QUERIES") {
            if let Ok(n) = n.parse() {
                self.max_concurrent_queries = n;
            }
        }
    }

    /// Reject configurations that would stall or serialize the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "query_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_queries == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_queries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}
