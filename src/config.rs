//! Configuration management for procsnap.
//!
//! Handles loading, merging, and validating configuration from a TOML file
//! and CLI arguments. Precedence: CLI > config file > built-in defaults.

use crate::cli::{Args, LogLevel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, Level};

// Default configuration constants
pub const DEFAULT_MAX_RESULTS: i64 = 50;
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;
pub const DEFAULT_SYSTEM_CPU_INTERVAL_MS: u64 = 500;
pub const DEFAULT_PER_CORE_INTERVAL_MS: u64 = 100;
pub const DEFAULT_KILL_TIMEOUT_SECS: u64 = 3;

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum group representatives to return; <= 0 means unlimited.
    pub max_results: Option<i64>,

    /// Wall-clock gap between the priming and measurement CPU passes.
    #[serde(alias = "sample-interval-ms")]
    pub sample_interval_ms: Option<u64>,

    /// Sampling window for the system-wide CPU percent (coarser than the
    /// per-process interval, for stability).
    #[serde(alias = "system-cpu-interval-ms")]
    pub system_cpu_interval_ms: Option<u64>,

    /// Sampling window for the per-core CPU breakdown.
    #[serde(alias = "per-core-interval-ms")]
    pub per_core_interval_ms: Option<u64>,

    /// How long each termination stage waits for the target to exit.
    #[serde(alias = "kill-timeout-secs")]
    pub kill_timeout_secs: Option<u64>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_results: Some(DEFAULT_MAX_RESULTS),
            sample_interval_ms: Some(DEFAULT_SAMPLE_INTERVAL_MS),
            system_cpu_interval_ms: Some(DEFAULT_SYSTEM_CPU_INTERVAL_MS),
            per_core_interval_ms: Some(DEFAULT_PER_CORE_INTERVAL_MS),
            kill_timeout_secs: Some(DEFAULT_KILL_TIMEOUT_SECS),
            log_level: Some("warn".into()),
        }
    }
}

impl Config {
    pub fn max_results(&self) -> i64 {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.unwrap_or(DEFAULT_SAMPLE_INTERVAL_MS))
    }

    pub fn system_cpu_interval(&self) -> Duration {
        Duration::from_millis(
            self.system_cpu_interval_ms
                .unwrap_or(DEFAULT_SYSTEM_CPU_INTERVAL_MS),
        )
    }

    pub fn per_core_interval(&self) -> Duration {
        Duration::from_millis(
            self.per_core_interval_ms
                .unwrap_or(DEFAULT_PER_CORE_INTERVAL_MS),
        )
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_secs(self.kill_timeout_secs.unwrap_or(DEFAULT_KILL_TIMEOUT_SECS))
    }

    /// Overlay non-None fields of `other` onto self.
    fn merge(&mut self, other: Config) {
        if other.max_results.is_some() {
            self.max_results = other.max_results;
        }
        if other.sample_interval_ms.is_some() {
            self.sample_interval_ms = other.sample_interval_ms;
        }
        if other.system_cpu_interval_ms.is_some() {
            self.system_cpu_interval_ms = other.system_cpu_interval_ms;
        }
        if other.per_core_interval_ms.is_some() {
            self.per_core_interval_ms = other.per_core_interval_ms;
        }
        if other.kill_timeout_secs.is_some() {
            self.kill_timeout_secs = other.kill_timeout_secs;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
    }
}

/// Loads a config file (TOML).
pub fn load_config_file(path: &Path) -> Result<Config, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    toml::from_str(&content).map_err(|e| format!("Failed to parse {:?}: {}", path, e))
}

/// Resolves the effective configuration from defaults, the optional config
/// file, and CLI arguments, in increasing precedence.
pub fn resolve_config(args: &Args) -> Result<Config, String> {
    let mut config = Config::default();

    if !args.no_config {
        if let Some(path) = &args.config {
            let file_config = load_config_file(path)?;
            info!("Loaded config from {:?}", path);
            config.merge(file_config);
        } else {
            // Default search locations, lowest to highest precedence.
            for candidate in ["/etc/procsnap/config.toml", "./procsnap.toml"] {
                let p = Path::new(candidate);
                if p.exists() {
                    let file_config = load_config_file(p)?;
                    info!("Loaded config from {}", candidate);
                    config.merge(file_config);
                }
            }
        }
    }

    // CLI overrides
    if let Some(max) = args.max {
        config.max_results = Some(max);
    }

    validate_config(&config)?;
    Ok(config)
}

/// Validates the effective configuration.
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.sample_interval_ms == Some(0) {
        return Err("sample_interval_ms must be > 0: a zero interval makes the \
                    two-pass CPU measurement meaningless"
            .into());
    }
    if config.system_cpu_interval_ms == Some(0) {
        return Err("system_cpu_interval_ms must be > 0".into());
    }
    if config.per_core_interval_ms == Some(0) {
        return Err("per_core_interval_ms must be > 0".into());
    }
    if config.kill_timeout_secs == Some(0) {
        return Err("kill_timeout_secs must be > 0".into());
    }
    Ok(())
}

/// Effective log level: CLI beats the config file; an absent or unrecognized
/// value falls back to Warn.
pub fn resolve_log_level(args: &Args, config: &Config) -> Level {
    if let Some(level) = args.log_level {
        return level.as_level();
    }
    config
        .log_level
        .as_deref()
        .and_then(LogLevel::from_config_str)
        .map(LogLevel::as_level)
        .unwrap_or(Level::WARN)
}
