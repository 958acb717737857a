//! Configuration management for the sync agent.
//!
//! Loads configuration from a TOML file, with CLI overrides applied by the
//! binary. Defaults mirror the conventional layout: `./source_folder`,
//! `./replica_folder`, `./log_folder`, 10-second interval.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::errors::SyncError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Folder to mirror from
    #[serde(default = "default_source_folder")]
    pub source_folder: PathBuf,

    /// Folder to mirror into
    #[serde(default = "default_replica_folder")]
    pub replica_folder: PathBuf,

    /// Seconds between cycle starts
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Folder the dated journal file is created in
    #[serde(default = "default_log_folder")]
    pub folder: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_source_folder() -> PathBuf {
    PathBuf::from("./source_folder")
}

fn default_replica_folder() -> PathBuf {
    PathBuf::from("./replica_folder")
}

fn default_interval_secs() -> u64 {
    10
}

fn default_log_folder() -> PathBuf {
    PathBuf::from("./log_folder")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_folder: default_source_folder(),
            replica_folder: default_replica_folder(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            folder: default_log_folder(),
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// The synchronization period.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs)
    }

    /// Reject configurations that cannot work: a zero interval, or source
    /// and replica folders that coincide or nest inside one another (a
    /// nested replica would be deleted or re-copied by its own sync).
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.sync.interval_secs == 0 {
            return Err(SyncError::Config(
                "sync interval must be at least 1 second".to_string(),
            ));
        }

        let source = normalized(&self.sync.source_folder);
        let replica = normalized(&self.sync.replica_folder);
        if source == replica {
            return Err(SyncError::Config(format!(
                "source and replica folders must differ (both are {})",
                replica.display()
            )));
        }
        if replica.starts_with(&source) || source.starts_with(&replica) {
            return Err(SyncError::Config(format!(
                "source ({}) and replica ({}) folders must not be nested",
                source.display(),
                replica.display()
            )));
        }

        Ok(())
    }
}

/// Canonicalize when the path exists, so `./x` and `x` compare equal;
/// fall back to the raw path otherwise.
fn normalized(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sync.source_folder, PathBuf::from("./source_folder"));
        assert_eq!(config.sync.replica_folder, PathBuf::from("./replica_folder"));
        assert_eq!(config.log.folder, PathBuf::from("./log_folder"));
        assert_eq!(config.sync.interval_secs, 10);
        assert_eq!(config.log.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let toml_text = r#"
            [sync]
            source_folder = "/data/in"
            replica_folder = "/data/out"
            interval_secs = 30

            [log]
            folder = "/var/log/sync-agent"
            level = "debug"
        "#;

        let config: Config = toml::from_str(toml_text).unwrap();
        assert_eq!(config.sync.source_folder, PathBuf::from("/data/in"));
        assert_eq!(config.sync.replica_folder, PathBuf::from("/data/out"));
        assert_eq!(config.sync.interval_secs, 30);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str("[sync]\ninterval_secs = 5\n").unwrap();
        assert_eq!(config.sync.interval_secs, 5);
        assert_eq!(config.sync.source_folder, PathBuf::from("./source_folder"));
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut config = Config::default();
        config.sync.interval_secs = 0;
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_equal_folders_are_rejected() {
        let mut config = Config::default();
        config.sync.source_folder = PathBuf::from("/data/tree");
        config.sync.replica_folder = PathBuf::from("/data/tree");
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_nested_folders_are_rejected() {
        let mut config = Config::default();
        config.sync.source_folder = PathBuf::from("/data/tree");
        config.sync.replica_folder = PathBuf::from("/data/tree/replica");
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_relative_spelling_of_same_folder_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("tree");
        std::fs::create_dir(&folder).unwrap();

        let mut config = Config::default();
        config.sync.source_folder = folder.clone();
        config.sync.replica_folder = folder.join("sub/..");
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }
}
