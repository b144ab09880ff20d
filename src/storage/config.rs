//! Configuration handling
//!
//! The directory lives in a data root: the database file, the snapshot
//! file, and an optional `config.toml` overriding the file names. The root
//! defaults to the platform data directory and can be overridden per
//! invocation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("No data directory available on this platform")]
    NoDataDir,
}

/// Directory configuration, stored as `config.toml` in the data root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file name, relative to the data root
    pub db_file: String,

    /// Snapshot file name, relative to the data root
    pub snapshot_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_file: "directory.db".to_string(),
            snapshot_file: "directory.json".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from `config.toml` in the given root,
    /// falling back to defaults when the file does not exist
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("config.toml");

        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config =
            toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Writes the configuration to `config.toml` in the given root
    pub fn save(&self, root: &Path) -> Result<()> {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create data root: {}", root.display()))?;

        let path = root.join("config.toml");
        let raw = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, raw)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Resolves the database path under the given root
    pub fn db_path(&self, root: &Path) -> PathBuf {
        root.join(&self.db_file)
    }

    /// Resolves the snapshot path under the given root
    pub fn snapshot_path(&self, root: &Path) -> PathBuf {
        root.join(&self.snapshot_file)
    }

    /// The platform default data root (e.g. `~/.local/share/rolodex`)
    pub fn default_root() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "rolodex").ok_or(ConfigError::NoDataDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();

        assert_eq!(config.db_file, "directory.db");
        assert_eq!(config.snapshot_file, "directory.json");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();

        let config = Config {
            db_file: "contacts.db".to_string(),
            snapshot_file: "contacts.json".to_string(),
        };
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.db_file, "contacts.db");
        assert_eq!(loaded.snapshot_file, "contacts.json");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "db_file = \"other.db\"\n").unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.db_file, "other.db");
        assert_eq!(config.snapshot_file, "directory.json");
    }

    #[test]
    fn paths_resolve_under_root() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();

        assert_eq!(config.db_path(dir.path()), dir.path().join("directory.db"));
        assert_eq!(
            config.snapshot_path(dir.path()),
            dir.path().join("directory.json")
        );
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "db_file = [not toml").unwrap();

        assert!(Config::load(dir.path()).is_err());
    }
}
