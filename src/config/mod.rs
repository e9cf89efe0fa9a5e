//! Configuration management for hrm
//!
//! Handles the ~/.hrm/ directory structure and config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::models::DisplayFont;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database file; defaults to ~/.hrm/users.db
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_file: Option<PathBuf>,
    #[serde(default)]
    pub font: DisplayFont,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_file: None,
            font: DisplayFont::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Returns the path to the hrm home directory (~/.hrm)
pub fn hrm_home() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".hrm"))
}

/// Returns paths to all hrm files and directories
#[derive(Debug, Clone)]
pub struct HrmPaths {
    pub root: PathBuf,
    pub config: PathBuf,
    pub db_file: PathBuf,
    pub logs: PathBuf,
}

impl HrmPaths {
    pub fn new() -> Result<Self> {
        Ok(Self::at(hrm_home()?))
    }

    /// Paths rooted at an explicit directory
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config: root.join("config.toml"),
            db_file: root.join("users.db"),
            logs: root.join("logs"),
            root,
        }
    }

    /// Create all directories if they don't exist
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.root).context("Failed to create hrm root")?;
        fs::create_dir_all(&self.logs).context("Failed to create logs directory")?;
        Ok(())
    }

    /// Database file to open: the config override if set, else the default
    pub fn resolve_db_file(&self, config: &Config) -> PathBuf {
        config
            .db_file
            .clone()
            .unwrap_or_else(|| self.db_file.clone())
    }
}

/// Database file for this run: `--db` wins, then config.toml, then the
/// default under ~/.hrm. Without a home directory only `--db` works.
pub fn resolve_db_path(
    db_override: Option<PathBuf>,
    paths: Option<&HrmPaths>,
    config: &Config,
) -> Result<PathBuf> {
    if let Some(path) = db_override {
        return Ok(path);
    }
    match paths {
        Some(paths) => Ok(paths.resolve_db_file(config)),
        None => config
            .db_file
            .clone()
            .context("Could not determine home directory; pass --db <FILE>"),
    }
}

/// Load configuration from disk, falling back to defaults when absent
pub fn load_config(paths: &HrmPaths) -> Result<Config> {
    if !paths.config.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&paths.config).context("Failed to read config.toml")?;
    toml::from_str(&content).context("Failed to parse config.toml")
}

/// Save configuration to disk
pub fn save_config(paths: &HrmPaths, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&paths.config, content).context("Failed to write config.toml")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let paths = HrmPaths::at(temp.path());
        let config = load_config(&paths).unwrap();
        assert_eq!(config.font, DisplayFont::Arial);
        assert_eq!(config.log_level, "info");
        assert_eq!(paths.resolve_db_file(&config), temp.path().join("users.db"));
    }

    #[test]
    fn test_config_round_trips_through_disk() {
        let temp = TempDir::new().unwrap();
        let paths = HrmPaths::at(temp.path());
        paths.ensure_dirs().unwrap();

        let config = Config {
            db_file: Some(temp.path().join("other.db")),
            font: DisplayFont::TimesNewRoman,
            log_level: "debug".to_string(),
        };
        save_config(&paths, &config).unwrap();

        let written = fs::read_to_string(&paths.config).unwrap();
        assert!(written.contains("font = \"Times New Roman\""));

        let loaded = load_config(&paths).unwrap();
        assert_eq!(loaded.font, DisplayFont::TimesNewRoman);
        assert_eq!(paths.resolve_db_file(&loaded), temp.path().join("other.db"));
    }

    #[test]
    fn test_db_override_needs_no_home_directory() {
        let config = Config::default();
        let path = resolve_db_path(Some(PathBuf::from("/tmp/x.db")), None, &config).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/x.db"));

        let err = resolve_db_path(None, None, &config).unwrap_err();
        assert!(err.to_string().contains("--db"));
    }

    #[test]
    fn test_db_override_beats_config_and_default() {
        let temp = TempDir::new().unwrap();
        let paths = HrmPaths::at(temp.path());
        let config = Config {
            db_file: Some(temp.path().join("configured.db")),
            ..Config::default()
        };

        let chosen = resolve_db_path(Some(temp.path().join("cli.db")), Some(&paths), &config);
        assert_eq!(chosen.unwrap(), temp.path().join("cli.db"));
        let chosen = resolve_db_path(None, Some(&paths), &config);
        assert_eq!(chosen.unwrap(), temp.path().join("configured.db"));
        let chosen = resolve_db_path(None, Some(&paths), &Config::default());
        assert_eq!(chosen.unwrap(), temp.path().join("users.db"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let paths = HrmPaths::at(temp.path());
        fs::write(&paths.config, "font = \"Courier\"\n").unwrap();

        let config = load_config(&paths).unwrap();
        assert_eq!(config.font, DisplayFont::Courier);
        assert_eq!(config.log_level, "info");
        assert!(config.db_file.is_none());
    }
}
