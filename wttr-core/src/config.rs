use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    source::wttr::DEFAULT_BASE_URL,
    worker::{MAX_CHECK_GRANULARITY, WorkerSettings},
};

/// Widget settings stored on disk.
///
/// Example TOML:
/// ```toml
/// city = "Poltava"
/// interval_secs = 300
/// update_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// City passed to wttr.in.
    pub city: String,
    /// Seconds between background polls.
    pub interval_secs: u64,
    /// How long a requested update may take before the button is reset.
    pub update_timeout_ms: u64,
    /// How often the worker re-checks stop/manual flags while waiting.
    pub check_granularity_ms: u64,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            city: "Poltava".to_string(),
            interval_secs: 300,
            update_timeout_ms: 5000,
            check_granularity_ms: 100,
            request_timeout_secs: 10,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wttr-widget", "wttr-widget")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.city.trim().is_empty(), "City must not be empty");
        ensure!(self.interval_secs > 0, "Polling interval must be at least 1 second");
        ensure!(self.update_timeout_ms > 0, "Update timeout must be positive");
        ensure!(
            (1..=MAX_CHECK_GRANULARITY.as_millis() as u64).contains(&self.check_granularity_ms),
            "Check granularity must be between 1 and {} ms",
            MAX_CHECK_GRANULARITY.as_millis()
        );
        ensure!(self.request_timeout_secs > 0, "Request timeout must be positive");
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn update_timeout(&self) -> Duration {
        Duration::from_millis(self.update_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings::new(self.interval(), Duration::from_millis(self.check_granularity_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_widget_behaviour() {
        let cfg = Config::default();
        assert_eq!(cfg.city, "Poltava");
        assert_eq!(cfg.interval(), Duration::from_secs(300));
        assert_eq!(cfg.update_timeout(), Duration::from_millis(5000));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str("city = \"Kyiv\"\ninterval_secs = 60\n").expect("toml");
        assert_eq!(cfg.city, "Kyiv");
        assert_eq!(cfg.interval_secs, 60);
        assert_eq!(cfg.update_timeout_ms, 5000);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let blank_city = Config {
            city: "  ".into(),
            ..Config::default()
        };
        assert!(blank_city.validate().unwrap_err().to_string().contains("City"));

        let zero_interval = Config {
            interval_secs: 0,
            ..Config::default()
        };
        assert!(zero_interval.validate().is_err());

        let coarse = Config {
            check_granularity_ms: 2000,
            ..Config::default()
        };
        assert!(coarse.validate().unwrap_err().to_string().contains("granularity"));
    }

    #[test]
    fn worker_settings_follow_config() {
        let cfg = Config {
            interval_secs: 42,
            check_granularity_ms: 250,
            ..Config::default()
        };
        let settings = cfg.worker_settings();
        assert_eq!(settings.interval, Duration::from_secs(42));
        assert_eq!(settings.check_granularity, Duration::from_millis(250));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_from_nested_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config {
            city: "Lviv".into(),
            interval_secs: 120,
            ..Config::default()
        };
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn garbage_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "city = [").expect("write");

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
