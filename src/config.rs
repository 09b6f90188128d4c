use std::path::{Path, PathBuf};
use std::time::Duration;

use adrenaline_process::RestartConfig;
use adrenaline_store::{StoreConfig, WriteMode};
use anyhow::{ensure, Context};
use serde::Deserialize;

/// Optional TOML settings file. Every field is optional; anything left out
/// keeps its built-in default.
///
/// ```toml
/// [store]
/// database_path = 'D:\AMD\CN\gmdb.blb'
/// debounce_ms = 1000
/// write_mode = "in_place"
///
/// [restart]
/// timeout_ms = 60000
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub store: StoreSection,
    pub restart: RestartSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub database_path: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub write_mode: Option<WriteModeSetting>,
    pub max_id_attempts: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestartSection {
    pub executable_path: Option<PathBuf>,
    pub process_name: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteModeSetting {
    Atomic,
    InPlace,
}

impl From<WriteModeSetting> for WriteMode {
    fn from(setting: WriteModeSetting) -> Self {
        match setting {
            WriteModeSetting::Atomic => WriteMode::Atomic,
            WriteModeSetting::InPlace => WriteMode::InPlace,
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        ensure!(
            config.store.max_id_attempts != Some(0),
            "store.max_id_attempts must be at least 1"
        );
        ensure!(
            config.restart.poll_interval_ms != Some(0),
            "restart.poll_interval_ms must be at least 1"
        );
        Ok(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::default();
        let s = &self.store;
        if let Some(path) = &s.database_path {
            config.database_path = path.clone();
        }
        if let Some(ms) = s.debounce_ms {
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(mode) = s.write_mode {
            config.write_mode = mode.into();
        }
        if let Some(n) = s.max_id_attempts {
            config.max_id_attempts = n;
        }
        config
    }

    pub fn restart_config(&self) -> RestartConfig {
        let mut config = RestartConfig::default();
        let r = &self.restart;
        if let Some(path) = &r.executable_path {
            config.executable_path = path.clone();
        }
        if let Some(name) = &r.process_name {
            config.process_name = name.clone();
        }
        if let Some(ms) = r.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = r.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_means_defaults() {
        let config = FileConfig::parse("").unwrap();
        let store = config.store_config();
        assert_eq!(store.debounce, Duration::from_secs(1));
        assert_eq!(store.write_mode, WriteMode::Atomic);
        assert_eq!(config.restart_config(), RestartConfig::default());
    }

    #[test]
    fn test_sections_overlay_defaults() {
        let config = FileConfig::parse(
            r#"
            [store]
            database_path = "/tmp/gmdb.blb"
            debounce_ms = 250
            write_mode = "in_place"

            [restart]
            process_name = "Other"
            timeout_ms = 5000
            "#,
        )
        .unwrap();

        let store = config.store_config();
        assert_eq!(store.database_path, PathBuf::from("/tmp/gmdb.blb"));
        assert_eq!(store.debounce, Duration::from_millis(250));
        assert_eq!(store.write_mode, WriteMode::InPlace);
        assert_eq!(store.max_id_attempts, 64);

        let restart = config.restart_config();
        assert_eq!(restart.process_name, "Other");
        assert_eq!(restart.timeout, Duration::from_secs(5));
        assert_eq!(restart.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let err = FileConfig::parse("[store]\nmax_id_attempts = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_id_attempts"));
        assert!(FileConfig::parse("[restart]\npoll_interval_ms = 0\n").is_err());
        let config = FileConfig::parse("[store]\nmax_id_attempts = 1\n").unwrap();
        assert_eq!(config.store_config().max_id_attempts, 1);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(FileConfig::parse("[store]\ndebounce = 5\n").is_err());
    }
}
