//! # CLI Configuration
//!
//! Optional YAML file passed with `--config`:
//!
//! ```yaml
//! store:
//!   url: https://project.example.co
//!   api_key: anon-key
//!   timeout_secs: 10
//! preferences_path: /home/me/.config/carwatch/preferences.json
//! ```
//!
//! Values in the file override the `CARWATCH_STORE_*` environment
//! variables; anything the file leaves out falls back to the environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use carwatch_store::StoreConfig;

/// Preferences file used when neither the config file nor
/// `CARWATCH_PREFERENCES` names one.
pub const DEFAULT_PREFERENCES_FILE: &str = "carwatch-preferences.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl CliConfig {
    /// Read `path`, or the empty configuration when no path was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Backend configuration from this file layered over the process
    /// environment.
    pub fn store_config(&self) -> Result<StoreConfig> {
        self.store_config_with(|var| std::env::var(var).ok())
    }

    /// Same as [`store_config`](Self::store_config) with the environment
    /// read through `env`.
    pub fn store_config_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<StoreConfig> {
        let section = &self.store;
        let config = StoreConfig::from_lookup(|var| match var {
            "CARWATCH_STORE_URL" => section.url.clone().or_else(|| env(var)),
            "CARWATCH_STORE_API_KEY" => section.api_key.clone().or_else(|| env(var)),
            "CARWATCH_STORE_TIMEOUT_SECS" => section
                .timeout_secs
                .map(|secs| secs.to_string())
                .or_else(|| env(var)),
            _ => env(var),
        })
        .context("backend is not configured")?;
        tracing::debug!(?config, "backend configuration resolved");
        Ok(config)
    }

    /// Where notification preferences live.
    pub fn preferences_path(&self, env: impl Fn(&str) -> Option<String>) -> PathBuf {
        self.preferences_path
            .clone()
            .or_else(|| env("CARWATCH_PREFERENCES").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |k| {
            pairs
                .iter()
                .find(|(name, _)| *name == k)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn file_values_override_environment() {
        let config = CliConfig::from_yaml(
            "store:\n  url: https://file.example.co\n  timeout_secs: 7\n",
        )
        .unwrap();
        let store = config
            .store_config_with(env(&[
                ("CARWATCH_STORE_URL", "https://env.example.co"),
                ("CARWATCH_STORE_API_KEY", "env-key"),
                ("CARWATCH_STORE_TIMEOUT_SECS", "40"),
            ]))
            .unwrap();
        assert_eq!(store.base_url.as_str(), "https://file.example.co/");
        assert_eq!(store.api_key.as_str(), "env-key");
        assert_eq!(store.timeout_secs, 7);
    }

    #[test]
    fn empty_file_means_environment_only() {
        let config = CliConfig::from_yaml("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert!(config.store_config_with(env(&[])).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(CliConfig::from_yaml("stor:\n  url: x\n").is_err());
    }

    #[test]
    fn preferences_path_precedence() {
        let config = CliConfig::default();
        assert_eq!(
            config.preferences_path(env(&[])),
            PathBuf::from(DEFAULT_PREFERENCES_FILE)
        );
        assert_eq!(
            config.preferences_path(env(&[("CARWATCH_PREFERENCES", "/tmp/p.json")])),
            PathBuf::from("/tmp/p.json")
        );

        let config = CliConfig::from_yaml("preferences_path: /srv/prefs.json\n").unwrap();
        assert_eq!(
            config.preferences_path(env(&[("CARWATCH_PREFERENCES", "/tmp/p.json")])),
            PathBuf::from("/srv/prefs.json")
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }
}
