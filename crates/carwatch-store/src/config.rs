//! Backend connection configuration.
//!
//! A base URL for the hosted project plus its API key. The same key is sent
//! as `apikey` and as a bearer token.

use url::Url;
use zeroize::Zeroizing;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to the hosted backend.
///
/// Custom `Debug` implementation redacts the `api_key` field.
#[derive(Clone)]
pub struct StoreConfig {
    /// Project base URL, e.g. `https://xyzcompany.example.co`.
    pub base_url: Url,
    /// API key. Zeroized on drop.
    pub api_key: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl StoreConfig {
    /// Build a configuration from explicit values with the default timeout.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self {
            base_url: parse_url("base_url", base_url)?,
            api_key: Zeroizing::new(api_key),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CARWATCH_STORE_URL` (required)
    /// - `CARWATCH_STORE_API_KEY` (required)
    /// - `CARWATCH_STORE_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with variables read through `get`.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = get("CARWATCH_STORE_URL").ok_or(ConfigError::MissingUrl)?;
        let api_key = get("CARWATCH_STORE_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let timeout_secs = match get("CARWATCH_STORE_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url: parse_url("CARWATCH_STORE_URL", &raw_url)?,
            api_key: Zeroizing::new(api_key),
            timeout_secs,
        })
    }

    /// A configuration pointing at a local mock server (for testing).
    pub fn local_mock(port: u16, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("localhost", &format!("http://127.0.0.1:{port}"))?,
            api_key: Zeroizing::new(api_key.to_string()),
            timeout_secs: 5,
        })
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("CARWATCH_STORE_URL environment variable is required")]
    MissingUrl,
    #[error("CARWATCH_STORE_API_KEY environment variable is required")]
    MissingApiKey,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid timeout {0:?}: expected whole seconds")]
    InvalidTimeout(String),
    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| vars.get(k).cloned()
    }

    #[test]
    fn from_lookup_reads_all_vars() {
        let cfg = StoreConfig::from_lookup(lookup(&[
            ("CARWATCH_STORE_URL", "https://project.example.co"),
            ("CARWATCH_STORE_API_KEY", "anon-key"),
            ("CARWATCH_STORE_TIMEOUT_SECS", "12"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://project.example.co/");
        assert_eq!(cfg.api_key.as_str(), "anon-key");
        assert_eq!(cfg.timeout_secs, 12);
    }

    #[test]
    fn timeout_defaults_to_30() {
        let cfg = StoreConfig::from_lookup(lookup(&[
            ("CARWATCH_STORE_URL", "https://project.example.co"),
            ("CARWATCH_STORE_API_KEY", "anon-key"),
        ]))
        .unwrap();
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn missing_key_or_url_is_an_error() {
        let err = StoreConfig::from_lookup(lookup(&[(
            "CARWATCH_STORE_URL",
            "https://project.example.co",
        )]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);

        let err =
            StoreConfig::from_lookup(lookup(&[("CARWATCH_STORE_API_KEY", "k")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingUrl);
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[
            ("CARWATCH_STORE_URL", "not a url"),
            ("CARWATCH_STORE_API_KEY", "k"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(..)));

        let err = StoreConfig::from_lookup(lookup(&[
            ("CARWATCH_STORE_URL", "https://project.example.co"),
            ("CARWATCH_STORE_API_KEY", "k"),
            ("CARWATCH_STORE_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::InvalidTimeout("soon".into()));
    }

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = StoreConfig::local_mock(9000, "test-key").unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = StoreConfig::new("https://project.example.co", "super-secret").unwrap();
        let dbg = format!("{cfg:?}");
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("super-secret"));
    }

    #[test]
    fn new_rejects_blank_key() {
        assert_eq!(
            StoreConfig::new("https://project.example.co", "  ").unwrap_err(),
            ConfigError::MissingApiKey
        );
    }
}
