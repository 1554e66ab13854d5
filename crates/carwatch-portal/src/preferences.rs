//! # Notification Preferences
//!
//! Which emails a user wants and how often. Stored as a small JSON document
//! with camelCase keys:
//!
//! ```json
//! {
//!   "emailOnStatusChange": true,
//!   "emailOnNewReport": true,
//!   "emailOnUpdate": true,
//!   "notificationFrequency": "immediate"
//! }
//! ```
//!
//! Missing keys take their defaults. Persistence goes through the
//! [`PreferencesStore`] trait so the service never knows where the document
//! lives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading, saving or editing preferences.
#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("preferences I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("preferences are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown notification frequency {0:?} (expected immediate, daily or weekly)")]
    UnknownFrequency(String),

    #[error("unknown preference {0:?}")]
    UnknownSetting(String),

    #[error("preference {key} expects true or false, got {value:?}")]
    InvalidFlag { key: String, value: String },
}

/// How often notification emails go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationFrequency {
    #[default]
    Immediate,
    Daily,
    Weekly,
}

impl NotificationFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for NotificationFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationFrequency {
    type Err = PreferencesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            _ => Err(PreferencesError::UnknownFrequency(s.to_string())),
        }
    }
}

/// A user's notification preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    pub email_on_status_change: bool,
    pub email_on_new_report: bool,
    pub email_on_update: bool,
    pub notification_frequency: NotificationFrequency,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_on_status_change: true,
            email_on_new_report: true,
            email_on_update: true,
            notification_frequency: NotificationFrequency::Immediate,
        }
    }
}

impl NotificationPreferences {
    /// Set one preference by name. Accepts camelCase or snake_case keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), PreferencesError> {
        let flag = |value: &str| match value.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(true),
            "false" | "off" | "no" | "0" => Ok(false),
            _ => Err(PreferencesError::InvalidFlag {
                key: key.to_string(),
                value: value.to_string(),
            }),
        };

        match key {
            "emailOnStatusChange" | "email_on_status_change" => {
                self.email_on_status_change = flag(value)?
            }
            "emailOnNewReport" | "email_on_new_report" => self.email_on_new_report = flag(value)?,
            "emailOnUpdate" | "email_on_update" => self.email_on_update = flag(value)?,
            "notificationFrequency" | "notification_frequency" => {
                self.notification_frequency = value.parse()?
            }
            other => return Err(PreferencesError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }
}

// ─── Storage ─────────────────────────────────────────────────────────

/// Where preferences are kept.
pub trait PreferencesStore: Send + Sync {
    /// The saved preferences, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<NotificationPreferences>, PreferencesError>;

    fn save(&self, prefs: &NotificationPreferences) -> Result<(), PreferencesError>;
}

/// Preferences in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFilePreferencesStore {
    path: PathBuf,
}

impl JsonFilePreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferencesStore for JsonFilePreferencesStore {
    fn load(&self) -> Result<Option<NotificationPreferences>, PreferencesError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, prefs: &NotificationPreferences) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(prefs)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "notification preferences saved");
        Ok(())
    }
}

/// Preferences held in memory.
#[derive(Debug, Default)]
pub struct InMemoryPreferencesStore {
    saved: RwLock<Option<NotificationPreferences>>,
}

impl InMemoryPreferencesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferencesStore for InMemoryPreferencesStore {
    fn load(&self) -> Result<Option<NotificationPreferences>, PreferencesError> {
        Ok(*self.saved.read())
    }

    fn save(&self, prefs: &NotificationPreferences) -> Result<(), PreferencesError> {
        *self.saved.write() = Some(*prefs);
        Ok(())
    }
}

// ─── Service ─────────────────────────────────────────────────────────

/// Loads preferences (defaults when none were saved) and saves changes.
#[derive(Clone)]
pub struct PreferencesService {
    store: Arc<dyn PreferencesStore>,
}

impl PreferencesService {
    pub fn new(store: Arc<dyn PreferencesStore>) -> Self {
        Self { store }
    }

    /// Saved preferences, or the defaults.
    ///
    /// A stored document that cannot be read is an error rather than a
    /// silent reset, so the file is never overwritten by accident.
    pub fn current(&self) -> Result<NotificationPreferences, PreferencesError> {
        Ok(self.store.load()?.unwrap_or_default())
    }

    pub fn save(&self, prefs: &NotificationPreferences) -> Result<(), PreferencesError> {
        self.store.save(prefs)
    }

    /// Change one preference and save the result.
    pub fn set(&self, key: &str, value: &str) -> Result<NotificationPreferences, PreferencesError> {
        let mut prefs = self.current()?;
        prefs.set(key, value)?;
        self.save(&prefs)?;
        Ok(prefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_on_and_immediate() {
        let prefs = NotificationPreferences::default();
        assert!(prefs.email_on_status_change);
        assert!(prefs.email_on_new_report);
        assert!(prefs.email_on_update);
        assert_eq!(prefs.notification_frequency, NotificationFrequency::Immediate);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(NotificationPreferences::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "emailOnStatusChange": true,
                "emailOnNewReport": true,
                "emailOnUpdate": true,
                "notificationFrequency": "immediate"
            })
        );
    }

    #[test]
    fn missing_keys_take_defaults() {
        let prefs: NotificationPreferences =
            serde_json::from_str(r#"{"emailOnUpdate": false, "notificationFrequency": "weekly"}"#)
                .unwrap();
        assert!(!prefs.email_on_update);
        assert!(prefs.email_on_new_report);
        assert_eq!(prefs.notification_frequency, NotificationFrequency::Weekly);
    }

    #[test]
    fn set_accepts_both_key_styles() {
        let mut prefs = NotificationPreferences::default();
        prefs.set("emailOnNewReport", "off").unwrap();
        prefs.set("notification_frequency", "Daily").unwrap();
        assert!(!prefs.email_on_new_report);
        assert_eq!(prefs.notification_frequency, NotificationFrequency::Daily);

        assert!(matches!(
            prefs.set("emailOnNewReport", "maybe"),
            Err(PreferencesError::InvalidFlag { .. })
        ));
        assert!(matches!(
            prefs.set("notificationFrequency", "hourly"),
            Err(PreferencesError::UnknownFrequency(_))
        ));
        assert!(matches!(
            prefs.set("sms", "true"),
            Err(PreferencesError::UnknownSetting(_))
        ));
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePreferencesStore::new(dir.path().join("nested").join("prefs.json"));
        assert!(store.load().unwrap().is_none());

        let prefs = NotificationPreferences {
            email_on_status_change: false,
            notification_frequency: NotificationFrequency::Weekly,
            ..NotificationPreferences::default()
        };
        store.save(&prefs).unwrap();
        assert_eq!(store.load().unwrap(), Some(prefs));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"emailOnStatusChange\": false"));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();
        let service = PreferencesService::new(Arc::new(JsonFilePreferencesStore::new(&path)));
        assert!(matches!(service.current(), Err(PreferencesError::Json(_))));
    }

    #[test]
    fn service_defaults_then_persists_changes() {
        let service = PreferencesService::new(Arc::new(InMemoryPreferencesStore::new()));
        assert_eq!(service.current().unwrap(), NotificationPreferences::default());

        let updated = service.set("emailOnStatusChange", "false").unwrap();
        assert!(!updated.email_on_status_change);
        assert_eq!(service.current().unwrap(), updated);
    }
}
