//! # carwatch-portal -- Citizen-portal helpers
//!
//! Small, self-contained pieces of the citizen portal that sit beside the
//! verification flow:
//!
//! - [`Assistant`]: a canned-response help assistant. An ordered keyword rule
//!   table is evaluated top to bottom and the first match wins. Some rules
//!   also ask the front-end to navigate.
//! - [`PreferencesService`]: notification preferences loaded from and saved
//!   to an injected [`PreferencesStore`].

pub mod assistant;
pub mod preferences;

pub use assistant::{Assistant, Reply, Rule};
pub use preferences::{
    InMemoryPreferencesStore, JsonFilePreferencesStore, NotificationFrequency,
    NotificationPreferences, PreferencesError, PreferencesService, PreferencesStore,
};
