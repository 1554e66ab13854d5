//! # carwatch-store -- Data access for the carwatch backend
//!
//! The portal never owns its data. Tables and uploaded files live in a hosted
//! backend that is reached through the [`DataStore`] contract defined here:
//!
//! - **Tables**: insert a row, select rows by equality filters with an
//!   optional ordering and limit, patch a row by `id`.
//! - **Object storage**: upload bytes under a bucket path and derive the
//!   public URL for an uploaded object.
//!
//! Two implementations ship with the crate:
//!
//! - [`RestDataStore`] speaks the hosted PostgREST-style table API and the
//!   storage API over `reqwest`.
//! - [`InMemoryDataStore`] keeps everything in process. It supports failure
//!   injection and call accounting so callers can prove which round trips a
//!   flow performed.
//!
//! Rows travel as `serde_json::Value` objects. Typed decoding is the
//! caller's job.
//!
//! Nothing here retries. A failed call is reported once and the user decides
//! whether to resubmit.

pub mod config;
pub mod error;
pub mod memory;
pub mod rest;

pub use config::{ConfigError, StoreConfig};
pub use error::StoreError;
pub use memory::{InMemoryDataStore, Operation, StoredObject};
pub use rest::RestDataStore;

use async_trait::async_trait;
use serde_json::Value;

/// Equality conditions on columns, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `column = value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether `row` satisfies every condition.
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(column, expected)| row.get(column) == Some(expected))
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.conditions.is_empty() {
            return f.write_str("*");
        }
        for (i, (column, value)) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{column}={}", render_value(value))?;
        }
        Ok(())
    }
}

/// Row ordering on a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// Render a filter value the way the table API expects it in a query string.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// The backend collaborator: relational tables plus object storage.
///
/// Object-safe so flows can hold an `Arc<dyn DataStore>` and tests can swap
/// in [`InMemoryDataStore`].
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Human-readable backend name, for logs.
    fn backend_name(&self) -> &str;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError>;

    /// Select rows matching `filter`, optionally ordered and limited.
    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError>;

    /// The newest row matching `filter` by `order_by`, descending.
    ///
    /// Returns [`StoreError::NotFound`] when nothing matches.
    async fn select_latest(
        &self,
        table: &str,
        filter: &Filter,
        order_by: &str,
    ) -> Result<Value, StoreError> {
        let order = Order::desc(order_by);
        self.select(table, filter, Some(&order), Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                filter: filter.to_string(),
            })
    }

    /// Merge `patch` into the row whose `id` equals `id`.
    ///
    /// Returns [`StoreError::NotFound`] when no row has that id.
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Store `bytes` at `path` inside `bucket`.
    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError>;

    /// Public URL of an uploaded object. Pure; does not check existence.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_all_conditions() {
        let filter = Filter::new().eq("car_id", "c1").eq("owner_email", "a@b.co");
        assert!(filter.matches(&json!({"car_id": "c1", "owner_email": "a@b.co", "x": 1})));
        assert!(!filter.matches(&json!({"car_id": "c1", "owner_email": "z@b.co"})));
        assert!(!filter.matches(&json!({"car_id": "c1"})));
        assert!(Filter::new().matches(&json!({})));
    }

    #[test]
    fn filter_display_is_readable() {
        let filter = Filter::new().eq("status", "pending").eq("is_verified", true);
        assert_eq!(filter.to_string(), "status=pending and is_verified=true");
        assert_eq!(Filter::new().to_string(), "*");
    }

    #[test]
    fn data_store_is_object_safe() {
        fn _assert_object_safe(_: &dyn DataStore) {}
        fn _assert_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_send_sync::<dyn DataStore>();
    }
}
