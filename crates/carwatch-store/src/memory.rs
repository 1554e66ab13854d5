//! # In-Memory Data Store
//!
//! A process-local [`DataStore`] for tests and offline runs.
//!
//! Tables are insertion-ordered vectors of JSON rows. Selecting with an
//! ordering is a stable sort on the column value, so rows that tie on the
//! ordering column keep their insertion order (ascending) or come newest
//! first (descending).
//!
//! Failure injection makes chosen operations, or uploads under a chosen
//! path prefix, fail with [`StoreError::Unavailable`]. Every call is counted
//! per [`Operation`], including calls that fail.
//!
//! All locks are `parking_lot` and never held across `.await`.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::{DataStore, Filter, Order, StoreError};

const DEFAULT_BASE_URL: &str = "memory://carwatch";

/// A store operation, for failure injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Select,
    Update,
    Upload,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Select => "select",
            Self::Update => "update",
            Self::Upload => "upload",
        }
    }
}

/// An uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    failing_ops: RwLock<HashSet<Operation>>,
    failing_upload_prefixes: RwLock<Vec<String>>,
    calls: RwLock<HashMap<Operation, usize>>,
}

/// Thread-safe, cloneable in-memory backend. Clones share state.
#[derive(Debug, Clone)]
pub struct InMemoryDataStore {
    inner: Arc<Inner>,
    base_url: String,
}

impl Default for InMemoryDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create an empty store whose public URLs start with `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner::default()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Seed a row directly, bypassing accounting and failure injection.
    pub fn seed(&self, table: &str, row: Value) {
        self.inner
            .tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// All rows of `table` in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.inner
            .tables
            .read()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// An uploaded object, if present.
    pub fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.inner
            .objects
            .read()
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Paths of every object in `bucket`, sorted.
    pub fn object_paths(&self, bucket: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .inner
            .objects
            .read()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, p)| p.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Make every subsequent call of `op` fail until cleared.
    pub fn fail_operation(&self, op: Operation) {
        self.inner.failing_ops.write().insert(op);
    }

    /// Make uploads whose path starts with `prefix` fail until cleared.
    pub fn fail_uploads_with_prefix(&self, prefix: impl Into<String>) {
        self.inner.failing_upload_prefixes.write().push(prefix.into());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.inner.failing_ops.write().clear();
        self.inner.failing_upload_prefixes.write().clear();
    }

    /// Calls of `op` so far, failed ones included.
    pub fn call_count(&self, op: Operation) -> usize {
        self.inner.calls.read().get(&op).copied().unwrap_or(0)
    }

    /// Calls of every operation so far.
    pub fn total_calls(&self) -> usize {
        self.inner.calls.read().values().sum()
    }

    /// Reset call counters to zero.
    pub fn reset_calls(&self) {
        self.inner.calls.write().clear();
    }

    fn record(&self, op: Operation, endpoint: &str) -> Result<(), StoreError> {
        *self.inner.calls.write().entry(op).or_insert(0) += 1;
        if self.inner.failing_ops.read().contains(&op) {
            return Err(injected(endpoint));
        }
        Ok(())
    }
}

fn injected(endpoint: &str) -> StoreError {
    StoreError::Unavailable {
        endpoint: endpoint.to_string(),
        reason: "injected failure".to_string(),
    }
}

/// Order two column values: nulls and missing first, then booleans,
/// numbers, strings. Strings compare lexically, which is chronological for
/// the fixed-width timestamps rows carry.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        let endpoint = format!("insert {table}");
        self.record(Operation::Insert, &endpoint)?;

        let mut row = row;
        let obj = row.as_object_mut().ok_or_else(|| StoreError::Api {
            endpoint: endpoint.clone(),
            status: 400,
            body: "row must be a JSON object".to_string(),
        })?;
        obj.entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));

        self.inner
            .tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError> {
        self.record(Operation::Select, &format!("select {table}"))?;

        let mut rows: Vec<Value> = self
            .inner
            .tables
            .read()
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| compare_values(a.get(&order.column), b.get(&order.column)));
            if order.descending {
                rows.reverse();
            }
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let endpoint = format!("update {table}");
        self.record(Operation::Update, &endpoint)?;

        let Value::Object(patch) = patch else {
            return Err(StoreError::Api {
                endpoint,
                status: 400,
                body: "patch must be a JSON object".to_string(),
            });
        };

        let mut tables = self.inner.tables.write();
        let row = tables
            .get_mut(table)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            })
            .and_then(Value::as_object_mut)
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                filter: format!("id={id}"),
            })?;

        for (column, value) in patch {
            row.insert(column, value);
        }
        Ok(())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        let endpoint = format!("upload {bucket}/{path}");
        self.record(Operation::Upload, &endpoint)?;

        if self
            .inner
            .failing_upload_prefixes
            .read()
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return Err(injected(&endpoint));
        }

        let key = (bucket.to_string(), path.to_string());
        let mut objects = self.inner.objects.write();
        if objects.contains_key(&key) {
            return Err(StoreError::Api {
                endpoint,
                status: 409,
                body: "object already exists".to_string(),
            });
        }
        objects.insert(
            key,
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.base_url
        )
    }
}
