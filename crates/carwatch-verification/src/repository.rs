//! Typed access to the verification and car tables.
//!
//! Rows cross the [`DataStore`] boundary as JSON; this module is the only
//! place that knows table names, column names and the document bucket.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use carwatch_core::{CarId, EmailAddress, VerificationId};
use carwatch_state::{DocumentAttachment, StatusChange, VerificationRequest, VerificationStatus};
use carwatch_store::{DataStore, Filter, Order, StoreError};

/// Table holding one row per verification attempt.
pub const VERIFICATION_TABLE: &str = "ownership_verification";
/// Vehicle table, read-only here.
pub const CARS_TABLE: &str = "cars";
/// Storage bucket for uploaded documents.
pub const DOCUMENT_BUCKET: &str = "car-images";

/// Read-only projection of a `cars` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarSummary {
    pub id: CarId,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, alias = "license_plate")]
    pub plate_number: Option<String>,
    /// Not validated: a stored value that is not an address just pre-fills
    /// the form and fails there.
    #[serde(default)]
    pub owner_email: Option<String>,
}

impl CarSummary {
    /// `make model year`, skipping missing parts.
    pub fn label(&self) -> String {
        let year = self.year.map(|y| y.to_string());
        let parts: Vec<&str> = [self.make.as_deref(), self.model.as_deref(), year.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect();
        if parts.is_empty() {
            self.id.to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Typed rows over a shared [`DataStore`].
#[derive(Clone)]
pub struct VerificationRepository {
    store: Arc<dyn DataStore>,
    bucket: String,
}

impl std::fmt::Debug for VerificationRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationRepository")
            .field("backend", &self.store.backend_name())
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl VerificationRepository {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self::with_bucket(store, DOCUMENT_BUCKET)
    }

    pub fn with_bucket(store: Arc<dyn DataStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Fetch the car summary for `car_id`.
    pub async fn car(&self, car_id: CarId) -> Result<CarSummary, StoreError> {
        let filter = Filter::new().eq("id", car_id.to_string());
        let row = self
            .store
            .select(CARS_TABLE, &filter, None, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                table: CARS_TABLE.to_string(),
                filter: filter.to_string(),
            })?;
        decode(CARS_TABLE, row)
    }

    /// Insert a freshly issued request.
    pub async fn insert_request(&self, request: &VerificationRequest) -> Result<(), StoreError> {
        let row = encode(VERIFICATION_TABLE, request)?;
        self.store.insert(VERIFICATION_TABLE, row).await?;
        Ok(())
    }

    /// The most recently created request for a car and email.
    pub async fn latest_request(
        &self,
        car_id: CarId,
        owner_email: &EmailAddress,
    ) -> Result<VerificationRequest, StoreError> {
        let filter = Filter::new()
            .eq("car_id", car_id.to_string())
            .eq("owner_email", owner_email.as_str());
        let row = self
            .store
            .select_latest(VERIFICATION_TABLE, &filter, "created_at")
            .await?;
        decode(VERIFICATION_TABLE, row)
    }

    /// A request by id.
    pub async fn request(&self, id: VerificationId) -> Result<VerificationRequest, StoreError> {
        let filter = Filter::new().eq("id", id.to_string());
        let row = self
            .store
            .select(VERIFICATION_TABLE, &filter, None, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                table: VERIFICATION_TABLE.to_string(),
                filter: filter.to_string(),
            })?;
        decode(VERIFICATION_TABLE, row)
    }

    /// Requests newest first, optionally restricted to one status.
    ///
    /// Rows that do not decode are skipped with a warning so one bad row
    /// cannot hide the rest of the queue.
    pub async fn list(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<VerificationRequest>, StoreError> {
        let mut filter = Filter::new();
        if let Some(status) = status {
            filter = filter.eq("status", status.as_str());
        }
        let rows = self
            .store
            .select(
                VERIFICATION_TABLE,
                &filter,
                Some(&Order::desc("created_at")),
                None,
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value(row) {
                    Ok(request) => Some(request),
                    Err(e) => {
                        tracing::warn!(%id, error = %e, "skipping undecodable verification row");
                        None
                    }
                }
            })
            .collect())
    }

    /// Persist a document attachment.
    pub async fn attach_documents(
        &self,
        id: VerificationId,
        attachment: &DocumentAttachment,
    ) -> Result<(), StoreError> {
        let patch = encode(VERIFICATION_TABLE, attachment)?;
        self.store
            .update(VERIFICATION_TABLE, &id.to_string(), patch)
            .await
    }

    /// Persist a review decision.
    pub async fn set_status(
        &self,
        id: VerificationId,
        change: StatusChange,
    ) -> Result<(), StoreError> {
        let patch = encode(VERIFICATION_TABLE, &change)?;
        self.store
            .update(VERIFICATION_TABLE, &id.to_string(), patch)
            .await
    }

    /// Upload one document into the bucket.
    pub async fn upload_document(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        self.store
            .upload_file(&self.bucket, path, content_type, bytes)
            .await
    }

    pub fn public_url(&self, path: &str) -> String {
        self.store.public_url(&self.bucket, path)
    }
}

fn encode<T: Serialize>(table: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Decode {
        endpoint: table.to_string(),
        source: e,
    })
}

fn decode<T: for<'de> Deserialize<'de>>(table: &str, row: Value) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::Decode {
        endpoint: table.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use carwatch_core::Timestamp;
    use carwatch_state::VerificationCode;
    use carwatch_store::InMemoryDataStore;
    use serde_json::json;

    fn car_id() -> CarId {
        "6ba7b810-9dad-11d1-80b4-00c04fd430c8".parse().unwrap()
    }

    #[test]
    fn car_label_skips_missing_parts() {
        let car: CarSummary = serde_json::from_value(json!({
            "id": car_id().to_string(),
            "make": "Toyota",
            "model": "Hilux",
            "year": 2019,
            "license_plate": "KH 1234",
        }))
        .unwrap();
        assert_eq!(car.label(), "Toyota Hilux 2019");
        assert_eq!(car.plate_number.as_deref(), Some("KH 1234"));
        assert!(car.owner_email.is_none());

        let bare = CarSummary {
            id: car_id(),
            make: None,
            model: Some(" ".into()),
            year: None,
            plate_number: None,
            owner_email: None,
        };
        assert_eq!(bare.label(), car_id().to_string());
    }

    #[tokio::test]
    async fn car_lookup_and_not_found() {
        let store = InMemoryDataStore::new();
        store.seed(CARS_TABLE, json!({"id": car_id().to_string(), "owner_email": "o@x.io"}));
        let repo = VerificationRepository::new(Arc::new(store));

        let car = repo.car(car_id()).await.unwrap();
        assert_eq!(car.owner_email.as_deref(), Some("o@x.io"));
        assert!(repo.car(CarId::new()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn insert_then_latest_round_trips_columns() {
        let store = InMemoryDataStore::new();
        let repo = VerificationRepository::new(Arc::new(store.clone()));
        let email = EmailAddress::new("o@x.io").unwrap();
        let request = VerificationRequest::issue(
            car_id(),
            email.clone(),
            VerificationCode::parse("Q1W2E3").unwrap(),
            Timestamp::from_epoch_secs(1_770_000_000).unwrap(),
            chrono::Duration::hours(24),
        );
        repo.insert_request(&request).await.unwrap();

        let row = &store.rows(VERIFICATION_TABLE)[0];
        assert_eq!(row["verification_code"], "Q1W2E3");
        assert_eq!(row["status"], "pending");
        assert_eq!(row["is_verified"], false);

        let back = repo.latest_request(car_id(), &email).await.unwrap();
        assert_eq!(back, request);
    }

    #[tokio::test]
    async fn list_skips_rows_that_do_not_decode() {
        let store = InMemoryDataStore::new();
        store.seed(
            VERIFICATION_TABLE,
            json!({"id": "legacy", "verification_code": "bad", "created_at": "2026-01-01T00:00:00Z"}),
        );
        let repo = VerificationRepository::new(Arc::new(store));
        assert!(repo.list(None).await.unwrap().is_empty());
    }
}
