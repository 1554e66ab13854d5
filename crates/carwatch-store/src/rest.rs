//! Typed client for the hosted backend's table and storage APIs.
//!
//! ## Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/rest/v1/{table}` | Insert (`Prefer: return=representation`) |
//! | GET    | `/rest/v1/{table}?select=*&{col}=eq.{v}&order={col}.desc&limit={n}` | Select |
//! | PATCH  | `/rest/v1/{table}?id=eq.{id}` | Update by id |
//! | POST   | `/storage/v1/object/{bucket}/{path}` | Upload |
//!
//! Public object URLs are `{base}/storage/v1/object/public/{bucket}/{path}`.
//!
//! Every request carries the API key twice: as `apikey` and as
//! `Authorization: Bearer`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::config::{ConfigError, StoreConfig};
use crate::{render_value, DataStore, Filter, Order, StoreError};

const TABLE_PREFIX: &str = "rest/v1";
const STORAGE_PREFIX: &str = "storage/v1/object";
const RETURN_REPRESENTATION: &str = "return=representation";

/// HTTP-backed [`DataStore`].
#[derive(Debug, Clone)]
pub struct RestDataStore {
    http: reqwest::Client,
    base_url: String,
}

impl RestDataStore {
    /// Create a client from configuration.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();

        let mut apikey = HeaderValue::from_str(config.api_key.as_str())
            .map_err(|_| StoreError::Config(ConfigError::InvalidApiKey))?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key.as_str()))
            .map_err(|_| StoreError::Config(ConfigError::InvalidApiKey))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{TABLE_PREFIX}/{table}", self.base_url)
    }

    /// Send a request and return the body of a 2xx response.
    async fn send(&self, endpoint: &str, req: reqwest::RequestBuilder) -> Result<String, StoreError> {
        let resp = req.send().await.map_err(|e| StoreError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                body,
            });
        }

        resp.text().await.map_err(|e| StoreError::Http {
            endpoint: endpoint.into(),
            source: e,
        })
    }

    fn decode_rows(endpoint: &str, body: &str) -> Result<Vec<Value>, StoreError> {
        serde_json::from_str(body).map_err(|e| StoreError::Decode {
            endpoint: endpoint.into(),
            source: e,
        })
    }
}

#[async_trait]
impl DataStore for RestDataStore {
    fn backend_name(&self) -> &str {
        "rest"
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        let endpoint = format!("POST /{TABLE_PREFIX}/{table}");
        tracing::debug!(%endpoint, "inserting row");

        let req = self
            .http
            .post(self.table_url(table))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row);
        let body = self.send(&endpoint, req).await?;

        // An empty representation means the backend accepted the row as sent.
        if body.trim().is_empty() {
            return Ok(row);
        }
        Ok(Self::decode_rows(&endpoint, &body)?
            .into_iter()
            .next()
            .unwrap_or(row))
    }

    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError> {
        let endpoint = format!("GET /{TABLE_PREFIX}/{table}");
        tracing::debug!(%endpoint, %filter, "selecting rows");

        let mut query: Vec<(String, String)> = vec![("select".into(), "*".into())];
        for (column, value) in filter.conditions() {
            query.push((column.clone(), format!("eq.{}", render_value(value))));
        }
        if let Some(order) = order {
            let direction = if order.descending { "desc" } else { "asc" };
            query.push(("order".into(), format!("{}.{direction}", order.column)));
        }
        if let Some(limit) = limit {
            query.push(("limit".into(), limit.to_string()));
        }

        let req = self.http.get(self.table_url(table)).query(&query);
        let body = self.send(&endpoint, req).await?;
        Self::decode_rows(&endpoint, &body)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let endpoint = format!("PATCH /{TABLE_PREFIX}/{table}");
        tracing::debug!(%endpoint, %id, "updating row");

        let req = self
            .http
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch);
        let body = self.send(&endpoint, req).await?;

        if body.trim().is_empty() || Self::decode_rows(&endpoint, &body)?.is_empty() {
            return Err(StoreError::NotFound {
                table: table.to_string(),
                filter: format!("id={id}"),
            });
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
        let endpoint = format!("POST /{STORAGE_PREFIX}/{bucket}");
        tracing::debug!(%endpoint, %path, size = bytes.len(), "uploading object");

        let url = format!("{}/{STORAGE_PREFIX}/{bucket}/{path}", self.base_url);
        let req = self
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        self.send(&endpoint, req).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{STORAGE_PREFIX}/public/{bucket}/{path}", self.base_url)
    }
}
