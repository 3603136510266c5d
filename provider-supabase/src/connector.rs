//! Supabase REST connector implementation
//!
//! Implements the `RecordStore` trait over PostgREST.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::store::{Record, RecordKey, RecordStore, StoreResult};
use core_runtime::config::SyncConfig;
use core_runtime::logging::redact_if_sensitive;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SupabaseError};

/// Path of the REST interface under the project URL
const REST_PATH: &str = "rest/v1";

/// Ask PostgREST to echo affected rows
const PREFER_REPRESENTATION: &str = "return=representation";

/// Inserts merge into rows whose primary key already exists
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";

/// Supabase REST connector
///
/// Implements `RecordStore` for a Supabase project.
///
/// # Features
///
/// - Service-key authentication (`apikey` and bearer headers)
/// - Batch upsert echoing created rows in submission order
/// - `PATCH`/`DELETE` addressed by `column=eq.value` filters
/// - Typed errors from PostgREST error bodies
/// - One request per call, no retries
///
/// # Example
///
/// ```ignore
/// use provider_supabase::SupabaseConnector;
/// use bridge_traits::store::RecordStore;
///
/// let connector = SupabaseConnector::new(http_client, &config);
/// let rows = connector.list("novels", &["id".to_string(), "title".to_string()]).await?;
/// ```
pub struct SupabaseConnector {
    http_client: Arc<dyn HttpClient>,
    /// Project URL without trailing slash
    base_url: String,
    service_key: String,
    timeout: Duration,
}

impl SupabaseConnector {
    /// Create a new Supabase connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `config` - Supplies the project URL, service key and request timeout
    pub fn new(http_client: Arc<dyn HttpClient>, config: &SyncConfig) -> Self {
        debug!(
            url = %config.base_url(),
            service_key = %redact_if_sensitive("service_key", &config.service_key),
            "Creating Supabase connector"
        );
        Self {
            http_client,
            base_url: config.base_url().to_string(),
            service_key: config.service_key.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, urlencoding::encode(table))
    }

    /// `column=eq.value` filter selecting one row
    fn filter(key: &RecordKey) -> String {
        format!(
            "{}=eq.{}",
            urlencoding::encode(&key.column),
            urlencoding::encode(&key.value_str())
        )
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest::new(method, url)
            .header("apikey", self.service_key.clone())
            .bearer_token(self.service_key.clone())
            .header("Accept", "application/json")
            .header("Prefer", PREFER_REPRESENTATION)
            .timeout(self.timeout)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method;
        let url = request.url.clone();

        let response = self.http_client.execute(request).await?;
        debug!(%method, %url, status = response.status, "Supabase response");

        if response.is_success() {
            Ok(response)
        } else {
            warn!(%method, %url, status = response.status, "Supabase rejected request");
            Err(SupabaseError::from_response(response.status, &response.body))
        }
    }

    /// Decode a row array. An empty body is an empty array.
    fn rows(response: &HttpResponse) -> Result<Vec<Record>> {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&response.body)
            .map_err(|e| SupabaseError::ParseError(format!("expected a JSON array of rows: {}", e)))
    }

    async fn insert_rows(&self, table: &str, records: Vec<Record>) -> Result<Vec<Record>> {
        let request = self
            .request(HttpMethod::Post, self.table_url(table))
            .header("Prefer", PREFER_UPSERT)
            .json(&records)?;
        let response = self.send(request).await?;
        let created = Self::rows(&response)?;

        if created.len() != records.len() {
            warn!(
                table,
                submitted = records.len(),
                returned = created.len(),
                "Insert returned a different number of rows"
            );
        }
        Ok(created)
    }

    async fn patch_row(&self, table: &str, key: &RecordKey, record: Record) -> Result<Record> {
        let url = format!("{}?{}", self.table_url(table), Self::filter(key));
        let request = self.request(HttpMethod::Patch, url).json(&record)?;
        let response = self.send(request).await?;

        let mut rows = Self::rows(&response)?;
        match rows.len() {
            0 => Err(SupabaseError::NoMatchingRow {
                table: table.to_string(),
                key: key.to_string(),
            }),
            1 => Ok(rows.remove(0)),
            count => Err(SupabaseError::AmbiguousMatch {
                table: table.to_string(),
                key: key.to_string(),
                count,
            }),
        }
    }

    async fn delete_row(&self, table: &str, key: &RecordKey) -> Result<()> {
        let url = format!("{}?{}", self.table_url(table), Self::filter(key));
        let response = self.send(self.request(HttpMethod::Delete, url)).await?;

        if Self::rows(&response)?.is_empty() {
            debug!(table, key = %key, "Delete matched no row");
        }
        Ok(())
    }

    async fn select_rows(&self, table: &str, columns: &[String]) -> Result<Vec<Record>> {
        let select = if columns.is_empty() {
            "*".to_string()
        } else {
            columns
                .iter()
                .map(|c| urlencoding::encode(c).into_owned())
                .collect::<Vec<_>>()
                .join(",")
        };
        let url = format!("{}?select={}", self.table_url(table), select);
        let response = self.send(self.request(HttpMethod::Get, url)).await?;
        Self::rows(&response)
    }
}

#[async_trait]
impl RecordStore for SupabaseConnector {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn create(&self, table: &str, records: Vec<Record>) -> StoreResult<Vec<Record>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let created = self.insert_rows(table, records).await?;
        info!(table, created = created.len(), "Inserted rows into Supabase");
        Ok(created)
    }

    #[instrument(skip(self, record), fields(key = %key))]
    async fn update_one(&self, table: &str, key: &RecordKey, record: Record) -> StoreResult<Record> {
        Ok(self.patch_row(table, key, record).await?)
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn delete_one(&self, table: &str, key: &RecordKey) -> StoreResult<()> {
        Ok(self.delete_row(table, key).await?)
    }

    #[instrument(skip(self))]
    async fn list(&self, table: &str, columns: &[String]) -> StoreResult<Vec<Record>> {
        Ok(self.select_rows(table, columns).await?)
    }
}
