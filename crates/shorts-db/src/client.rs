//! PostgREST client.
//!
//! Thin typed wrapper over the REST data API:
//! - service-key auth (`apikey` + bearer)
//! - pooled HTTP client with timeouts
//! - exponential backoff with jitter
//! - per-operation tracing spans and metrics

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, Instrument};

use crate::error::{DbError, DbResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};

/// A PostgREST filter, e.g. `("uuid", "eq.abc")`.
pub type Filter = (&'static str, String);

/// REST client configuration.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL of the REST API (`https://<project>.supabase.co/rest/v1`)
    pub base_url: String,
    /// Service key used for both `apikey` and bearer auth
    pub service_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl RestConfig {
    /// Create config from environment variables.
    pub fn from_env() -> DbResult<Self> {
        let base_url = std::env::var("REST_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DbError::config_error("REST_URL must be set"))?;
        let service_key = std::env::var("REST_SERVICE_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DbError::config_error("REST_SERVICE_KEY must be set"))?;

        let timeout_secs: u64 = std::env::var("REST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(15);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::from_env(),
        })
    }
}

/// PostgREST client.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    config: RestConfig,
}

impl RestClient {
    /// Create a new REST client.
    pub fn new(config: RestConfig) -> DbResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("shorts-db/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> DbResult<Self> {
        Self::new(RestConfig::from_env()?)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.config.base_url, table)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    /// `GET /{table}?{filters}`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter],
    ) -> DbResult<Vec<T>> {
        let url = &self.table_url(table);
        self.execute("select", table, move || async move {
            let response = self
                .authed(self.http.get(url))
                .query(filters)
                .send()
                .await?;
            Self::read_rows(url, response).await
        })
        .await
    }

    /// `POST /{table}` returning the inserted rows.
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> DbResult<Vec<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = &self.table_url(table);
        self.execute("insert", table, move || async move {
            let response = self
                .authed(self.http.post(url))
                .header("Prefer", "return=representation")
                .json(body)
                .send()
                .await?;
            Self::read_rows(url, response).await
        })
        .await
    }

    /// `PATCH /{table}?{filters}` returning the updated rows.
    pub async fn update<B, T>(&self, table: &str, filters: &[Filter], body: &B) -> DbResult<Vec<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = &self.table_url(table);
        self.execute("update", table, move || async move {
            let response = self
                .authed(self.http.patch(url))
                .query(filters)
                .header("Prefer", "return=representation")
                .json(body)
                .send()
                .await?;
            Self::read_rows(url, response).await
        })
        .await
    }

    /// Reachability probe: a one-row select against `table`.
    pub async fn ping(&self, table: &str) -> DbResult<()> {
        let filters: [Filter; 1] = [("limit", "1".to_string())];
        self.select::<serde_json::Value>(table, &filters).await.map(|_| ())
    }

    async fn read_rows<T: DeserializeOwned>(url: &str, response: Response) -> DbResult<Vec<T>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DbError::from_http_status(
                status.as_u16(),
                format!("{} failed: {}", url, body),
            ));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| DbError::InvalidResponse(format!("{url}: {e}")))
    }

    async fn execute<T, F, Fut>(&self, operation: &str, table: &str, op: F) -> DbResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = DbResult<T>>,
    {
        let span = info_span!("rest_request", operation = %operation, table = %table);
        let start = Instant::now();

        let result = with_retry(&self.config.retry, operation, op)
            .instrument(span)
            .await;

        let latency_ms = start.elapsed().as_millis() as f64;
        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);
        debug!(operation, table, status, latency_ms, "REST request finished");

        result
    }
}
