//! Consul's snapshot HTTP API as the snapshot store.
//!
//! `GET /v1/snapshot` returns a gzipped archive with the raft index it was
//! taken at in `X-Consul-Index`. `PUT /v1/snapshot` replaces the cluster
//! state with an archive from an earlier GET.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder};
use snapshot_core::{ServiceError, Snapshot, SnapshotStore};
use tracing::{debug, warn};

use crate::config::{ClientOptions, ConsulOptions};

const SNAPSHOT_PATH: &str = "/v1/snapshot";
pub const INDEX_HEADER: &str = "X-Consul-Index";
pub const TOKEN_HEADER: &str = "X-Consul-Token";

const INITIAL_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ConsulSnapshotStore {
    client: Client,
    base_url: String,
    token: Option<String>,
    datacenter: Option<String>,
    stale: bool,
    max_attempts: u32,
}

impl ConsulSnapshotStore {
    pub fn new(consul: &ConsulOptions, client: &ClientOptions) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(client.request_timeout)
            .build()
            .map_err(|e| ServiceError::new(format!("building HTTP client: {}", e)))?;
        Ok(Self {
            client: http,
            base_url: base_url(&consul.address, consul.use_tls),
            token: consul.token.clone(),
            datacenter: consul.datacenter.clone(),
            stale: consul.stale,
            max_attempts: client.max_attempts.max(1),
        })
    }

    pub fn snapshot_url(&self) -> String {
        format!("{}{}", self.base_url, SNAPSHOT_PATH)
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let mut request = self.client.request(method, self.snapshot_url());
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }
        if let Some(dc) = &self.datacenter {
            request = request.query(&[("dc", dc.as_str())]);
        }
        request
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, FetchError> {
        let mut request = self.request(Method::GET);
        if self.stale {
            request = request.query(&[("stale", "")]);
        }
        let response = request.send().await.map_err(|e| {
            FetchError::transient(format!("GET {}: {}", SNAPSHOT_PATH, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("GET {} returned {}: {}", SNAPSHOT_PATH, status, body.trim());
            return Err(if status.is_server_error() {
                FetchError::transient(message)
            } else {
                FetchError::permanent(message)
            });
        }

        let index = parse_index(response.headers()).map_err(FetchError::Permanent)?;
        let data = response.bytes().await.map_err(|e| {
            FetchError::transient(format!("reading snapshot body: {}", e))
        })?;
        Ok(Snapshot {
            data: data.to_vec(),
            index,
        })
    }
}

/// Snapshot GET failure. Only transport errors and 5xx answers are retried.
#[derive(Debug)]
enum FetchError {
    Transient(ServiceError),
    Permanent(ServiceError),
}

impl FetchError {
    fn transient(message: String) -> Self {
        FetchError::Transient(ServiceError::new(message))
    }

    fn permanent(message: String) -> Self {
        FetchError::Permanent(ServiceError::new(message))
    }
}

#[async_trait]
impl SnapshotStore for ConsulSnapshotStore {
    async fn save(&self) -> Result<Snapshot, ServiceError> {
        let mut attempt = 1;
        loop {
            match self.fetch_snapshot().await {
                Ok(snapshot) => {
                    debug!(index = snapshot.index, len = snapshot.data.len(), "snapshot taken");
                    return Ok(snapshot);
                }
                Err(FetchError::Transient(e)) if attempt < self.max_attempts => {
                    let delay = retry_delay(attempt);
                    warn!(attempt, error = %e, ?delay, "snapshot request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(FetchError::Transient(e)) | Err(FetchError::Permanent(e)) => return Err(e),
            }
        }
    }

    // Not retried: a restore that timed out may still have been applied.
    async fn restore(&self, snapshot: Vec<u8>) -> Result<(), ServiceError> {
        debug!(len = snapshot.len(), "restoring snapshot");
        let response = self
            .request(Method::PUT)
            .body(snapshot)
            .send()
            .await
            .map_err(|e| ServiceError::new(format!("PUT {}: {}", SNAPSHOT_PATH, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::new(format!(
                "PUT {} returned {}: {}",
                SNAPSHOT_PATH,
                status,
                body.trim()
            )));
        }
        Ok(())
    }
}

/// Normalise a consul address into a base URL without trailing slash.
pub fn base_url(address: &str, use_tls: bool) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.contains("://") {
        address.to_string()
    } else if use_tls {
        format!("https://{}", address)
    } else {
        format!("http://{}", address)
    }
}

/// Raft index from the `X-Consul-Index` response header.
pub fn parse_index(headers: &HeaderMap) -> Result<u64, ServiceError> {
    let value = headers
        .get(INDEX_HEADER)
        .ok_or_else(|| ServiceError::new(format!("response has no {} header", INDEX_HEADER)))?;
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| ServiceError::new(format!("invalid {} header: {:?}", INDEX_HEADER, value)))
}

/// Exponential backoff before retry number `attempt` (1-based).
fn retry_delay(attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    INITIAL_BACKOFF.saturating_mul(factor).min(MAX_BACKOFF)
}
