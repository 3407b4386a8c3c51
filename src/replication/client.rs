//! Peer Client
//!
//! Thin `reqwest` wrapper for the two remote calls a node makes to another:
//! `/request` (used to stream SYNC batches) and `/reverse_sync`.

use crate::dispatcher::protocol::{
    CacheRequest, CacheResponse, ENDPOINT_REQUEST, ENDPOINT_REVERSE_SYNC, ErrorResponse,
    ReverseSyncRequest, ReverseSyncResponse,
};

use anyhow::Result;
use serde::Serialize;
use std::time::Duration;

const REVERSE_SYNC_ATTEMPTS: usize = 3;

#[derive(Clone, Default)]
pub struct PeerClient {
    http_client: reqwest::Client,
}

impl PeerClient {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    /// Executes one request against the dispatcher at `address`. Sent once.
    pub async fn request(&self, address: &str, request: &CacheRequest) -> Result<CacheResponse> {
        let url = format!("{}{}", base_url(address), ENDPOINT_REQUEST);
        let response = self.http_client.post(url.clone()).json(request).send().await?;
        let response = check_status(&url, response).await?;
        Ok(response.json().await?)
    }

    /// Asks `peer` to connect back to `own_address` and push its full state.
    ///
    /// Returns once the peer finished (or aborted) the push.
    pub async fn reverse_sync(&self, peer: &str, own_address: &str) -> Result<bool> {
        let url = format!("{}{}", base_url(peer), ENDPOINT_REVERSE_SYNC);
        let payload = ReverseSyncRequest {
            address: own_address.to_string(),
        };

        let response = self
            .post_with_retry(url.clone(), &payload, REVERSE_SYNC_ATTEMPTS)
            .await?;
        let response = check_status(&url, response).await?;
        let ack: ReverseSyncResponse = response.json().await?;
        Ok(ack.success)
    }

    /// Retries connection-level failures with exponential backoff and jitter.
    /// HTTP error statuses are returned as they are.
    async fn post_with_retry<T: Serialize>(
        &self,
        url: String,
        payload: &T,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            match self.http_client.post(url.clone()).json(payload).send().await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    tracing::debug!("POST {} failed (attempt {}): {}", url, attempt + 1, e);
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

/// Turns `host:port` (or a full URL) into a base URL without trailing slash.
pub fn base_url(address: &str) -> String {
    let trimmed = address.trim();
    let normalized = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    normalized.trim_end_matches('/').to_string()
}

async fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    Err(anyhow::anyhow!("{} returned {}: {}", url, status, message))
}
