//! Fetch record batches from the upstream records API.
//!
//! Accepts either the enveloped form `{ "data": [...], "status": "ok" }`
//! or a bare JSON array.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, info};

use super::{http_client, retry, RetryPolicy};
use crate::config::{join_url, Config};
use crate::error::FetchError;
use crate::models::{ApiResponse, Record};

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped(ApiResponse<T>),
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_data(self) -> T {
        match self {
            Envelope::Wrapped(response) => response.data,
            Envelope::Bare(data) => data,
        }
    }
}

/// Client for the upstream records API.
#[derive(Debug, Clone)]
pub struct DataFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    policy: RetryPolicy,
}

impl DataFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            policy: RetryPolicy::from_config(config),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Single GET against `endpoint` (relative to the base URL, or absolute).
    pub async fn fetch_data<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = join_url(&self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(params)
            .send()
            .await
            .inspect_err(|e| error!(%url, error = %e, "no response from records API"))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(%url, status = status.as_u16(), %body, "records API error");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.into_data())
    }

    /// [`fetch_data`](Self::fetch_data) with retries and exponential backoff.
    pub async fn fetch_with_retry<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        retry(self.policy, "fetch", FetchError::is_retryable, move || {
            self.fetch_data::<T>(endpoint, params)
        })
        .await
        .map_err(|(attempts, last)| match attempts {
            1 => last,
            _ => FetchError::Exhausted {
                attempts,
                last: Box::new(last),
            },
        })
    }

    /// Fetch a raw record batch, retrying transient failures.
    pub async fn fetch_records(&self, endpoint: &str) -> Result<Vec<Record>, FetchError> {
        let records: Vec<Record> = self.fetch_with_retry(endpoint, &[]).await?;
        info!(count = records.len(), endpoint, "fetched records");
        Ok(records)
    }
}
