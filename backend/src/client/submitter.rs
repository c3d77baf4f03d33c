//! Post analysis results to the downstream endpoint.

use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use super::{http_client, retry, RetryPolicy};
use crate::config::Config;
use crate::error::SubmitError;
use crate::models::SubmissionPayload;

/// Header carrying the per-payload idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Client for the results endpoint.
#[derive(Debug, Clone)]
pub struct DataSubmitter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    policy: RetryPolicy,
}

impl DataSubmitter {
    pub fn new(config: &Config) -> Result<Self, SubmitError> {
        Ok(Self {
            client: http_client(config)?,
            endpoint: config.post_endpoint.clone(),
            api_key: config.api_key.clone(),
            policy: RetryPolicy::from_config(config),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Single POST of the payload. Returns the upstream JSON body
    /// (`Null` when empty, a string when not JSON).
    pub async fn submit_results(
        &self,
        payload: &SubmissionPayload,
        idempotency_key: &str,
    ) -> Result<Value, SubmitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .json(payload)
            .send()
            .await
            .inspect_err(|e| error!(endpoint = %self.endpoint, error = %e, "no response from results endpoint"))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = status.as_u16(), %body, "submission error");
            return Err(SubmitError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!(idempotency_key, record_count = payload.record_count, "submitted results");
        Ok(parse_body(body))
    }

    /// Submit with retries. One idempotency key is generated per payload and
    /// reused on every attempt so the receiver can drop replays.
    pub async fn submit_with_retry(&self, payload: &SubmissionPayload) -> Result<Value, SubmitError> {
        let key = Uuid::new_v4().to_string();
        let key = key.as_str();

        retry(self.policy, "submit", SubmitError::is_retryable, move || {
            self.submit_results(payload, key)
        })
        .await
        .map_err(|(attempts, last)| match attempts {
            1 => last,
            _ => SubmitError::Exhausted {
                attempts,
                last: Box::new(last),
            },
        })
    }
}

fn parse_body(body: String) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::client::test_support::{config_for, spawn};
    use crate::models::{Record, SubmissionStatus};
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Seen {
        keys: Arc<Mutex<Vec<String>>>,
        bodies: Arc<Mutex<Vec<Value>>>,
    }

    async fn fail_once(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let key = headers
            .get(IDEMPOTENCY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let attempt = {
            let mut keys = seen.keys.lock().unwrap();
            keys.push(key);
            keys.len()
        };
        seen.bodies.lock().unwrap().push(body);

        if attempt == 1 {
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": "upstream hiccup" })))
        } else {
            (StatusCode::OK, Json(json!({ "id": "sub_1", "message": "ok" })))
        }
    }

    fn payload() -> SubmissionPayload {
        let records = vec![Record::new("1", "P1", "bp").with_value(120.0)];
        SubmissionPayload::new(analyze(&records), records.len(), SubmissionStatus::Completed)
    }

    #[tokio::test]
    async fn test_retry_reuses_idempotency_key() {
        let seen = Seen::default();
        let router = Router::new()
            .route("/results", post(fail_once))
            .with_state(seen.clone());
        let base = spawn(router).await;

        let submitter = DataSubmitter::new(&config_for(&base, 3)).unwrap();
        let response = submitter.submit_with_retry(&payload()).await.unwrap();

        assert_eq!(response["id"], "sub_1");
        let keys = seen.keys.lock().unwrap();
        assert_eq!(keys.len(), 2);
        assert!(!keys[0].is_empty());
        assert_eq!(keys[0], keys[1]);

        let bodies = seen.bodies.lock().unwrap();
        assert_eq!(bodies[0]["status"], "completed");
        assert_eq!(bodies[0]["recordCount"], 1);
        assert_eq!(bodies[0]["analysis"]["totalRecords"], 1);
    }

    #[tokio::test]
    async fn test_rejected_payload_is_not_retried() {
        let seen = Seen::default();
        let router = Router::new()
            .route(
                "/results",
                post(|State(seen): State<Seen>| async move {
                    seen.keys.lock().unwrap().push(String::new());
                    (StatusCode::UNPROCESSABLE_ENTITY, "bad payload")
                }),
            )
            .with_state(seen.clone());
        let base = spawn(router).await;

        let submitter = DataSubmitter::new(&config_for(&base, 3)).unwrap();
        let err = submitter.submit_with_retry(&payload()).await.unwrap_err();

        assert_eq!(seen.keys.lock().unwrap().len(), 1);
        match err {
            SubmitError::Status { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body, "bad payload");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(String::new()), Value::Null);
        assert_eq!(parse_body("{\"ok\":true}".into()), json!({ "ok": true }));
        assert_eq!(parse_body("accepted".into()), json!("accepted"));
    }
}
