//! REST API request and response types.
//!
//! Every response carries `success`; failures use the envelope built by
//! [`error_response`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{AnalysisSummary, Record};
use crate::transform::{CleanReport, PipelineOutput};

/// `GET /api/fetch` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    pub success: bool,
    /// Raw records, not yet cleaned.
    pub data: Vec<Record>,
    pub timestamp: DateTime<Utc>,
}

impl FetchResponse {
    pub fn new(data: Vec<Record>) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// `POST /api/process` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    /// Expected to be an array of records; checked by the handler.
    #[serde(default)]
    pub data: Value,

    /// Overrides the default required fields (`id`, `subjectId`, `category`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_fields: Option<Vec<String>>,
}

/// `POST /api/process` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub processed_data: Vec<Record>,
    pub analysis: AnalysisSummary,
    pub report: CleanReport,
    pub timestamp: DateTime<Utc>,
}

impl From<PipelineOutput> for ProcessResponse {
    fn from(output: PipelineOutput) -> Self {
        ProcessResponse {
            success: true,
            processed_data: output.records,
            analysis: output.analysis,
            report: output.report,
            timestamp: Utc::now(),
        }
    }
}

/// Acknowledgement returned for a submission in mock mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub records_processed: usize,
}

/// What answered a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmitReply {
    /// Mock mode acknowledgement.
    Receipt(SubmissionReceipt),
    /// Body returned by the results endpoint, passed through as-is.
    Upstream(Value),
}

/// `POST /api/submit` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub response: SubmitReply,
    pub timestamp: DateTime<Utc>,
}

impl SubmitResponse {
    pub fn new(response: SubmitReply) -> Self {
        Self {
            success: true,
            response,
            timestamp: Utc::now(),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "success": false,
        "error": error,
    })
}
