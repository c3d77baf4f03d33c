//! Error types for the healthdata pipeline and its collaborators.
//!
//! - [`TransformError`] - Record normalization errors
//! - [`ValidationError`] - Required-field violations
//! - [`PipelineError`] - Top-level clean → transform → validate errors
//! - [`BatchError`] - Reading a batch of records from JSON
//! - [`ConfigError`] - Environment configuration errors
//! - [`FetchError`] / [`SubmitError`] - Upstream HTTP errors
//! - [`ServerError`] - HTTP route errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::RecordField;

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors while normalizing records.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransformError {
    /// A timestamp could not be parsed as a date. The whole batch is rejected.
    #[error(
        "Malformed timestamp '{value}' in record {}",
        .record_id.as_deref().unwrap_or("<unknown>")
    )]
    MalformedTimestamp {
        record_id: Option<String>,
        value: String,
    },
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors during required-field validation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// A record lacks a required field (absent or null).
    #[error(
        "Missing required field: {field} in record {}",
        .record_id.as_deref().unwrap_or("<unknown>")
    )]
    MissingField {
        record_id: Option<String>,
        field: RecordField,
    },

    /// A required field name does not name a record field.
    #[error("Unknown record field: {0}")]
    UnknownField(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Errors returned by [`crate::transform::pipeline::process`] and
/// [`crate::transform::pipeline::run`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    /// Normalization failed.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Batch Errors
// =============================================================================

/// Errors while reading a record batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Failed to read file.
    #[error("Failed to read batch: {0}")]
    Io(#[from] std::io::Error),

    /// Records did not deserialize.
    #[error("Invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is not a list of records.
    #[error("Invalid data format. Expected array of records.")]
    NotAnArray,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration from the environment.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// An environment variable holds a value that does not parse.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// Production runs against a real upstream need a key.
    #[error("API_KEY is required in production. Please set it in .env")]
    MissingApiKey,
}

// =============================================================================
// Upstream Client Errors
// =============================================================================

/// Errors from the upstream record fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// Upstream body was not a record list.
    #[error("Invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Every retry attempt failed.
    #[error("Fetch failed after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

/// Errors from the upstream result submitter.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("Submission error ({status}): {body}")]
    Status { status: u16, body: String },

    /// Every retry attempt failed.
    #[error("Submission failed after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<SubmitError>,
    },
}

/// Client or server errors in the 4xx range are not worth retrying,
/// except for timeouts and rate limiting.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    !(400..500).contains(&status) || status == 408 || status == 429
}

impl FetchError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Request(_) => true,
            FetchError::Status { status, .. } => is_retryable_status(*status),
            FetchError::Decode(_) | FetchError::Exhausted { .. } => false,
        }
    }
}

impl SubmitError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SubmitError::Request(_) => true,
            SubmitError::Status { status, .. } => is_retryable_status(*status),
            SubmitError::Exhausted { .. } => false,
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline rejected the batch.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Upstream fetch failed.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// Upstream submission failed.
    #[error("{0}")]
    Submit(#[from] SubmitError),

    /// Configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid request.
    #[error("{0}")]
    BadRequest(String),

    /// Socket error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BatchError> for ServerError {
    fn from(err: BatchError) -> Self {
        ServerError::BadRequest(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
