//! # Healthdata - record cleaning, validation and analysis
//!
//! Healthdata takes a batch of raw healthcare records, cleans and normalizes
//! it, checks required fields and summarizes it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Raw records │────▶│   Cleaner   │────▶│  Transform  │────▶│  Analyzer   │
//! │   (JSON)    │     │ (dedup/drop)│     │ + validate  │     │  (summary)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use healthdata::{run, ProcessOptions, Record};
//!
//! let raw = vec![Record::new("1", "P001", "blood_pressure").with_value("120")];
//! let output = run(raw, &ProcessOptions::default())?;
//! println!("{} records, average {:?}", output.analysis.total_records, output.analysis.average_value);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Record, AnalysisSummary, SubmissionPayload)
//! - [`transform`] - Cleaner, normalizer and pipeline
//! - [`validation`] - Required-field checks
//! - [`analysis`] - Statistics and grouping
//! - [`config`] - Environment configuration
//! - [`client`] - Upstream fetch/submit with retry
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Pipeline stages
pub mod transform;
pub mod validation;
pub mod analysis;

// Runtime
pub mod config;
pub mod logging;
pub mod client;
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    BatchError,
    ConfigError,
    FetchError,
    PipelineError,
    ServerError,
    SubmitError,
    TransformError,
    ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    parse_batch,
    parse_records,
    read_batch,
    AnalysisSummary,
    ApiResponse,
    Record,
    RecordField,
    RecordValue,
    SubmissionPayload,
    SubmissionStatus,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    clean,
    clean_with_report,
    process,
    run,
    transform,
    CleanReport,
    PipelineOutput,
    ProcessOptions,
    ProcessedBatch,
};

pub use validation::{is_valid, parse_required_fields, validate, DEFAULT_REQUIRED_FIELDS};

pub use analysis::{analyze, calculate_statistics, group_by, RecordStatistics};

// =============================================================================
// Re-exports - Runtime
// =============================================================================

pub use config::Config;
pub use client::{DataFetcher, DataSubmitter, RetryPolicy};

// Server
pub mod server {
    pub use crate::api::server::{app_router, start_server, AppState};
}
