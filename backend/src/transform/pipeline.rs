//! High-level pipeline API: clean → transform → validate → analyze.
//!
//! Every call works on its own batch and holds no state between calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use healthdata::{run, ProcessOptions};
//!
//! let result = run(raw_records, &ProcessOptions::default())?;
//! println!("{} records, average {:?}", result.analysis.total_records, result.analysis.average_value);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cleaner::{clean_with_report, CleanReport};
use super::normalize::transform;
use crate::analysis::analyze;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{AnalysisSummary, Record, RecordField};
use crate::validation::{validate, DEFAULT_REQUIRED_FIELDS};

/// Options for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOptions {
    /// Fields every record must carry after transformation.
    pub required_fields: Vec<RecordField>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            required_fields: DEFAULT_REQUIRED_FIELDS.to_vec(),
        }
    }
}

impl ProcessOptions {
    pub fn with_required_fields(mut self, fields: Vec<RecordField>) -> Self {
        self.required_fields = fields;
        self
    }
}

/// Records that passed clean → transform → validate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedBatch {
    pub records: Vec<Record>,
    pub report: CleanReport,
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    /// Normalized records.
    pub records: Vec<Record>,

    /// Summary over `records`.
    pub analysis: AnalysisSummary,

    /// What cleaning dropped.
    pub report: CleanReport,
}

/// Clean, normalize and validate a raw batch.
pub fn process(raw: Vec<Record>, options: &ProcessOptions) -> PipelineResult<ProcessedBatch> {
    let (cleaned, report) = clean_with_report(raw);
    info!(
        received = report.received,
        kept = report.kept,
        duplicates = report.duplicates,
        incomplete = report.incomplete,
        "cleaned batch"
    );

    let records = transform(cleaned).inspect_err(|e| warn!(error = %e, "transform rejected batch"))?;
    debug!(records = records.len(), "normalized timestamps and values");

    validate(&records, &options.required_fields)
        .inspect_err(|e| warn!(error = %e, "validation rejected batch"))?;

    Ok(ProcessedBatch { records, report })
}

/// Run the full pipeline, returning the normalized records and their summary.
pub fn run(raw: Vec<Record>, options: &ProcessOptions) -> Result<PipelineOutput, PipelineError> {
    let ProcessedBatch { records, report } = process(raw, options)?;
    let analysis = analyze(&records);

    info!(
        total = analysis.total_records,
        categories = analysis.records_by_category.len(),
        average = ?analysis.average_value,
        "analyzed batch"
    );

    Ok(PipelineOutput {
        records,
        analysis,
        report,
    })
}
