//! Aggregate statistics over a cleaned, normalized batch.
//!
//! The analyzer trusts its input: it does no filtering of its own and
//! counts every record it is given.

pub mod grouper;

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{AnalysisSummary, Record};

pub use grouper::group_by;

/// Counts and average, without the analysis timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStatistics {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub average_value: Option<f64>,
}

/// Count records per category and average the numeric values.
pub fn calculate_statistics(records: &[Record]) -> RecordStatistics {
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    let mut mean = 0.0;
    let mut numeric = 0usize;

    for record in records {
        if let Some(category) = &record.category {
            *by_category.entry(category.clone()).or_default() += 1;
        }
        if let Some(n) = record.value.as_ref().and_then(|v| v.as_number()).filter(|n| n.is_finite()) {
            numeric += 1;
            // running mean, no intermediate term exceeds the largest input
            let k = numeric as f64;
            mean = mean - mean / k + n / k;
        }
    }

    RecordStatistics {
        total: records.len(),
        by_category,
        average_value: (numeric > 0).then_some(mean).filter(|m| m.is_finite()),
    }
}

/// Build the summary for a batch, stamped with the current time.
pub fn analyze(records: &[Record]) -> AnalysisSummary {
    let stats = calculate_statistics(records);

    AnalysisSummary {
        total_records: stats.total,
        average_value: stats.average_value,
        records_by_category: stats.by_category,
        generated_at: Utc::now(),
    }
}
