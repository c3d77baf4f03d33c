//! Deduplicate and filter raw records.
//!
//! ```text
//! raw batch                         cleaned batch
//! ┌──────────────────────────┐     ┌──────────────────────────┐
//! │ id 1, P001, bp           │     │ id 1, P001, bp           │
//! │ id 2, P002, hr           │  →  │ id 2, P002, hr           │
//! │ id 1, P009, temp (dup)   │     └──────────────────────────┘
//! │ id 3, <none>, bp         │
//! └──────────────────────────┘
//! ```
//!
//! The first occurrence of an `id` wins, even when it is later dropped for
//! being incomplete. Nothing here fails: unusable records are excluded.

use serde::Serialize;
use std::collections::HashSet;

use crate::models::Record;

/// What the cleaner dropped and why.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub received: usize,
    pub duplicates: usize,
    pub incomplete: usize,
    pub kept: usize,
}

impl CleanReport {
    pub fn dropped(&self) -> usize {
        self.duplicates + self.incomplete
    }
}

/// Deduplicate by `id` and drop incomplete records, preserving input order.
pub fn clean(records: Vec<Record>) -> Vec<Record> {
    clean_with_report(records).0
}

/// Same as [`clean`], also counting what was dropped.
pub fn clean_with_report(records: Vec<Record>) -> (Vec<Record>, CleanReport) {
    let mut report = CleanReport {
        received: records.len(),
        ..CleanReport::default()
    };
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        let Some(id) = record.id.as_deref() else {
            report.incomplete += 1;
            continue;
        };
        if !seen.insert(id.to_string()) {
            report.duplicates += 1;
            continue;
        }
        if !record.is_complete() {
            report.incomplete += 1;
            continue;
        }
        kept.push(record);
    }

    report.kept = kept.len();
    (kept, report)
}
