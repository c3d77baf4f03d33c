//! Record processing stages.
//!
//! - Cleaner: deduplicate and drop incomplete records
//! - Normalize: canonical timestamps, numeric values
//! - Pipeline: clean → transform → validate → analyze

pub mod cleaner;
pub mod normalize;
pub mod pipeline;

pub use cleaner::{clean, clean_with_report, CleanReport};
pub use normalize::{coerce_value, normalize_timestamp, parse_timestamp, transform, transform_record};
pub use pipeline::*;
