//! Required-field validation for record batches.
//!
//! Validation is all-or-nothing: the first record missing a required field
//! rejects the batch, naming the record and the field.
//!
//! # Example
//!
//! ```rust,ignore
//! use healthdata::{validate, Record, RecordField};
//!
//! let records = vec![Record::new("1", "P001", "bp")];
//! assert!(validate(&records, &[RecordField::Id, RecordField::Category]).is_ok());
//! assert!(validate(&records, &[RecordField::Timestamp]).is_err());
//! ```

use crate::error::ValidationError;
use crate::models::{Record, RecordField};

/// Fields every processed record must carry unless the caller says otherwise.
pub const DEFAULT_REQUIRED_FIELDS: [RecordField; 3] =
    [RecordField::Id, RecordField::SubjectId, RecordField::Category];

/// Check every record for every required field, in order.
///
/// # Returns
/// * `Ok(())` if every record has every field
/// * `Err(ValidationError::MissingField)` for the first violation found
pub fn validate(records: &[Record], required_fields: &[RecordField]) -> Result<(), ValidationError> {
    for record in records {
        for &field in required_fields {
            if !record.has_field(field) {
                return Err(ValidationError::MissingField {
                    record_id: record.id.clone(),
                    field,
                });
            }
        }
    }
    Ok(())
}

/// Simple yes/no variant of [`validate`].
pub fn is_valid(records: &[Record], required_fields: &[RecordField]) -> bool {
    validate(records, required_fields).is_ok()
}

/// Parse wire field names (`"subjectId"`, `"category"`, ...).
pub fn parse_required_fields<S: AsRef<str>>(names: &[S]) -> Result<Vec<RecordField>, ValidationError> {
    names.iter().map(|name| name.as_ref().parse()).collect()
}
