//! Domain models for the healthdata pipeline.
//!
//! - [`Record`] - One observation tied to a subject and a category
//! - [`RecordValue`] - Numeric or textual measurement
//! - [`RecordField`] - Names of record fields (validation, grouping)
//! - [`AnalysisSummary`] - Aggregate statistics over a batch
//! - [`SubmissionPayload`] - What gets posted downstream

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{BatchError, ValidationError};

// =============================================================================
// Record Value
// =============================================================================

/// Largest integer an f64 holds exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A measurement: either a number or a free-form string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Number(f64),
    Text(String),
}

impl RecordValue {
    /// Numeric value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RecordValue::Number(n) => Some(*n),
            RecordValue::Text(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, RecordValue::Number(_))
    }
}

fn is_whole(n: f64) -> bool {
    n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER
}

// Whole numbers go out as JSON integers (`42`, not `42.0`).
impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordValue::Number(n) if is_whole(*n) => serializer.serialize_i64(*n as i64),
            RecordValue::Number(n) => serializer.serialize_f64(*n),
            RecordValue::Text(t) => serializer.serialize_str(t),
        }
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Number(n) if is_whole(*n) => write!(f, "{}", *n as i64),
            RecordValue::Number(n) => write!(f, "{}", n),
            RecordValue::Text(t) => f.write_str(t),
        }
    }
}

impl From<f64> for RecordValue {
    fn from(n: f64) -> Self {
        RecordValue::Number(n)
    }
}

impl From<&str> for RecordValue {
    fn from(s: &str) -> Self {
        RecordValue::Text(s.to_string())
    }
}

// =============================================================================
// Record Field
// =============================================================================

/// Name of a [`Record`] field, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordField {
    Id,
    #[serde(alias = "patientId")]
    SubjectId,
    #[serde(alias = "recordType")]
    Category,
    Value,
    Timestamp,
    Metadata,
}

impl RecordField {
    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordField::Id => "id",
            RecordField::SubjectId => "subjectId",
            RecordField::Category => "category",
            RecordField::Value => "value",
            RecordField::Timestamp => "timestamp",
            RecordField::Metadata => "metadata",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(RecordField::Id),
            "subjectId" | "patientId" => Ok(RecordField::SubjectId),
            "category" | "recordType" => Ok(RecordField::Category),
            "value" => Ok(RecordField::Value),
            "timestamp" => Ok(RecordField::Timestamp),
            "metadata" => Ok(RecordField::Metadata),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

// =============================================================================
// Record
// =============================================================================

/// A single observation.
///
/// Every field is optional on input so that incomplete records survive
/// deserialization and can be dropped by the cleaner or rejected by validation.
/// JSON `null` is read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireRecord")]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<RecordValue>,

    /// ISO-8601 after normalization; anything date-like before.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Record as it arrives on the wire. Accepts the legacy `patientId` and
/// `recordType` names next to the current ones; the current name wins when
/// both are present.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    #[serde(default, deserialize_with = "string_like")]
    id: Option<String>,

    #[serde(default, deserialize_with = "string_like")]
    subject_id: Option<String>,

    #[serde(default, deserialize_with = "string_like")]
    patient_id: Option<String>,

    #[serde(default, deserialize_with = "string_like")]
    category: Option<String>,

    #[serde(default, deserialize_with = "string_like")]
    record_type: Option<String>,

    #[serde(default)]
    value: Option<RecordValue>,

    #[serde(default, deserialize_with = "timestamp_like")]
    timestamp: Option<String>,

    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl From<WireRecord> for Record {
    fn from(wire: WireRecord) -> Self {
        Record {
            id: wire.id,
            subject_id: wire.subject_id.or(wire.patient_id),
            category: wire.category.or(wire.record_type),
            value: wire.value,
            timestamp: wire.timestamp,
            metadata: wire.metadata,
        }
    }
}

/// Accept strings and numbers for identifier-like fields.
fn string_like<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

/// Strings pass through for later parsing. Numbers are epoch milliseconds;
/// one outside chrono's range is kept as text and fails normalization.
fn timestamp_like<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(epoch_millis_to_iso(&n).unwrap_or_else(|| n.to_string()))),
        Some(other) => Err(D::Error::custom(format!(
            "expected a date string or epoch milliseconds, found {}",
            other
        ))),
    }
}

/// ISO-8601 form of a JSON number read as milliseconds since the Unix epoch.
pub fn epoch_millis_to_iso(n: &Number) -> Option<String> {
    let millis = match n.as_i64() {
        Some(ms) => ms,
        // saturating cast; out-of-range values are rejected by chrono below
        None => n.as_f64().filter(|f| f.is_finite())?.round() as i64,
    };
    DateTime::from_timestamp_millis(millis).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn non_empty(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}

impl Record {
    /// Create a record with its three identifying fields.
    pub fn new(
        id: impl Into<String>,
        subject_id: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            subject_id: Some(subject_id.into()),
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<RecordValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Has non-empty `id`, `subjectId` and `category`.
    pub fn is_complete(&self) -> bool {
        non_empty(&self.id) && non_empty(&self.subject_id) && non_empty(&self.category)
    }

    /// Whether the field is present (not absent, not null).
    pub fn has_field(&self, field: RecordField) -> bool {
        match field {
            RecordField::Id => self.id.is_some(),
            RecordField::SubjectId => self.subject_id.is_some(),
            RecordField::Category => self.category.is_some(),
            RecordField::Value => self.value.is_some(),
            RecordField::Timestamp => self.timestamp.is_some(),
            RecordField::Metadata => self.metadata.is_some(),
        }
    }

    /// String form of a field, used as a grouping key.
    pub fn field_key(&self, field: RecordField) -> Option<String> {
        match field {
            RecordField::Id => self.id.clone(),
            RecordField::SubjectId => self.subject_id.clone(),
            RecordField::Category => self.category.clone(),
            RecordField::Value => self.value.as_ref().map(ToString::to_string),
            RecordField::Timestamp => self.timestamp.clone(),
            RecordField::Metadata => self
                .metadata
                .as_ref()
                .map(|m| Value::Object(m.clone()).to_string()),
        }
    }
}

// =============================================================================
// Batches
// =============================================================================

/// Deserialize a JSON array of records.
pub fn parse_records(value: Value) -> Result<Vec<Record>, BatchError> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        _ => Err(BatchError::NotAnArray),
    }
}

/// Deserialize a batch given either as a bare array or as `{ "data": [...] }`.
pub fn parse_batch(value: Value) -> Result<Vec<Record>, BatchError> {
    match value {
        Value::Object(mut obj) => match obj.remove("data") {
            Some(data) => parse_records(data),
            None => Err(BatchError::NotAnArray),
        },
        other => parse_records(other),
    }
}

/// Read a batch from a JSON file.
pub fn read_batch(path: &Path) -> Result<Vec<Record>, BatchError> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    parse_batch(value)
}

// =============================================================================
// Analysis Summary
// =============================================================================

/// Aggregate statistics over one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_records: usize,

    /// Omitted when no record carries a numeric value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_value: Option<f64>,

    #[serde(alias = "recordsByType")]
    pub records_by_category: BTreeMap<String, usize>,

    #[serde(alias = "timestamp")]
    pub generated_at: DateTime<Utc>,
}

// =============================================================================
// Submission
// =============================================================================

/// Outcome reported alongside a submitted summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Completed,
    Failed,
    Pending,
}

/// Payload posted to the downstream results endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub analysis: AnalysisSummary,

    #[serde(default)]
    pub record_count: usize,

    pub status: SubmissionStatus,

    #[serde(default = "Utc::now")]
    pub processed_at: DateTime<Utc>,
}

impl SubmissionPayload {
    pub fn new(analysis: AnalysisSummary, record_count: usize, status: SubmissionStatus) -> Self {
        Self {
            analysis,
            record_count,
            status,
            processed_at: Utc::now(),
        }
    }
}

/// Envelope used by the upstream records API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_accepts_original_wire_names() {
        let record: Record = serde_json::from_value(json!({
            "id": 7,
            "patientId": "P001",
            "recordType": "blood_pressure",
            "value": 120,
            "timestamp": "2024-01-15T10:30:00.000Z"
        }))
        .unwrap();

        assert_eq!(record.id.as_deref(), Some("7"));
        assert_eq!(record.subject_id.as_deref(), Some("P001"));
        assert_eq!(record.category.as_deref(), Some("blood_pressure"));
        assert_eq!(record.value, Some(RecordValue::Number(120.0)));
    }

    #[test]
    fn test_current_names_win_over_legacy_names() {
        let records = parse_batch(json!([
            { "id": "1", "subjectId": "P001", "patientId": "LEGACY", "category": "hr", "recordType": "old" },
            { "id": "2", "patientId": "P002", "subjectId": null, "recordType": "bp" }
        ]))
        .unwrap();

        assert_eq!(records[0].subject_id.as_deref(), Some("P001"));
        assert_eq!(records[0].category.as_deref(), Some("hr"));
        assert_eq!(records[1].subject_id.as_deref(), Some("P002"));
        assert_eq!(records[1].category.as_deref(), Some("bp"));

        let value = serde_json::to_value(&records[0]).unwrap();
        assert!(value.get("patientId").is_none());
        assert!(value.get("recordType").is_none());
    }

    #[test]
    fn test_numeric_timestamps_are_epoch_millis() {
        let records = parse_batch(json!([
            { "id": "1", "timestamp": 1705314600000u64 },
            { "id": "2", "timestamp": 1.7053146e12 },
            { "id": "3", "timestamp": -86400000 },
            { "id": "4", "timestamp": 1e300 },
            { "id": "5", "timestamp": "20240115" }
        ]))
        .unwrap();

        assert_eq!(records[0].timestamp.as_deref(), Some("2024-01-15T10:30:00.000Z"));
        assert_eq!(records[1].timestamp.as_deref(), Some("2024-01-15T10:30:00.000Z"));
        assert_eq!(records[2].timestamp.as_deref(), Some("1969-12-31T00:00:00.000Z"));
        assert_eq!(records[3].timestamp.as_deref(), Some("1e300"));
        assert_eq!(records[4].timestamp.as_deref(), Some("20240115"));
    }

    #[test]
    fn test_null_fields_are_absent() {
        let record: Record = serde_json::from_value(json!({
            "id": "1",
            "subjectId": null,
            "category": "hr",
            "value": null
        }))
        .unwrap();

        assert!(!record.has_field(RecordField::SubjectId));
        assert!(!record.has_field(RecordField::Value));
        assert!(!record.is_complete());
    }

    #[test]
    fn test_serialization_omits_absent_and_uses_integers() {
        let record = Record::new("1", "P1", "hr").with_value(72.0);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value, json!({ "id": "1", "subjectId": "P1", "category": "hr", "value": 72 }));
        assert_eq!(serde_json::to_string(&RecordValue::Number(98.6)).unwrap(), "98.6");
    }

    #[test]
    fn test_record_field_names() {
        assert_eq!("patientId".parse::<RecordField>().unwrap(), RecordField::SubjectId);
        assert_eq!("category".parse::<RecordField>().unwrap(), RecordField::Category);
        assert_eq!(
            "colour".parse::<RecordField>(),
            Err(ValidationError::UnknownField("colour".into()))
        );
        assert_eq!(RecordField::SubjectId.to_string(), "subjectId");
    }

    #[test]
    fn test_parse_batch_shapes() {
        let bare = parse_batch(json!([{ "id": "1" }])).unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped = parse_batch(json!({ "data": [{ "id": "1" }, { "id": "2" }] })).unwrap();
        assert_eq!(wrapped.len(), 2);

        assert!(matches!(parse_batch(json!({ "rows": [] })), Err(BatchError::NotAnArray)));
        assert!(matches!(parse_records(json!("nope")), Err(BatchError::NotAnArray)));
    }

    #[test]
    fn test_read_batch_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(&path, r#"{"data":[{"id":"a","subjectId":"S","category":"hr"}]}"#).unwrap();

        let records = read_batch(&path).unwrap();
        assert_eq!(records, vec![Record::new("a", "S", "hr")]);
    }

    #[test]
    fn test_submission_payload_defaults() {
        let payload: SubmissionPayload = serde_json::from_value(json!({
            "analysis": {
                "totalRecords": 1,
                "recordsByType": { "hr": 1 },
                "timestamp": "2024-01-15T10:30:00.000Z"
            },
            "status": "completed"
        }))
        .unwrap();

        assert_eq!(payload.record_count, 0);
        assert_eq!(payload.status, SubmissionStatus::Completed);
        assert_eq!(payload.analysis.records_by_category["hr"], 1);
        assert!(payload.analysis.average_value.is_none());
    }
}
