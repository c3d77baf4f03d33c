//! Built-in data served when no real upstream is configured.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use super::types::SubmissionReceipt;
use crate::models::{Record, SubmissionPayload};

/// Six vitals readings for three patients, timestamped relative to `now`.
pub fn mock_records(now: DateTime<Utc>) -> Vec<Record> {
    let at = |hours_ago: i64| {
        (now - Duration::hours(hours_ago)).to_rfc3339_opts(SecondsFormat::Millis, true)
    };

    vec![
        Record::new("1", "P001", "blood_pressure").with_value(120.0).with_timestamp(at(24)),
        Record::new("2", "P002", "heart_rate").with_value(72.0).with_timestamp(at(12)),
        Record::new("3", "P001", "blood_pressure").with_value(118.0).with_timestamp(at(0)),
        Record::new("4", "P003", "temperature").with_value(98.6).with_timestamp(at(1)),
        Record::new("5", "P002", "heart_rate").with_value(75.0).with_timestamp(at(0)),
        Record::new("6", "P003", "blood_pressure").with_value(122.0).with_timestamp(at(2)),
    ]
}

/// Receipt acknowledging a submission without sending it anywhere.
pub fn mock_receipt(payload: &SubmissionPayload, now: DateTime<Utc>) -> SubmissionReceipt {
    SubmissionReceipt {
        id: format!("sub_{}", now.timestamp_millis()),
        message: "Results received successfully".to_string(),
        timestamp: now,
        records_processed: payload.record_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::models::SubmissionStatus;

    #[test]
    fn test_mock_records_are_clean() {
        let now = Utc::now();
        let records = mock_records(now);

        assert_eq!(records.len(), 6);
        assert!(records.iter().all(Record::is_complete));
        assert_eq!(
            records[0].timestamp,
            Some((now - Duration::hours(24)).to_rfc3339_opts(SecondsFormat::Millis, true))
        );
    }

    #[test]
    fn test_mock_receipt() {
        let now = Utc::now();
        let payload = SubmissionPayload::new(analyze(&[]), 4, SubmissionStatus::Pending);

        let receipt = mock_receipt(&payload, now);

        assert_eq!(receipt.id, format!("sub_{}", now.timestamp_millis()));
        assert_eq!(receipt.records_processed, 4);
    }
}
