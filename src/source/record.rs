//! Raw weight records as delivered by the observation store
//!
//! Records carry the date as an ISO-8601 string. They are parsed from a JSON
//! array or NDJSON and validated into [`WeightObservation`]s.

use crate::error::InsightError;
use crate::types::WeightObservation;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// A weight record before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub weight: f64,
    /// `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used
    pub date: String,
}

impl RawObservation {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<RawObservation>, InsightError> {
        let records: Vec<RawObservation> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (one record per line); blank lines are skipped
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawObservation>, InsightError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record = serde_json::from_str::<RawObservation>(trimmed).map_err(|e| {
                InsightError::SourceError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Validate into an observation
    pub fn to_observation(&self) -> Result<WeightObservation, InsightError> {
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(InsightError::InvalidWeight(format!(
                "{} (must be a positive number)",
                self.weight
            )));
        }
        let date = parse_date(&self.date)?;
        Ok(WeightObservation::new(self.weight, date))
    }

    /// Validate every record, failing on the first invalid one
    pub fn to_observations(
        records: &[RawObservation],
    ) -> Result<Vec<WeightObservation>, InsightError> {
        records.iter().map(RawObservation::to_observation).collect()
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_records(records: &[RawObservation]) -> Vec<RecordIssue> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record.to_observation().err().map(|e| RecordIssue {
                    index,
                    date: record.date.clone(),
                    error: e.to_string(),
                })
            })
            .collect()
    }
}

/// A record that failed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordIssue {
    pub index: usize,
    pub date: String,
    pub error: String,
}

/// Parse an ISO-8601 calendar date, accepting full RFC 3339 timestamps
pub fn parse_date(value: &str) -> Result<NaiveDate, InsightError> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|_| InsightError::InvalidDate(value.to_string()))
}
