//! In-memory source keyed by user id

use super::record::RawObservation;
use super::{ObservationSource, ProfileSource};
use crate::error::InsightError;
use crate::types::{Profile, WeightObservation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of one user's data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub observations: Vec<RawObservation>,
}

/// Source serving snapshots from memory. Unknown users have no data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySource {
    users: HashMap<String, UserRecord>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user's snapshot
    pub fn insert(&mut self, user_id: impl Into<String>, record: UserRecord) {
        self.users.insert(user_id.into(), record);
    }

    /// Load a source from JSON of the form `{"users": {"<id>": {...}}}`
    pub fn from_json(json: &str) -> Result<Self, InsightError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl ObservationSource for MemorySource {
    fn fetch_observations(&self, user_id: &str) -> Result<Vec<WeightObservation>, InsightError> {
        match self.users.get(user_id) {
            Some(record) => RawObservation::to_observations(&record.observations),
            None => Ok(Vec::new()),
        }
    }
}

impl ProfileSource for MemorySource {
    fn fetch_profile(&self, user_id: &str) -> Result<Profile, InsightError> {
        Ok(self
            .users
            .get(user_id)
            .map(|record| record.profile.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeightUnit;

    #[test]
    fn test_unknown_user_is_empty() {
        let source = MemorySource::new();
        assert!(source.fetch_observations("nobody").unwrap().is_empty());
        assert_eq!(source.fetch_profile("nobody").unwrap(), Profile::default());
    }

    #[test]
    fn test_from_json() {
        let source = MemorySource::from_json(
            r#"{"users": {"u1": {
                "profile": {"current_weight": 180.0, "weight_unit": "lbs"},
                "observations": [{"weight": 180.0, "date": "2024-04-02"}]
            }}}"#,
        )
        .unwrap();

        assert_eq!(source.fetch_observations("u1").unwrap().len(), 1);
        let profile = source.fetch_profile("u1").unwrap();
        assert_eq!(profile.weight_unit, WeightUnit::Lbs);
        assert_eq!(profile.current_weight, Some(180.0));
    }

    #[test]
    fn test_invalid_stored_record_is_error() {
        let mut source = MemorySource::new();
        source.insert(
            "u1",
            UserRecord {
                profile: Profile::default(),
                observations: vec![RawObservation {
                    weight: 0.0,
                    date: "2024-04-02".to_string(),
                }],
            },
        );
        assert!(matches!(
            source.fetch_observations("u1"),
            Err(InsightError::InvalidWeight(_))
        ));
    }
}
