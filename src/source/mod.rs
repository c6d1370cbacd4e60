//! Observation and profile sources
//!
//! The engine never fetches data itself. Callers fetch a complete snapshot
//! through these traits and hand it to the analyzer and detector.

mod memory;
mod record;

pub use memory::{MemorySource, UserRecord};
pub use record::{parse_date, RawObservation, RecordIssue};

use crate::error::InsightError;
use crate::types::{Profile, WeightObservation};

/// Trait for stores holding a user's weight observations
pub trait ObservationSource {
    /// Fetch all observations for a user, in any order; may be empty
    fn fetch_observations(&self, user_id: &str) -> Result<Vec<WeightObservation>, InsightError>;
}

/// Trait for stores holding a user's profile values
pub trait ProfileSource {
    /// Fetch the profile for a user; any field may be absent
    fn fetch_profile(&self, user_id: &str) -> Result<Profile, InsightError>;
}
