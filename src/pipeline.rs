//! Pipeline orchestration
//!
//! This module provides the public API for weight-insights. It runs a fetched
//! snapshot through trend analysis, BMI and achievement detection.

use crate::achievement::{
    AchievementDetector, AchievementInputs, AchievementRules, CelebrationPresenter,
};
use crate::bmi::BmiCalculator;
use crate::error::InsightError;
use crate::source::{ObservationSource, ProfileSource, RawObservation};
use crate::trend::{TrendAnalyzer, TrendConfig};
use crate::types::{InsightReport, Profile, WeightObservation};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Run a single pass over raw JSON inputs with a fresh session.
///
/// # Arguments
/// * `observations_json` - JSON array of `{"weight": f64, "date": "YYYY-MM-DD"}`
/// * `profile_json` - JSON profile object; every field optional
/// * `now` - Reference time; its date is "today"
///
/// # Returns
/// The serialized [`InsightReport`]
///
/// # Example
/// ```ignore
/// let report = weight_insights(
///     r#"[{"weight": 180.0, "date": "2024-01-01"}]"#.to_string(),
///     r#"{"start_weight": 190.0, "goal_weight": 170.0, "current_weight": 180.0}"#.to_string(),
///     Utc::now(),
/// )?;
/// ```
pub fn weight_insights(
    observations_json: String,
    profile_json: String,
    now: DateTime<Utc>,
) -> Result<String, InsightError> {
    let records = RawObservation::parse_array(&observations_json)?;
    let observations = RawObservation::to_observations(&records)?;
    let profile: Profile = serde_json::from_str(&profile_json)?;

    let mut processor = InsightProcessor::new();
    let report = processor.process(&observations, &profile, now);

    serde_json::to_string(&report).map_err(|e| InsightError::EncodingError(e.to_string()))
}

/// Stateful processor that keeps the achievement session across passes.
///
/// Use this when the same user's data is re-evaluated repeatedly; achievements
/// fire once per processor.
pub struct InsightProcessor {
    session_id: String,
    analyzer: TrendAnalyzer,
    detector: AchievementDetector,
}

impl Default for InsightProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self::with_config(TrendConfig::default(), AchievementRules::default())
    }

    /// Create a processor with specific trend settings and achievement rules
    pub fn with_config(trend: TrendConfig, rules: AchievementRules) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            analyzer: TrendAnalyzer::new(trend),
            detector: AchievementDetector::with_rules(rules),
        }
    }

    /// Attach a presenter for newly fired achievements
    pub fn with_presenter(mut self, presenter: Box<dyn CelebrationPresenter>) -> Self {
        self.detector = self.detector.with_presenter(presenter);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn detector(&self) -> &AchievementDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut AchievementDetector {
        &mut self.detector
    }

    /// Process an already fetched snapshot
    pub fn process(
        &mut self,
        observations: &[WeightObservation],
        profile: &Profile,
        now: DateTime<Utc>,
    ) -> InsightReport {
        let trend = self.analyzer.analyze(observations, now.date_naive());
        let bmi = BmiCalculator::from_profile(profile);

        let inputs = AchievementInputs {
            current_weight: profile.current_weight,
            goal_weight: profile.goal_weight,
            start_weight: profile.start_weight,
            recent_entries: observations,
            weight_unit: profile.weight_unit,
        };
        let new_achievements = self.detector.evaluate(&inputs, now);

        tracing::debug!(
            session_id = %self.session_id,
            entries = observations.len(),
            fired = new_achievements.len(),
            "snapshot processed"
        );

        InsightReport {
            session_id: self.session_id.clone(),
            generated_at: now,
            trend,
            bmi,
            new_achievements,
        }
    }

    /// Fetch a user's snapshot from `source` and process it
    pub fn refresh<S>(
        &mut self,
        source: &S,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<InsightReport, InsightError>
    where
        S: ObservationSource + ProfileSource,
    {
        let observations = source.fetch_observations(user_id)?;
        let profile = source.fetch_profile(user_id)?;
        Ok(self.process(&observations, &profile, now))
    }
}
