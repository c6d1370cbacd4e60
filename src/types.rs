//! Core types for weight-insights
//!
//! This module defines the data that flows through the engine: weight
//! observations and profiles coming in, trend summaries and achievement events
//! going out.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Pounds per kilogram
pub const LBS_PER_KG: f64 = 2.20462;

/// Centimeters per inch
pub const CM_PER_INCH: f64 = 2.54;

/// A single user-submitted body-weight reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightObservation {
    /// Weight in the user's unit
    pub weight: f64,
    /// Calendar date of the reading
    pub date: NaiveDate,
}

impl WeightObservation {
    pub fn new(weight: f64, date: NaiveDate) -> Self {
        Self { weight, date }
    }
}

/// Unit a user records weight in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }

    /// Convert a value in this unit to kilograms
    pub fn to_kg(&self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lbs => value / LBS_PER_KG,
        }
    }
}

/// Unit a user records height in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    #[default]
    Cm,
    In,
}

impl HeightUnit {
    /// Convert a value in this unit to meters
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            HeightUnit::Cm => value / 100.0,
            HeightUnit::In => value * CM_PER_INCH / 100.0,
        }
    }
}

/// User profile values relevant to analytics. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub start_weight: Option<f64>,
    pub height: Option<f64>,
    pub height_unit: HeightUnit,
    pub weight_unit: WeightUnit,
}

/// Short-term direction of weight change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendClassification {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

/// Day of week, Sunday first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    /// Index with Sunday = 0
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        DayOfWeek::ALL[weekday.num_days_from_sunday() as usize]
    }
}

/// Average day-over-day change attributed to one weekday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOfWeekStats {
    pub day: DayOfWeek,
    /// Mean signed change of transitions landing on this day
    pub average_change: f64,
    /// Number of transitions landing on this day
    pub transitions: u32,
}

/// Derived trend statistics, recomputed on every input change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Mean weekly change, positive = gain
    pub average_weekly_change: f64,
    /// Absolute monthly change approximated from the weekly average
    pub monthly_average: f64,
    /// Direction over the most recent entries
    pub trend: TrendClassification,
    /// Consecutive logged days ending today
    pub logging_streak_days: u32,
    /// Day with the most negative average change
    pub best_day: Option<DayOfWeek>,
    /// Day with the most positive average change
    pub worst_day: Option<DayOfWeek>,
    /// Per-day statistics for days with at least one transition
    pub day_of_week: Vec<DayOfWeekStats>,
    /// Number of observations analyzed
    pub entry_count: usize,
}

/// Achievement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AchievementKind {
    Goal,
    Milestone,
    Streak,
    WeightLoss,
}

/// A fired achievement, handed to the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementEvent {
    /// Stable rule-derived id
    pub id: String,
    pub kind: AchievementKind,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_percent: Option<u8>,
    pub fired_at: DateTime<Utc>,
}

/// BMI category using the WHO adult cut-offs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

/// Computed body-mass index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiReading {
    pub value: f64,
    pub category: BmiCategory,
}

/// Output of one processing pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightReport {
    pub session_id: String,
    pub generated_at: DateTime<Utc>,
    pub trend: TrendSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<BmiReading>,
    pub new_achievements: Vec<AchievementEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_conversion() {
        assert_eq!(DayOfWeek::from(Weekday::Sun), DayOfWeek::Sunday);
        assert_eq!(DayOfWeek::from(Weekday::Wed), DayOfWeek::Wednesday);
        assert_eq!(DayOfWeek::from(Weekday::Sat), DayOfWeek::Saturday);
        assert_eq!(DayOfWeek::Saturday.index(), 6);
    }

    #[test]
    fn test_unit_conversion() {
        assert!((WeightUnit::Lbs.to_kg(220.462) - 100.0).abs() < 0.001);
        assert_eq!(WeightUnit::Kg.to_kg(80.0), 80.0);
        assert!((HeightUnit::In.to_meters(70.0) - 1.778).abs() < 0.0001);
        assert!((HeightUnit::Cm.to_meters(180.0) - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_profile_deserializes_with_missing_fields() {
        let profile: Profile =
            serde_json::from_str(r#"{"current_weight": 80.5, "weight_unit": "lbs"}"#).unwrap();
        assert_eq!(profile.current_weight, Some(80.5));
        assert_eq!(profile.goal_weight, None);
        assert_eq!(profile.weight_unit, WeightUnit::Lbs);
        assert_eq!(profile.height_unit, HeightUnit::Cm);
    }

    #[test]
    fn test_achievement_kind_serialization() {
        let json = serde_json::to_string(&AchievementKind::WeightLoss).unwrap();
        assert_eq!(json, "\"weight-loss\"");
    }
}
