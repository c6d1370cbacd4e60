//! Weight Insights - Trend analytics and achievement detection for weight tracking
//!
//! Insights turns a snapshot of dated weight readings and a user profile into
//! derived statistics and celebration events:
//! source fetch → trend analysis → BMI → achievement detection → presenter.
//!
//! ## Modules
//!
//! - **Trend**: weekly/monthly change, trend direction, logging streak, day-of-week stats
//! - **Achievement**: goal, milestone, streak and weight-loss rules with at-most-once firing

pub mod achievement;
pub mod bmi;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod trend;
pub mod types;

pub use achievement::{
    AchievementDetector, AchievementInputs, AchievementRules, CelebrationPresenter,
    FiredAchievementStore, LogPresenter, SessionFiredSet,
};
pub use error::InsightError;
pub use pipeline::{weight_insights, InsightProcessor};
pub use trend::{TrendAnalyzer, TrendConfig};

/// Crate version embedded in CLI output
pub const INSIGHTS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "weight-insights";
