//! Trend analysis
//!
//! This module derives trend statistics from a series of weight observations:
//! - Weekly and monthly average change
//! - Short-term trend classification
//! - Logging streak
//! - Day-of-week change statistics

use crate::types::{DayOfWeek, DayOfWeekStats, TrendClassification, TrendSummary, WeightObservation};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tunables for trend analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Entry distance between weekly samples
    pub weekly_step: usize,
    /// Number of most recent entries used for classification
    pub trend_window: usize,
    /// Absolute change at or below which the trend is stable
    pub stable_threshold: f64,
    /// Multiplier from weekly to monthly change
    pub weeks_per_month: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            weekly_step: 7,
            trend_window: 5,
            stable_threshold: 1.0,
            weeks_per_month: 4.0,
        }
    }
}

/// Trend analyzer for computing summaries from weight observations
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Analyze observations relative to `today`.
    ///
    /// Input order is irrelevant; entries are sorted by date (stable) before any
    /// chronological computation. Never fails: sparse input degrades to zeros.
    pub fn analyze(&self, entries: &[WeightObservation], today: NaiveDate) -> TrendSummary {
        let mut sorted = entries.to_vec();
        sorted.sort_by_key(|e| e.date);

        let average_weekly_change = compute_average_weekly_change(&sorted, self.config.weekly_step);
        let monthly_average = average_weekly_change.abs() * self.config.weeks_per_month;
        let trend = classify_trend(
            &sorted,
            self.config.trend_window,
            self.config.stable_threshold,
        );
        let logging_streak_days = compute_logging_streak(&sorted, today);
        let day_of_week = compute_day_of_week_stats(&sorted);
        let (best_day, worst_day) = rank_days(&day_of_week);

        tracing::debug!(
            entries = sorted.len(),
            average_weekly_change,
            ?trend,
            logging_streak_days,
            "trend computed"
        );

        TrendSummary {
            average_weekly_change,
            monthly_average,
            trend,
            logging_streak_days,
            best_day,
            worst_day,
            day_of_week,
            entry_count: sorted.len(),
        }
    }
}

/// Mean of deltas between entries `step` positions apart, sampled every `step`
/// entries. Zero when fewer than `step + 1` entries exist.
fn compute_average_weekly_change(sorted: &[WeightObservation], step: usize) -> f64 {
    if step == 0 {
        return 0.0;
    }

    let changes: Vec<f64> = (step..sorted.len())
        .step_by(step)
        .map(|i| sorted[i].weight - sorted[i - step].weight)
        .collect();

    if changes.is_empty() {
        return 0.0;
    }
    changes.iter().sum::<f64>() / changes.len() as f64
}

/// Classify direction from the first and last of the most recent `window` entries
fn classify_trend(
    sorted: &[WeightObservation],
    window: usize,
    threshold: f64,
) -> TrendClassification {
    let recent = &sorted[sorted.len().saturating_sub(window)..];

    let diff = match (recent.first(), recent.last()) {
        (Some(first), Some(last)) => last.weight - first.weight,
        _ => return TrendClassification::Stable,
    };

    if diff > threshold {
        TrendClassification::Increasing
    } else if diff < -threshold {
        TrendClassification::Decreasing
    } else {
        TrendClassification::Stable
    }
}

/// Count consecutive days with an entry, walking backward from `today`
pub(crate) fn compute_logging_streak(entries: &[WeightObservation], today: NaiveDate) -> u32 {
    let logged: HashSet<NaiveDate> = entries.iter().map(|e| e.date).collect();

    let mut streak = 0;
    let mut day = today;
    while logged.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Bucket day-over-day changes by the weekday of the later entry
fn compute_day_of_week_stats(sorted: &[WeightObservation]) -> Vec<DayOfWeekStats> {
    let mut sums = [0.0_f64; 7];
    let mut counts = [0_u32; 7];

    for pair in sorted.windows(2) {
        let day = DayOfWeek::from(pair[1].date.weekday());
        sums[day.index()] += pair[1].weight - pair[0].weight;
        counts[day.index()] += 1;
    }

    DayOfWeek::ALL
        .iter()
        .filter(|day| counts[day.index()] > 0)
        .map(|&day| DayOfWeekStats {
            day,
            average_change: sums[day.index()] / counts[day.index()] as f64,
            transitions: counts[day.index()],
        })
        .collect()
}

/// Pick the days with the most negative and most positive average change.
/// Ties go to the earlier day in the week.
fn rank_days(stats: &[DayOfWeekStats]) -> (Option<DayOfWeek>, Option<DayOfWeek>) {
    let mut best: Option<&DayOfWeekStats> = None;
    let mut worst: Option<&DayOfWeekStats> = None;

    for stat in stats {
        if best.map_or(true, |b| stat.average_change < b.average_change) {
            best = Some(stat);
        }
        if worst.map_or(true, |w| stat.average_change > w.average_change) {
            worst = Some(stat);
        }
    }

    (best.map(|s| s.day), worst.map(|s| s.day))
}
