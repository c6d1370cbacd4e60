//! Achievement detection
//!
//! Evaluates a fixed rule set against profile weights and recent entries and
//! emits each achievement at most once for the lifetime of its fired-set.
//!
//! Rules are evaluated in a fixed order: goal, milestones ascending, logging
//! streak, weight-loss thresholds ascending.

use crate::types::{AchievementEvent, AchievementKind, WeightObservation, WeightUnit};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Id of the goal achievement
pub const GOAL_ACHIEVED_ID: &str = "goal-achieved";

/// Rule thresholds for achievement detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementRules {
    /// Maximum distance from goal weight that counts as reached
    pub goal_tolerance: f64,
    /// Progress percentages that fire milestones
    pub milestone_percents: Vec<u8>,
    /// Consecutive logged days (ending today) required for the streak
    pub streak_days: u32,
    /// Cumulative loss amounts that fire weight-loss achievements
    pub weight_loss_thresholds: Vec<u32>,
}

impl Default for AchievementRules {
    fn default() -> Self {
        Self {
            goal_tolerance: 0.5,
            milestone_percents: vec![25, 50, 75],
            streak_days: 7,
            weight_loss_thresholds: vec![5, 10, 15, 20, 25],
        }
    }
}

impl AchievementRules {
    /// Load rules from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let rules: Self = serde_json::from_str(json)?;
        Ok(rules.normalize())
    }

    /// Serialize rules to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Sort and dedup thresholds so rules fire in ascending order
    fn normalize(mut self) -> Self {
        self.milestone_percents.sort_unstable();
        self.milestone_percents.dedup();
        self.weight_loss_thresholds.sort_unstable();
        self.weight_loss_thresholds.dedup();
        self
    }

    fn streak_id(&self) -> String {
        format!("{}-day-streak", self.streak_days)
    }
}

/// Session-scoped record of which achievement ids have already fired
pub trait FiredAchievementStore {
    fn contains(&self, id: &str) -> bool;

    /// Record an id. Returns false if it was already present.
    fn insert(&mut self, id: &str) -> bool;
}

/// In-memory fired-set, reset only by dropping it
#[derive(Debug, Clone, Default)]
pub struct SessionFiredSet {
    ids: HashSet<String>,
}

impl SessionFiredSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl FiredAchievementStore for SessionFiredSet {
    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }
}

/// Receives newly fired achievements, e.g. to trigger a celebration animation
pub trait CelebrationPresenter {
    fn present(&mut self, event: &AchievementEvent);
}

/// Presenter that only logs fired achievements
#[derive(Debug, Default)]
pub struct LogPresenter;

impl CelebrationPresenter for LogPresenter {
    fn present(&mut self, event: &AchievementEvent) {
        tracing::info!(id = %event.id, title = %event.title, "celebrating achievement");
    }
}

/// Inputs for one evaluation pass. Missing weights skip dependent rules.
#[derive(Debug, Clone, Copy)]
pub struct AchievementInputs<'a> {
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub start_weight: Option<f64>,
    pub recent_entries: &'a [WeightObservation],
    pub weight_unit: WeightUnit,
}

/// Stateful detector; call `evaluate` whenever inputs may have changed
pub struct AchievementDetector<S: FiredAchievementStore = SessionFiredSet> {
    rules: AchievementRules,
    fired: S,
    visible: Vec<AchievementEvent>,
    presenter: Option<Box<dyn CelebrationPresenter>>,
}

impl Default for AchievementDetector<SessionFiredSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementDetector<SessionFiredSet> {
    /// Create a detector with default rules and a fresh session fired-set
    pub fn new() -> Self {
        Self::with_store(AchievementRules::default(), SessionFiredSet::new())
    }

    /// Create a detector with custom rules and a fresh session fired-set
    pub fn with_rules(rules: AchievementRules) -> Self {
        Self::with_store(rules, SessionFiredSet::new())
    }
}

impl<S: FiredAchievementStore> AchievementDetector<S> {
    /// Create a detector backed by an injected fired-set store
    pub fn with_store(rules: AchievementRules, store: S) -> Self {
        Self {
            rules: rules.normalize(),
            fired: store,
            visible: Vec::new(),
            presenter: None,
        }
    }

    /// Attach a presenter notified of every newly fired achievement
    pub fn with_presenter(mut self, presenter: Box<dyn CelebrationPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn rules(&self) -> &AchievementRules {
        &self.rules
    }

    pub fn store(&self) -> &S {
        &self.fired
    }

    /// Achievements fired and not yet dismissed, oldest first
    pub fn visible(&self) -> &[AchievementEvent] {
        &self.visible
    }

    /// Remove an achievement from the visible queue. It will not fire again.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.visible.len();
        self.visible.retain(|event| event.id != id);
        before != self.visible.len()
    }

    /// Empty the visible queue without forgetting what has fired
    pub fn clear_all(&mut self) {
        self.visible.clear();
    }

    /// Evaluate all rules and return achievements that fired in this pass.
    ///
    /// `now` stamps fired events and its date is "today" for the streak rule.
    pub fn evaluate(
        &mut self,
        inputs: &AchievementInputs<'_>,
        now: DateTime<Utc>,
    ) -> Vec<AchievementEvent> {
        let candidates = self.satisfied_rules(inputs, now.date_naive());

        let mut fired = Vec::new();
        for candidate in candidates {
            if !self.fired.insert(&candidate.id) {
                continue;
            }

            let event = candidate.into_event(now);
            tracing::info!(id = %event.id, kind = ?event.kind, "achievement fired");

            if let Some(presenter) = self.presenter.as_mut() {
                presenter.present(&event);
            }
            self.visible.push(event.clone());
            fired.push(event);
        }
        fired
    }

    /// Collect every rule that is satisfied and has not fired yet, in firing order
    fn satisfied_rules(&self, inputs: &AchievementInputs<'_>, today: NaiveDate) -> Vec<Candidate> {
        let unit = inputs.weight_unit.as_str();
        let mut candidates = Vec::new();

        // Goal
        if let (Some(current), Some(goal), Some(_start)) =
            (inputs.current_weight, inputs.goal_weight, inputs.start_weight)
        {
            if (current - goal).abs() <= self.rules.goal_tolerance {
                candidates.push(Candidate {
                    id: GOAL_ACHIEVED_ID.to_string(),
                    kind: AchievementKind::Goal,
                    title: "Goal Achieved!".to_string(),
                    description: format!("You reached your goal weight of {goal:.1} {unit}!"),
                    milestone_percent: None,
                });
            }
        }

        // Milestones
        match progress_percent(inputs) {
            Some(progress) => {
                for &percent in &self.rules.milestone_percents {
                    if progress >= f64::from(percent) {
                        candidates.push(Candidate {
                            id: format!("milestone-{percent}"),
                            kind: AchievementKind::Milestone,
                            title: format!("{percent}% Milestone!"),
                            description: format!("You're {percent}% of the way to your goal!"),
                            milestone_percent: Some(percent),
                        });
                    }
                }
            }
            None => tracing::debug!("milestone rules skipped: progress cannot be computed"),
        }

        // Streak
        if self.rules.streak_days > 0
            && has_consecutive_days(inputs.recent_entries, today, self.rules.streak_days)
        {
            let days = self.rules.streak_days;
            candidates.push(Candidate {
                id: self.rules.streak_id(),
                kind: AchievementKind::Streak,
                title: format!("{days}-Day Streak!"),
                description: format!("You logged your weight {days} days in a row!"),
                milestone_percent: None,
            });
        }

        // Weight loss
        if let (Some(start), Some(current)) = (inputs.start_weight, inputs.current_weight) {
            let loss = start - current;
            for &threshold in &self.rules.weight_loss_thresholds {
                if loss >= f64::from(threshold) {
                    candidates.push(Candidate {
                        id: format!("weight-loss-{threshold}"),
                        kind: AchievementKind::WeightLoss,
                        title: format!("{threshold} {unit} Lost!"),
                        description: format!("You've lost {threshold} {unit} since you started!"),
                        milestone_percent: None,
                    });
                }
            }
        }

        candidates.retain(|c| !self.fired.contains(&c.id));
        candidates
    }
}

/// A satisfied rule not yet stamped with a firing time
struct Candidate {
    id: String,
    kind: AchievementKind,
    title: String,
    description: String,
    milestone_percent: Option<u8>,
}

impl Candidate {
    fn into_event(self, fired_at: DateTime<Utc>) -> AchievementEvent {
        AchievementEvent {
            id: self.id,
            kind: self.kind,
            title: self.title,
            description: self.description,
            milestone_percent: self.milestone_percent,
            fired_at,
        }
    }
}

/// Percentage of the start-to-goal distance covered so far.
/// `None` when an input is missing or start equals goal.
fn progress_percent(inputs: &AchievementInputs<'_>) -> Option<f64> {
    let start = inputs.start_weight?;
    let current = inputs.current_weight?;
    let goal = inputs.goal_weight?;

    let total_goal = (start - goal).abs();
    if total_goal == 0.0 || !total_goal.is_finite() {
        return None;
    }
    Some((start - current).abs() / total_goal * 100.0)
}

/// True when today and each of the `days - 1` preceding days have an entry
fn has_consecutive_days(entries: &[WeightObservation], today: NaiveDate, days: u32) -> bool {
    let logged: HashSet<NaiveDate> = entries.iter().map(|e| e.date).collect();

    let mut day = today;
    for i in 0..days {
        if !logged.contains(&day) {
            return false;
        }
        if i + 1 < days {
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, TimeZone};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
    }

    fn inputs(current: f64, goal: f64, start: f64) -> AchievementInputs<'static> {
        AchievementInputs {
            current_weight: Some(current),
            goal_weight: Some(goal),
            start_weight: Some(start),
            recent_entries: &[],
            weight_unit: WeightUnit::Lbs,
        }
    }

    fn ids(events: &[AchievementEvent]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    fn last_days(count: u64, today: NaiveDate) -> Vec<WeightObservation> {
        (0..count)
            .map(|i| WeightObservation::new(150.0, today - Days::new(i)))
            .collect()
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl CelebrationPresenter for Recorder {
        fn present(&mut self, event: &AchievementEvent) {
            self.0.borrow_mut().push(event.id.clone());
        }
    }

    #[test]
    fn test_half_way_fires_two_milestones_in_order() {
        let mut detector = AchievementDetector::new();
        let fired = detector.evaluate(&inputs(170.0, 160.0, 180.0), now());

        assert_eq!(
            ids(&fired),
            vec!["milestone-25", "milestone-50", "weight-loss-5", "weight-loss-10"]
        );
        assert_eq!(fired[1].milestone_percent, Some(50));
        assert_eq!(fired[0].kind, AchievementKind::Milestone);
    }

    #[test]
    fn test_milestones_fire_once_while_descending() {
        let mut detector = AchievementDetector::with_rules(AchievementRules {
            weight_loss_thresholds: vec![],
            ..Default::default()
        });
        let mut milestones = Vec::new();

        let mut current = 200.0;
        while current >= 150.0 {
            for event in detector.evaluate(&inputs(current, 150.0, 200.0), now()) {
                if event.kind == AchievementKind::Milestone {
                    milestones.push(event.id);
                }
            }
            // Repeat evaluation with the same input
            assert!(detector
                .evaluate(&inputs(current, 150.0, 200.0), now())
                .is_empty());
            current -= 2.5;
        }

        assert_eq!(milestones, vec!["milestone-25", "milestone-50", "milestone-75"]);

        // Regressing does not re-fire anything
        assert!(detector.evaluate(&inputs(190.0, 150.0, 200.0), now()).is_empty());
        assert!(detector.evaluate(&inputs(150.0, 150.0, 200.0), now()).is_empty());
    }

    #[test]
    fn test_goal_tolerance_boundary() {
        let mut detector = AchievementDetector::new();
        let fired = detector.evaluate(&inputs(149.0, 150.0, 149.0), now());
        assert!(!ids(&fired).contains(&GOAL_ACHIEVED_ID));

        let fired = detector.evaluate(&inputs(149.6, 150.0, 149.0), now());
        assert!(ids(&fired).contains(&GOAL_ACHIEVED_ID));
        assert_eq!(fired[0].id, GOAL_ACHIEVED_ID);
        assert_eq!(fired[0].description, "You reached your goal weight of 150.0 lbs!");

        // Exactly at the tolerance still counts
        let mut detector = AchievementDetector::new();
        let fired = detector.evaluate(&inputs(149.5, 150.0, 149.0), now());
        assert_eq!(fired[0].id, GOAL_ACHIEVED_ID);
    }

    #[test]
    fn test_unsorted_rules_fire_ascending() {
        let mut detector = AchievementDetector::with_rules(AchievementRules {
            milestone_percents: vec![75, 25, 50, 25],
            weight_loss_thresholds: vec![10, 5],
            ..Default::default()
        });
        assert_eq!(detector.rules().milestone_percents, vec![25, 50, 75]);

        let fired = detector.evaluate(&inputs(160.0, 150.0, 200.0), now());
        assert_eq!(
            ids(&fired),
            vec![
                "milestone-25",
                "milestone-50",
                "milestone-75",
                "weight-loss-5",
                "weight-loss-10",
            ]
        );
    }

    #[test]
    fn test_goal_requires_start_weight() {
        let mut detector = AchievementDetector::new();
        let fired = detector.evaluate(
            &AchievementInputs {
                start_weight: None,
                ..inputs(150.0, 150.0, 0.0)
            },
            now(),
        );
        assert!(fired.is_empty());
    }

    #[test]
    fn test_zero_distance_goal_skips_milestones() {
        let mut detector = AchievementDetector::new();
        let fired = detector.evaluate(&inputs(150.0, 150.0, 150.0), now());
        assert_eq!(ids(&fired), vec![GOAL_ACHIEVED_ID]);
    }

    #[test]
    fn test_missing_inputs_fire_nothing() {
        let mut detector = AchievementDetector::new();
        let fired = detector.evaluate(
            &AchievementInputs {
                current_weight: None,
                goal_weight: None,
                start_weight: None,
                recent_entries: &[],
                weight_unit: WeightUnit::Kg,
            },
            now(),
        );
        assert!(fired.is_empty());
        assert!(detector.visible().is_empty());
    }

    #[test]
    fn test_streak_requires_seven_days_ending_today() {
        let today = now().date_naive();
        let mut detector = AchievementDetector::new();

        let six = last_days(6, today);
        let fired = detector.evaluate(
            &AchievementInputs {
                recent_entries: &six,
                ..inputs(150.0, 140.0, 150.0)
            },
            now(),
        );
        assert!(fired.is_empty());

        let seven = last_days(7, today);
        let fired = detector.evaluate(
            &AchievementInputs {
                recent_entries: &seven,
                ..inputs(150.0, 140.0, 150.0)
            },
            now(),
        );
        assert_eq!(ids(&fired), vec!["7-day-streak"]);
        assert_eq!(fired[0].title, "7-Day Streak!");
    }

    #[test]
    fn test_streak_not_satisfied_when_today_missing() {
        let yesterday = now().date_naive() - Days::new(1);
        let entries = last_days(10, yesterday);
        let mut detector = AchievementDetector::new();
        let fired = detector.evaluate(
            &AchievementInputs {
                recent_entries: &entries,
                ..inputs(150.0, 140.0, 150.0)
            },
            now(),
        );
        assert!(fired.is_empty());
    }

    #[test]
    fn test_firing_order_across_rules() {
        let today = now().date_naive();
        let entries = last_days(7, today);
        let mut detector = AchievementDetector::new();
        let fired = detector.evaluate(
            &AchievementInputs {
                recent_entries: &entries,
                ..inputs(174.8, 175.0, 200.0)
            },
            now(),
        );

        assert_eq!(
            ids(&fired),
            vec![
                "goal-achieved",
                "milestone-25",
                "milestone-50",
                "milestone-75",
                "7-day-streak",
                "weight-loss-5",
                "weight-loss-10",
                "weight-loss-15",
                "weight-loss-20",
                "weight-loss-25",
            ]
        );
        assert!(fired.iter().all(|e| e.fired_at == now()));
    }

    #[test]
    fn test_weight_loss_thresholds_and_unit_text() {
        let mut detector = AchievementDetector::new();
        let fired = detector.evaluate(
            &AchievementInputs {
                goal_weight: None,
                weight_unit: WeightUnit::Kg,
                ..inputs(84.0, 0.0, 100.0)
            },
            now(),
        );

        assert_eq!(ids(&fired), vec!["weight-loss-5", "weight-loss-10", "weight-loss-15"]);
        assert_eq!(fired[2].title, "15 kg Lost!");
    }

    #[test]
    fn test_weight_gain_fires_no_loss() {
        let mut detector = AchievementDetector::new();
        let fired = detector.evaluate(&inputs(110.0, 50.0, 100.0), now());
        assert!(fired.iter().all(|e| e.kind != AchievementKind::WeightLoss));
    }

    #[test]
    fn test_dismiss_and_clear_keep_fired_set() {
        let mut detector = AchievementDetector::new();
        detector.evaluate(&inputs(170.0, 160.0, 180.0), now());
        assert_eq!(detector.visible().len(), 4);

        assert!(detector.dismiss("milestone-25"));
        assert!(!detector.dismiss("milestone-25"));
        assert_eq!(detector.visible().len(), 3);

        detector.clear_all();
        assert!(detector.visible().is_empty());
        assert!(detector.store().contains("milestone-25"));
        assert_eq!(detector.store().len(), 4);

        assert!(detector.evaluate(&inputs(170.0, 160.0, 180.0), now()).is_empty());
    }

    #[test]
    fn test_presenter_notified_per_event() {
        let recorder = Recorder::default();
        let mut detector = AchievementDetector::new().with_presenter(Box::new(recorder.clone()));

        detector.evaluate(&inputs(170.0, 160.0, 180.0), now());
        detector.evaluate(&inputs(170.0, 160.0, 180.0), now());

        assert_eq!(
            *recorder.0.borrow(),
            vec!["milestone-25", "milestone-50", "weight-loss-5", "weight-loss-10"]
        );
    }

    #[test]
    fn test_injected_store_is_respected() {
        let mut store = SessionFiredSet::new();
        store.insert("milestone-25");

        let mut detector = AchievementDetector::with_store(AchievementRules::default(), store);
        let fired = detector.evaluate(&inputs(170.0, 160.0, 180.0), now());
        assert_eq!(ids(&fired), vec!["milestone-50", "weight-loss-5", "weight-loss-10"]);
    }

    #[test]
    fn test_rules_from_json() {
        let rules =
            AchievementRules::from_json(r#"{"milestone_percents": [50, 10, 50], "streak_days": 3}"#)
                .unwrap();
        assert_eq!(rules.milestone_percents, vec![10, 50]);
        assert_eq!(rules.streak_days, 3);
        assert_eq!(rules.goal_tolerance, 0.5);
        assert_eq!(rules.streak_id(), "3-day-streak");

        let round = AchievementRules::from_json(&rules.to_json().unwrap()).unwrap();
        assert_eq!(round, rules);
    }
}
