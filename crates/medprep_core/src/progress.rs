//! crates/medprep_core/src/progress.rs
//!
//! Per-plan topic completion state. Completion records are created
//! implicitly the first time a topic is referenced and live as long as the
//! owning plan; nothing is ever auto-completed.

use std::collections::HashMap;

use crate::domain::StudyPlan;

/// Mutable completion state keyed by topic name.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    completed: HashMap<String, bool>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a tracker from persisted state.
    pub fn from_map(completed: HashMap<String, bool>) -> Self {
        Self { completed }
    }

    /// Flips the completion flag for a topic. Toggling twice restores the
    /// original state.
    pub fn toggle_completed(&mut self, topic: &str) -> bool {
        let flag = self.completed.entry(topic.to_string()).or_insert(false);
        *flag = !*flag;
        *flag
    }

    pub fn is_completed(&self, topic: &str) -> bool {
        self.completed.get(topic).copied().unwrap_or(false)
    }

    /// Percentage of the plan's topics marked complete, rounded to the
    /// nearest integer. A plan with no topics reports 0 rather than
    /// dividing by zero.
    ///
    /// The denominator is the plan's `total_topics`, so topics injected by
    /// an out-of-selection weak subject can push the numerator past it;
    /// the result is clamped to 100.
    pub fn completion_percentage(&self, plan: &StudyPlan) -> u8 {
        if plan.total_topics == 0 {
            return 0;
        }
        let done = plan
            .daily_plan
            .iter()
            .flat_map(|day| day.topics.iter())
            .filter(|topic| self.is_completed(topic))
            .count();
        let pct = (100.0 * done as f64 / plan.total_topics as f64).round();
        pct.min(100.0) as u8
    }

    /// A snapshot of every recorded flag.
    pub fn snapshot(&self) -> &HashMap<String, bool> {
        &self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DayEntry;
    use chrono::NaiveDate;

    fn plan_with(topics: &[&str]) -> StudyPlan {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        StudyPlan {
            exam_date: date + chrono::Duration::days(7),
            days_remaining: 7,
            daily_plan: vec![DayEntry {
                date,
                topics: topics.iter().map(|t| t.to_string()).collect(),
            }],
            total_topics: topics.len(),
        }
    }

    #[test]
    fn double_toggle_restores_state() {
        let mut tracker = ProgressTracker::new();
        assert!(!tracker.is_completed("Blood"));
        assert!(tracker.toggle_completed("Blood"));
        assert!(tracker.is_completed("Blood"));
        assert!(!tracker.toggle_completed("Blood"));
        assert!(!tracker.is_completed("Blood"));
    }

    #[test]
    fn percentage_rounds_and_stays_in_bounds() {
        let plan = plan_with(&["A", "B", "C"]);
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.completion_percentage(&plan), 0);

        tracker.toggle_completed("A");
        // 1/3 -> 33.33 -> 33
        assert_eq!(tracker.completion_percentage(&plan), 33);

        tracker.toggle_completed("B");
        // 2/3 -> 66.67 -> 67
        assert_eq!(tracker.completion_percentage(&plan), 67);

        tracker.toggle_completed("C");
        assert_eq!(tracker.completion_percentage(&plan), 100);
    }

    #[test]
    fn empty_plan_reports_zero() {
        let plan = plan_with(&[]);
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.completion_percentage(&plan), 0);
    }

    #[test]
    fn topics_outside_the_plan_do_not_count() {
        let plan = plan_with(&["A", "B"]);
        let mut tracker = ProgressTracker::new();
        tracker.toggle_completed("Something Else");
        assert_eq!(tracker.completion_percentage(&plan), 0);
    }

    #[test]
    fn extra_weak_topics_clamp_at_one_hundred() {
        // A plan whose schedule carries more topics than total_topics
        // (weak subject outside the selection).
        let mut plan = plan_with(&["A", "B", "C"]);
        plan.total_topics = 2;
        let mut tracker = ProgressTracker::new();
        for t in ["A", "B", "C"] {
            tracker.toggle_completed(t);
        }
        assert_eq!(tracker.completion_percentage(&plan), 100);
    }
}
