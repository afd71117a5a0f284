//! crates/medprep_core/src/planner.rs
//!
//! Deterministic study-plan generation: allocates the topics of the
//! selected subjects across the calendar days left before the exam, with
//! weak-subject topics scheduled first.

use chrono::{Duration, NaiveDate};

use crate::catalog::TopicCatalog;
use crate::domain::{DayEntry, StudyPlan};

/// Date strings accepted from clients, e.g. "2026-11-03".
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation failures when generating a plan. All of these are recoverable
/// by the caller re-prompting for corrected input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("'{0}' is not a valid date (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("the exam date must be in the future")]
    ExamInPast,

    #[error("unknown subjects: {}", .0.join(", "))]
    UnknownSubject(Vec<String>),
}

/// Generates a day-by-day study plan.
///
/// The allocation queue is the weak-subject topics, in full, followed by
/// the remaining selected-subject topics (set-difference by topic name).
/// The queue is sliced into buckets of `ceil(total / days)` topics, one
/// bucket per calendar day starting at `today`. The walk stops at the exam
/// date; whatever is still queued at that point is dropped, so the plan
/// never schedules on or past the exam day.
///
/// Weak subjects are not required to be a subset of the selection. A weak
/// subject outside it still schedules its topics, and `total_topics` does
/// not count them — carried over from the original behavior.
pub fn generate_plan(
    catalog: &TopicCatalog,
    exam_date: &str,
    selected_subjects: &[String],
    weak_subjects: &[String],
    today: NaiveDate,
) -> Result<StudyPlan, PlanError> {
    let exam_date = NaiveDate::parse_from_str(exam_date.trim(), DATE_FORMAT)
        .map_err(|_| PlanError::InvalidDate(exam_date.to_string()))?;

    let days_until_exam = (exam_date - today).num_days();
    if days_until_exam <= 0 {
        return Err(PlanError::ExamInPast);
    }

    let unknown: Vec<String> = selected_subjects
        .iter()
        .filter(|s| !catalog.contains(s))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(PlanError::UnknownSubject(unknown));
    }

    let all_topics = catalog.topics_for(selected_subjects);
    let weak_topics = catalog.topics_for(weak_subjects);
    let regular_topics: Vec<String> = all_topics
        .iter()
        .filter(|t| !weak_topics.contains(t))
        .cloned()
        .collect();

    let total_topics = all_topics.len();
    let topics_per_day = total_topics.div_ceil(days_until_exam as usize);

    // Weak-subject topics go first, front-loading weak areas.
    let mut queue: Vec<String> = weak_topics;
    queue.extend(regular_topics);
    let mut queue = queue.into_iter();

    let mut daily_plan = Vec::new();
    let mut current_day = today;
    let mut remaining = queue.len();
    while remaining > 0 && current_day < exam_date {
        let topics: Vec<String> = queue.by_ref().take(topics_per_day).collect();
        remaining -= topics.len();
        daily_plan.push(DayEntry {
            date: current_day,
            topics,
        });
        current_day += Duration::days(1);
    }

    Ok(StudyPlan {
        exam_date,
        days_remaining: days_until_exam as u32,
        daily_plan,
        total_topics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TopicCatalog {
        TopicCatalog::new(vec![
            ("Anatomy", vec!["Upper Limb", "Lower Limb", "Thorax", "Abdomen"]),
            ("Physiology", vec!["Blood", "CVS", "Renal"]),
            ("Pathology", vec!["Neoplasia", "Inflammation"]),
        ])
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn subjects(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rejects_malformed_date() {
        let err = generate_plan(&catalog(), "next tuesday", &subjects(&["Anatomy"]), &[], today())
            .unwrap_err();
        assert_eq!(err, PlanError::InvalidDate("next tuesday".into()));
    }

    #[test]
    fn rejects_exam_today_or_earlier() {
        let err =
            generate_plan(&catalog(), "2026-03-01", &subjects(&["Anatomy"]), &[], today())
                .unwrap_err();
        assert_eq!(err, PlanError::ExamInPast);

        let err =
            generate_plan(&catalog(), "2026-02-10", &subjects(&["Anatomy"]), &[], today())
                .unwrap_err();
        assert_eq!(err, PlanError::ExamInPast);
    }

    #[test]
    fn rejects_unknown_selected_subjects_naming_them() {
        let err = generate_plan(
            &catalog(),
            "2026-03-11",
            &subjects(&["Anatomy", "Astrology", "Alchemy"]),
            &[],
            today(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PlanError::UnknownSubject(vec!["Astrology".into(), "Alchemy".into()])
        );
    }

    #[test]
    fn ten_day_plan_front_loads_weak_subjects() {
        let plan = generate_plan(
            &catalog(),
            "2026-03-11",
            &subjects(&["Anatomy", "Physiology"]),
            &subjects(&["Physiology"]),
            today(),
        )
        .unwrap();

        assert_eq!(plan.days_remaining, 10);
        assert_eq!(plan.total_topics, 7);

        let flattened: Vec<&str> = plan
            .daily_plan
            .iter()
            .flat_map(|d| d.topics.iter().map(String::as_str))
            .collect();
        assert_eq!(
            flattened,
            vec!["Blood", "CVS", "Renal", "Upper Limb", "Lower Limb", "Thorax", "Abdomen"]
        );

        // ceil(7 / 10) == 1 topic per day, consecutive dates from today.
        for (i, day) in plan.daily_plan.iter().enumerate() {
            assert_eq!(day.date, today() + Duration::days(i as i64));
            assert!(day.topics.len() <= 1);
        }
    }

    #[test]
    fn respects_day_count_and_per_day_caps() {
        let plan = generate_plan(
            &catalog(),
            "2026-03-04",
            &subjects(&["Anatomy", "Physiology", "Pathology"]),
            &[],
            today(),
        )
        .unwrap();

        // 9 topics over 3 days -> 3 per day.
        assert_eq!(plan.daily_plan.len(), 3);
        for day in &plan.daily_plan {
            assert!(day.topics.len() <= 3);
        }
        assert!(plan.daily_plan.len() <= plan.days_remaining as usize);
    }

    #[test]
    fn drops_overflow_at_exam_date() {
        // 9 topics, 2 days before the exam, 5 per day: the last topic in
        // the queue never gets a slot.
        let plan = generate_plan(
            &catalog(),
            "2026-03-03",
            &subjects(&["Anatomy", "Physiology", "Pathology"]),
            &[],
            today(),
        )
        .unwrap();

        let scheduled: usize = plan.daily_plan.iter().map(|d| d.topics.len()).sum();
        assert_eq!(plan.daily_plan.len(), 2);
        assert_eq!(scheduled, 9);

        let tight = generate_plan(
            &catalog(),
            "2026-03-02",
            &subjects(&["Anatomy", "Physiology", "Pathology"]),
            &[],
            today(),
        )
        .unwrap();
        let scheduled: usize = tight.daily_plan.iter().map(|d| d.topics.len()).sum();
        assert_eq!(tight.daily_plan.len(), 1);
        assert_eq!(scheduled, 9);
        assert!(tight.daily_plan.iter().all(|d| d.date < tight.exam_date));
    }

    #[test]
    fn weak_subject_outside_selection_adds_uncounted_topics() {
        let plan = generate_plan(
            &catalog(),
            "2026-03-11",
            &subjects(&["Anatomy"]),
            &subjects(&["Pathology"]),
            today(),
        )
        .unwrap();

        // total_topics reflects the selection only...
        assert_eq!(plan.total_topics, 4);
        // ...but the weak subject's topics were scheduled anyway, first.
        let flattened: Vec<&str> = plan
            .daily_plan
            .iter()
            .flat_map(|d| d.topics.iter().map(String::as_str))
            .collect();
        assert_eq!(flattened[..2], ["Neoplasia", "Inflammation"]);
        assert_eq!(flattened.len(), 6);
    }

    #[test]
    fn empty_selection_with_weak_topics_emits_empty_days() {
        // ceil(0 / days) == 0 topics per day: the walk still runs to the
        // exam date, producing empty entries, and the weak topics are
        // never scheduled.
        let plan = generate_plan(
            &catalog(),
            "2026-03-04",
            &[],
            &subjects(&["Anatomy"]),
            today(),
        )
        .unwrap();

        assert_eq!(plan.total_topics, 0);
        assert_eq!(plan.daily_plan.len(), 3);
        assert!(plan.daily_plan.iter().all(|d| d.topics.is_empty()));
    }

    #[test]
    fn duplicate_weak_and_selected_topics_are_not_scheduled_twice() {
        let plan = generate_plan(
            &catalog(),
            "2026-03-11",
            &subjects(&["Physiology"]),
            &subjects(&["Physiology"]),
            today(),
        )
        .unwrap();

        let flattened: Vec<&str> = plan
            .daily_plan
            .iter()
            .flat_map(|d| d.topics.iter().map(String::as_str))
            .collect();
        assert_eq!(flattened, vec!["Blood", "CVS", "Renal"]);
        assert_eq!(plan.total_topics, 3);
    }
}
