//! Study-plan construction: focus-weighted ordering plus greedy weekly
//! bin-packing under a minute budget.

use chrono::{DateTime, Utc};
use std::cmp::Reverse;

use crate::model::{CourseData, CourseLesson, Focus, StudyPlan, WeekBucket};

/// Floor for the weekly minute budget.
pub const MIN_WEEKLY_MINUTES: u32 = 60;

/// Assumed duration for lessons with no (or zero) estimate.
pub const DEFAULT_LESSON_MINUTES: u32 = 20;

/// Derive the weekly minute budget from an hours-per-week preference.
///
/// Non-finite or non-positive input collapses to the floor; otherwise the
/// budget is `round(hours * 60)`, never below [`MIN_WEEKLY_MINUTES`].
#[must_use]
pub fn weekly_minutes(hours_per_week: f64) -> u32 {
    if !hours_per_week.is_finite() || hours_per_week <= 0.0 {
        return MIN_WEEKLY_MINUTES;
    }
    let minutes = (hours_per_week * 60.0).round();
    if minutes < f64::from(MIN_WEEKLY_MINUTES) {
        MIN_WEEKLY_MINUTES
    } else {
        minutes.min(f64::from(u32::MAX)) as u32
    }
}

fn focus_score(lesson: &CourseLesson, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|kw| {
            lesson
                .tags
                .iter()
                .any(|tag| tag == *kw || tag.contains(*kw))
        })
        .count()
}

fn lesson_minutes(lesson: &CourseLesson) -> u32 {
    lesson
        .est_min
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_LESSON_MINUTES)
}

/// Build a study plan covering the *entire* catalog.
///
/// Lessons are stable-sorted descending by focus score (ties keep catalog
/// order, the editorial default sequence) and then packed greedily, in sorted
/// order, into weekly buckets: a lesson goes into the current week if it fits
/// the remaining budget or the week is still empty, so an oversized lesson
/// occupies a week alone rather than being dropped. Every lesson appears in
/// exactly one week. An empty catalog yields a single empty week.
#[must_use]
pub fn build_plan(
    catalog: &CourseData,
    hours_per_week: f64,
    focus: Focus,
    now: DateTime<Utc>,
) -> StudyPlan {
    let mins_per_week = weekly_minutes(hours_per_week);
    let keywords = focus.keywords();

    let mut ordered: Vec<&CourseLesson> = catalog.lessons.iter().collect();
    // sort_by_key is stable, which keeps catalog order among equal scores.
    ordered.sort_by_key(|lesson| Reverse(focus_score(lesson, keywords)));

    let mut weeks = vec![WeekBucket {
        week: 1,
        minutes: mins_per_week,
        lesson_ids: Vec::new(),
    }];
    // Signed: an oversized lesson may leave the budget negative.
    let mut remaining = i64::from(mins_per_week);

    for lesson in ordered {
        let est = i64::from(lesson_minutes(lesson));
        let current_is_empty = weeks[weeks.len() - 1].lesson_ids.is_empty();
        if est > remaining && !current_is_empty {
            weeks.push(WeekBucket {
                week: weeks.len() as u32 + 1,
                minutes: mins_per_week,
                lesson_ids: Vec::new(),
            });
            remaining = i64::from(mins_per_week);
        }
        let last = weeks.len() - 1;
        weeks[last].lesson_ids.push(lesson.id.clone());
        remaining -= est;
    }

    StudyPlan {
        focus,
        // serde_json cannot represent non-finite floats; store the floor's
        // hour equivalent instead.
        hours_per_week: if hours_per_week.is_finite() {
            hours_per_week
        } else {
            1.0
        },
        mins_per_week,
        weeks,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn lesson(id: &str, est_min: Option<u32>, tags: &[&str]) -> CourseLesson {
        CourseLesson {
            id: id.to_owned(),
            module_id: "m1".to_owned(),
            module_title: "Module".to_owned(),
            title: id.to_owned(),
            est_min,
            objectives: Vec::new(),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            content_html: String::new(),
        }
    }

    fn catalog(lessons: Vec<CourseLesson>) -> CourseData {
        CourseData {
            version: "test".to_owned(),
            generated_at: None,
            modules: Vec::new(),
            lessons,
        }
    }

    fn flattened(plan: &StudyPlan) -> Vec<String> {
        plan.lesson_ids().iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn weekly_minutes_floors_and_rounds() {
        assert_eq!(weekly_minutes(1.0), 60);
        assert_eq!(weekly_minutes(2.5), 150);
        assert_eq!(weekly_minutes(0.25), 60);
        assert_eq!(weekly_minutes(0.0), 60);
        assert_eq!(weekly_minutes(-3.0), 60);
        assert_eq!(weekly_minutes(f64::NAN), 60);
        assert_eq!(weekly_minutes(f64::INFINITY), 60);
    }

    #[test]
    fn packs_in_sorted_order_not_catalog_order() {
        // A(30, marketing) scores 1; B(45) and C(10) tie at 0 and keep
        // catalog order, so the packer walks [A, B, C]: B (45) does not fit
        // after A (30 of 60) and week 1 is non-empty, so it opens week 2;
        // C (10) then fits week 2's remaining 15.
        let data = catalog(vec![
            lesson("A", Some(30), &["marketing"]),
            lesson("B", Some(45), &["ai"]),
            lesson("C", Some(10), &[]),
        ]);

        let plan = build_plan(&data, 1.0, Focus::Marketing, fixed_now());

        assert_eq!(plan.mins_per_week, 60);
        assert_eq!(plan.week_count(), 2);
        assert_eq!(plan.weeks[0].week, 1);
        assert_eq!(plan.weeks[0].lesson_ids, vec!["A"]);
        assert_eq!(plan.weeks[1].week, 2);
        assert_eq!(plan.weeks[1].lesson_ids, vec!["B", "C"]);
    }

    #[test]
    fn every_lesson_appears_exactly_once() {
        let data = catalog(vec![
            lesson("a", Some(25), &["api"]),
            lesson("b", None, &["ai-agent"]),
            lesson("c", Some(90), &[]),
            lesson("d", Some(40), &["marketing", "workflow"]),
            lesson("e", Some(15), &["rag", "embeddings"]),
        ]);

        for focus in [Focus::Balanced, Focus::Marketing, Focus::Api, Focus::Ai] {
            let plan = build_plan(&data, 1.5, focus, fixed_now());
            let mut ids = flattened(&plan);
            assert_eq!(ids.len(), data.lesson_count());
            ids.sort();
            assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
            let weeks: Vec<u32> = plan.weeks.iter().map(|w| w.week).collect();
            assert_eq!(weeks, (1..=plan.weeks.len() as u32).collect::<Vec<_>>());
        }
    }

    #[test]
    fn balanced_focus_keeps_catalog_order() {
        let data = catalog(vec![
            lesson("x", Some(10), &["ai"]),
            lesson("y", Some(10), &["marketing"]),
            lesson("z", Some(10), &[]),
        ]);

        let plan = build_plan(&data, 3.0, Focus::Balanced, fixed_now());
        assert_eq!(flattened(&plan), vec!["x", "y", "z"]);
    }

    #[test]
    fn equal_scores_preserve_catalog_order() {
        let data = catalog(vec![
            lesson("first", Some(10), &["api"]),
            lesson("second", Some(10), &["http"]),
            lesson("third", Some(10), &["nothing"]),
        ]);

        // first and second both score 1 under the api focus.
        let plan = build_plan(&data, 3.0, Focus::Api, fixed_now());
        assert_eq!(flattened(&plan), vec!["first", "second", "third"]);
    }

    #[test]
    fn substring_match_counts_toward_score() {
        let data = catalog(vec![
            lesson("plain", Some(10), &[]),
            lesson("agent", Some(10), &["ai-agent"]),
        ]);

        // The "ai" keyword is contained in the "ai-agent" tag.
        let plan = build_plan(&data, 3.0, Focus::Ai, fixed_now());
        assert_eq!(flattened(&plan), vec!["agent", "plain"]);
    }

    #[test]
    fn oversized_lesson_gets_its_own_week() {
        let data = catalog(vec![
            lesson("big", Some(300), &[]),
            lesson("small", Some(10), &[]),
        ]);

        let plan = build_plan(&data, 1.0, Focus::Balanced, fixed_now());
        assert_eq!(plan.weeks[0].lesson_ids, vec!["big"]);
        assert_eq!(plan.weeks[1].lesson_ids, vec!["small"]);
    }

    #[test]
    fn missing_and_zero_estimates_default_to_twenty_minutes() {
        let data = catalog(vec![
            lesson("a", None, &[]),
            lesson("b", Some(0), &[]),
            lesson("c", None, &[]),
        ]);

        // 60-minute budget fits exactly three 20-minute lessons.
        let plan = build_plan(&data, 1.0, Focus::Balanced, fixed_now());
        assert_eq!(plan.week_count(), 1);
        assert_eq!(plan.weeks[0].lesson_ids.len(), 3);
    }

    #[test]
    fn empty_catalog_yields_a_single_empty_week() {
        let plan = build_plan(&CourseData::empty(), 2.0, Focus::Ai, fixed_now());
        assert_eq!(plan.week_count(), 1);
        assert_eq!(plan.weeks[0].week, 1);
        assert!(plan.weeks[0].lesson_ids.is_empty());
        assert_eq!(plan.weeks[0].minutes, 120);
    }

    #[test]
    fn non_finite_hours_are_sanitized_in_the_stored_plan() {
        let plan = build_plan(&CourseData::empty(), f64::NAN, Focus::Balanced, fixed_now());
        assert_eq!(plan.hours_per_week, 1.0);
        assert_eq!(plan.mins_per_week, 60);
        assert!(serde_json::to_string(&plan).is_ok());
    }
}
