// src/services/planner.rs

use std::collections::BTreeMap;

use crate::{
    error::AppError,
    models::plan::Plan,
    services::tier::{Tier, classify_all},
};

const WEAK_ACTIVITIES: &[&str] = &[
    "build foundations from NCERT basics and make short notes",
    "topic-wise concept drill with 20 previous-year questions",
    "timed set of 30 MCQs followed by answer review",
    "error-log review and re-attempt of missed questions",
    "mini mock of 25 questions under exam conditions",
];

const MODERATE_ACTIVITIES: &[&str] = &[
    "revise core notes and solve 20 MCQs",
    "timed practice of 30 MCQs with answer analysis",
    "previous-year questions and error-log review",
    "sectional test of 25 questions",
    "consolidate shaky topics from the error log",
];

const MAINTENANCE_ACTIVITIES: &[&str] = &[
    "quick revision of key notes and 10 MCQs",
    "current-affairs linkage and 15 MCQs",
    "timed sectional test of 25 questions",
    "error-log skim and flashcard revision",
    "full-length mixed mock under exam conditions",
];

/// Day (1-based) reserved for the single moderate review day.
const REVIEW_DAY: usize = 4;
/// Day (1-based) reserved for the single light revision day of strong subjects.
const LIGHT_DAY: usize = 6;

/// Tier that receives the bulk of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Weak,
    Moderate,
    Maintenance,
}

impl Focus {
    fn activities(&self) -> &'static [&'static str] {
        match self {
            Focus::Weak => WEAK_ACTIVITIES,
            Focus::Moderate => MODERATE_ACTIVITIES,
            Focus::Maintenance => MAINTENANCE_ACTIVITIES,
        }
    }
}

/// Subjects of each tier, ordered by ascending accuracy then name.
struct Tiers {
    weak: Vec<String>,
    moderate: Vec<String>,
    strong: Vec<String>,
}

impl Tiers {
    fn partition(performance: &BTreeMap<String, f64>) -> Result<Self, AppError> {
        if performance.keys().any(|subject| subject.trim().is_empty()) {
            return Err(AppError::Validation("subject names must not be blank".to_string()));
        }
        let classified = classify_all(performance)?;

        let mut ranked: Vec<(&String, f64, Tier)> = performance
            .iter()
            .zip(classified.values())
            .map(|((subject, accuracy), tier)| (subject, *accuracy, *tier))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

        let mut tiers = Tiers {
            weak: Vec::new(),
            moderate: Vec::new(),
            strong: Vec::new(),
        };
        for (subject, _, tier) in ranked {
            match tier {
                Tier::Weak => tiers.weak.push(subject.clone()),
                Tier::Moderate => tiers.moderate.push(subject.clone()),
                Tier::Strong => tiers.strong.push(subject.clone()),
            }
        }
        Ok(tiers)
    }

    fn focus(&self) -> (Focus, &[String]) {
        if !self.weak.is_empty() {
            (Focus::Weak, self.weak.as_slice())
        } else if !self.moderate.is_empty() {
            (Focus::Moderate, self.moderate.as_slice())
        } else {
            (Focus::Maintenance, self.strong.as_slice())
        }
    }
}

/// Builds the study plan for a subject -> accuracy mapping.
///
/// Fails with `Validation` on an empty mapping: a plan needs at least one
/// scored subject, and callers surface "take a test first" instead.
pub fn build_plan(performance: &BTreeMap<String, f64>) -> Result<Plan, AppError> {
    if performance.is_empty() {
        return Err(AppError::Validation(
            "No performance data available; take a test first".to_string(),
        ));
    }

    let tiers = Tiers::partition(performance)?;
    let seven_day_plan = seven_day_plan(&tiers);
    let thirty_day_plan = thirty_day_plan(&tiers);

    tracing::debug!(
        weak = tiers.weak.len(),
        moderate = tiers.moderate.len(),
        strong = tiers.strong.len(),
        "Built study plan"
    );

    Ok(Plan {
        weak_subjects: tiers.weak,
        moderate_subjects: tiers.moderate,
        strong_subjects: tiers.strong,
        seven_day_plan,
        thirty_day_plan,
    })
}

/// Seven entries. Focus subjects rotate weakest-first on every day except
/// the review day (moderate subjects, only while weak subjects exist) and
/// the light day (strong subjects, unless they are the focus).
fn seven_day_plan(tiers: &Tiers) -> Vec<String> {
    let (focus, focus_subjects) = tiers.focus();
    let review = (focus == Focus::Weak && !tiers.moderate.is_empty()).then_some(&tiers.moderate);
    let light = (focus != Focus::Maintenance && !tiers.strong.is_empty()).then_some(&tiers.strong);

    let activities = focus.activities();
    let mut rotation = 0;

    (1..=7)
        .map(|day| match (day, review, light) {
            (REVIEW_DAY, Some(subjects), _) => format!(
                "Day {} - {}: revise notes and solve 20 MCQs per subject",
                day,
                subjects.join(", ")
            ),
            (LIGHT_DAY, _, Some(subjects)) => format!(
                "Day {} - {}: light revision and 10 MCQs to stay sharp",
                day,
                subjects.join(", ")
            ),
            _ => {
                let subject = &focus_subjects[rotation % focus_subjects.len()];
                let round = rotation / focus_subjects.len();
                rotation += 1;
                format!("Day {} - {}: {}", day, subject, activities[round % activities.len()])
            }
        })
        .collect()
}

/// Weekly blocks ramping from foundations to mixed mocks, then a closing
/// block for days 29-30. Strong subjects get exactly two light-touch items
/// unless every subject is strong.
fn thirty_day_plan(tiers: &Tiers) -> Vec<String> {
    let (focus, focus_subjects) = tiers.focus();
    let weakest = &focus_subjects[0];

    if focus == Focus::Maintenance {
        let all = tiers.strong.join(", ");
        return vec![
            format!("Week 1 (Days 1-7): maintenance revision of {} - one topic per day with 15 MCQs", all),
            format!("Week 2 (Days 8-14): previous-year questions across {} linked with current affairs", all),
            format!("Week 3 (Days 15-21): sectional tests for {} with error-log review", all),
            "Week 4 (Days 22-28): two full-length mixed mocks across all subjects and error-log fixes".to_string(),
            format!("Days 29-30: light final revision of {} and flashcards", weakest),
        ];
    }

    let focus_list = focus_subjects.join(", ");
    let support = (focus == Focus::Weak && !tiers.moderate.is_empty()).then(|| tiers.moderate.join(", "));
    let light = (!tiers.strong.is_empty()).then(|| tiers.strong.join(", "));

    let mut plan = vec![format!(
        "Week 1 (Days 1-7): foundation work on {} - NCERT basics, short notes and topic-wise PYQs",
        focus_list
    )];
    if let Some(moderate) = &support {
        plan.push(format!("Week 1 (Days 1-7): keep {} warm with two revision sessions", moderate));
    }

    plan.push(format!(
        "Week 2 (Days 8-14): deepen {} with standard reference books and 30 MCQs a day",
        focus_list
    ));
    if let Some(moderate) = &support {
        plan.push(format!("Week 2 (Days 8-14): strengthen {} with test-series practice", moderate));
    }
    if let Some(strong) = &light {
        plan.push(format!("Week 2 (Days 8-14): light-touch revision of {} in one short session", strong));
    }

    let integrated: Vec<&str> = tiers
        .weak
        .iter()
        .chain(tiers.moderate.iter())
        .map(String::as_str)
        .collect();
    plan.push(format!(
        "Week 3 (Days 15-21): integrated revision across {} with answer writing and two sectional mocks",
        integrated.join(", ")
    ));

    plan.push("Week 4 (Days 22-28): two full-length mixed mocks across all subjects and error-log fixes".to_string());
    if let Some(strong) = &light {
        plan.push(format!("Week 4 (Days 22-28): light-touch revision of {} before the mocks", strong));
    }

    plan.push(format!("Days 29-30: consolidate {} and re-attempt missed questions", weakest));
    plan
}
