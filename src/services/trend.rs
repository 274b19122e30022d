// src/services/trend.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::TREND_DELTA_POINTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStatus {
    Improved,
    Downgraded,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectTrend {
    pub subject: String,
    pub previous: f64,
    pub current: f64,
    pub delta: f64,
    pub status: TrendStatus,
}

/// Subject-by-subject comparison of two attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Previous test the comparison is anchored on, when known.
    pub previous_test_id: Option<String>,
    pub subjects: Vec<SubjectTrend>,
    pub improved: Vec<String>,
    pub downgraded: Vec<String>,
    pub stable: Vec<String>,
    pub summary: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compares the current accuracy against a previous attempt.
///
/// Returns `None` when there is no previous data. Subjects present on only
/// one side count as 0 on the other.
pub fn compare(
    previous: &BTreeMap<String, f64>,
    current: &BTreeMap<String, f64>,
    previous_test_id: Option<String>,
) -> Option<Comparison> {
    if previous.is_empty() {
        return None;
    }

    let subjects: BTreeSet<&String> = previous.keys().chain(current.keys()).collect();

    let mut comparison = Comparison {
        previous_test_id,
        subjects: Vec::with_capacity(subjects.len()),
        improved: Vec::new(),
        downgraded: Vec::new(),
        stable: Vec::new(),
        summary: String::new(),
    };

    for subject in subjects {
        let prev = previous.get(subject).copied().unwrap_or(0.0);
        let curr = current.get(subject).copied().unwrap_or(0.0);
        let delta = round2(curr - prev);

        let status = if delta >= TREND_DELTA_POINTS {
            TrendStatus::Improved
        } else if delta <= -TREND_DELTA_POINTS {
            TrendStatus::Downgraded
        } else {
            TrendStatus::Stable
        };

        match status {
            TrendStatus::Improved => comparison.improved.push(subject.clone()),
            TrendStatus::Downgraded => comparison.downgraded.push(subject.clone()),
            TrendStatus::Stable => comparison.stable.push(subject.clone()),
        }

        comparison.subjects.push(SubjectTrend {
            subject: subject.clone(),
            previous: prev,
            current: curr,
            delta,
            status,
        });
    }

    comparison.summary = summarize(&comparison.subjects);
    Some(comparison)
}

fn summarize(trends: &[SubjectTrend]) -> String {
    let list = |status: TrendStatus, with_delta: bool| -> Vec<String> {
        trends
            .iter()
            .filter(|t| t.status == status)
            .map(|t| {
                if with_delta {
                    format!("{} ({:+} pts)", t.subject, t.delta)
                } else {
                    t.subject.clone()
                }
            })
            .collect()
    };

    let mut parts = Vec::new();
    let improved = list(TrendStatus::Improved, true);
    if !improved.is_empty() {
        parts.push(format!("Improved: {}", improved.join(", ")));
    }
    let downgraded = list(TrendStatus::Downgraded, true);
    if !downgraded.is_empty() {
        parts.push(format!("Downgraded: {}", downgraded.join(", ")));
    }
    let stable = list(TrendStatus::Stable, false);
    if !stable.is_empty() {
        parts.push(format!("Stable: {}", stable.join(", ")));
    }

    if parts.is_empty() {
        "Performance comparable to previous attempt.".to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(s, a)| (s.to_string(), *a)).collect()
    }

    #[test]
    fn test_no_previous_data() {
        assert!(compare(&BTreeMap::new(), &perf(&[("Polity", 50.0)]), None).is_none());
    }

    #[test]
    fn test_thresholds() {
        let previous = perf(&[("Polity", 40.0), ("Economy", 60.0), ("History", 70.0)]);
        let current = perf(&[("Polity", 42.0), ("Economy", 58.0), ("History", 71.99)]);
        let cmp = compare(&previous, &current, Some("t-0".into())).unwrap();

        assert_eq!(cmp.improved, vec!["Polity".to_string()]);
        assert_eq!(cmp.downgraded, vec!["Economy".to_string()]);
        assert_eq!(cmp.stable, vec!["History".to_string()]);
        assert_eq!(cmp.previous_test_id.as_deref(), Some("t-0"));
    }

    #[test]
    fn test_missing_subject_counts_as_zero() {
        let cmp = compare(&perf(&[("Polity", 50.0)]), &perf(&[("Economy", 30.0)]), None).unwrap();
        let economy = cmp.subjects.iter().find(|t| t.subject == "Economy").unwrap();
        assert_eq!(economy.previous, 0.0);
        assert_eq!(economy.status, TrendStatus::Improved);
        let polity = cmp.subjects.iter().find(|t| t.subject == "Polity").unwrap();
        assert_eq!(polity.delta, -50.0);
    }

    #[test]
    fn test_summary_text() {
        let cmp = compare(
            &perf(&[("Polity", 30.0), ("Economy", 60.0)]),
            &perf(&[("Polity", 45.0), ("Economy", 60.0)]),
            None,
        )
        .unwrap();
        assert_eq!(cmp.summary, "Improved: Polity (+15 pts); Stable: Economy");
    }
}
