// src/services/allocation.rs

use std::collections::BTreeMap;

use crate::config::PlannerSettings;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalized weights (sum to 1); lower accuracy gets a larger share.
pub fn weakness_weights(performance: &BTreeMap<String, f64>, exponent: f64) -> BTreeMap<String, f64> {
    let raw: BTreeMap<String, f64> = performance
        .iter()
        .map(|(subject, accuracy)| {
            let weakness = 1.0 - accuracy.clamp(0.0, 100.0) / 100.0;
            (subject.clone(), weakness.powf(exponent))
        })
        .collect();

    let total: f64 = raw.values().sum();
    if total <= 0.0 {
        let uniform = 1.0 / raw.len().max(1) as f64;
        return raw.into_keys().map(|s| (s, uniform)).collect();
    }

    raw.into_iter().map(|(s, w)| (s, w / total)).collect()
}

/// Weekly study hours per subject: base hours plus a weakness-weighted share
/// of `extra_hours`, rescaled so the total stays at `sum(base) + extra_hours`.
pub fn allocate_weekly_hours(
    performance: &BTreeMap<String, f64>,
    settings: &PlannerSettings,
) -> BTreeMap<String, f64> {
    if performance.is_empty() {
        return BTreeMap::new();
    }

    let weights = weakness_weights(performance, settings.amplify_exponent);

    let base_for = |subject: &str| -> f64 {
        settings
            .base_hours
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(subject))
            .map(|(_, hours)| *hours)
            .unwrap_or(settings.fallback_base_hours)
    };

    let mut allocations: BTreeMap<String, f64> = weights
        .iter()
        .map(|(subject, weight)| (subject.clone(), base_for(subject.as_str()) + settings.extra_hours * weight))
        .collect();

    let desired_total: f64 = performance.keys().map(|s| base_for(s.as_str())).sum::<f64>() + settings.extra_hours;
    let current_total: f64 = allocations.values().sum();
    if current_total > 0.0 {
        let scale = desired_total / current_total;
        for hours in allocations.values_mut() {
            *hours = round2(*hours * scale);
        }
    }

    tracing::debug!(?allocations, "Allocated weekly hours");
    allocations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(s, a)| (s.to_string(), *a)).collect()
    }

    #[test]
    fn test_weights_sum_to_one_and_favor_weak() {
        let w = weakness_weights(&perf(&[("Polity", 30.0), ("History", 85.0)]), 1.6);
        let sum: f64 = w.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(w["Polity"] > w["History"]);
    }

    #[test]
    fn test_all_perfect_is_uniform() {
        let w = weakness_weights(&perf(&[("Polity", 100.0), ("History", 100.0)]), 1.6);
        assert_eq!(w["Polity"], 0.5);
        assert_eq!(w["History"], 0.5);
    }

    #[test]
    fn test_total_hours_preserved() {
        let settings = PlannerSettings::default();
        let hours = allocate_weekly_hours(
            &perf(&[("polity", 30.0), ("Economy", 55.0), ("Art", 90.0)]),
            &settings,
        );
        // polity 5 + Economy 4 + Art (fallback) 3 + extra 6
        let total: f64 = hours.values().sum();
        assert!((total - 18.0).abs() < 0.05);
        assert!(hours["polity"] > 5.0);
        assert!(hours["Art"] < hours["polity"]);
    }

    #[test]
    fn test_empty_performance() {
        assert!(allocate_weekly_hours(&BTreeMap::new(), &PlannerSettings::default()).is_empty());
    }
}
