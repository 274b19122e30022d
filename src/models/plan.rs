// src/models/plan.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::tier::Tier;
use crate::services::trend::Comparison;

/// A study plan derived from per-subject accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub weak_subjects: Vec<String>,
    pub moderate_subjects: Vec<String>,
    pub strong_subjects: Vec<String>,

    /// Exactly seven entries, one per day.
    #[serde(rename = "7_day_plan")]
    pub seven_day_plan: Vec<String>,

    /// Weekly blocks followed by a closing block for days 29-30.
    #[serde(rename = "30_day_plan")]
    pub thirty_day_plan: Vec<String>,
}

/// DTO for `POST /api/planner`.
///
/// `performance` wins when non-empty; otherwise the summary of `test_id`,
/// then the cumulative performance of `user_id`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PlanRequest {
    #[serde(default)]
    pub performance: BTreeMap<String, f64>,
    #[validate(length(min = 1, max = 100))]
    pub user_id: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub test_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan: Plan,
    pub classification: BTreeMap<String, Tier>,
    pub weekly_hours: BTreeMap<String, f64>,
    pub comparison: Option<Comparison>,
}
