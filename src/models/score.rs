// src/models/score.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::trend::Comparison;
use crate::services::tier::Tier;

/// Derived result of scoring one test. Recomputed from the test and its
/// responses; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub test_id: String,
    pub user_id: String,
    pub total_questions: usize,
    pub answered_count: usize,
    pub correct_count: usize,

    /// round(100 * correct / total_questions), 0..=100.
    pub score_percent: u32,

    /// Subject to accuracy (0..=100) over that subject's questions in the test.
    pub subject_accuracy: BTreeMap<String, u32>,

    /// Missed or skipped questions, in test order.
    pub review: Vec<ReviewItem>,

    /// Response entries that referenced questions outside the test.
    pub ignored_question_ids: Vec<String>,
}

impl ScoreSummary {
    pub fn accuracy_as_performance(&self) -> BTreeMap<String, f64> {
        self.subject_accuracy
            .iter()
            .map(|(s, a)| (s.clone(), f64::from(*a)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub question_id: String,
    pub subject: String,
    pub topic: String,
    pub selected_answer: Option<String>,
    pub correct_answer: String,
}

/// Response body for a submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTestResponse {
    pub status: String,
    #[serde(flatten)]
    pub summary: ScoreSummary,
    pub classification: BTreeMap<String, Tier>,
    pub comparison: Option<Comparison>,
}

/// Subject accuracy with its tier, for performance endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct PerformanceResponse {
    pub scope: String,
    pub id: String,
    pub performance: BTreeMap<String, f64>,
    pub classification: BTreeMap<String, Tier>,
}

/// One past submission in a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: ScoreSummary,
}

/// Response body for a user's recent submissions, oldest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub user_id: String,
    pub available: bool,
    pub entries: Vec<HistoryEntry>,
}

/// Aggregated row for cumulative performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubjectStat {
    pub subject: String,
    pub attempted: i64,
    pub correct: i64,
}

impl SubjectStat {
    /// Accuracy rounded to two decimals; 0 when nothing was attempted.
    pub fn accuracy(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        let raw = self.correct as f64 / self.attempted as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    }
}
