// src/models/test_paper.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::{PublicQuestion, Question};

/// Subject label stored on tests assembled with the mixed pattern.
pub const MIXED_SUBJECT: &str = "Mixed";

/// An assembled test.
///
/// The question list is a frozen snapshot taken at assembly time; scoring
/// always uses it instead of the live bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPaper {
    pub test_id: String,
    pub user_id: Option<String>,
    pub subject: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl TestPaper {
    pub fn to_public(&self) -> PublicTestPaper {
        PublicTestPaper {
            test_id: self.test_id.clone(),
            subject: self.subject.clone(),
            total_questions: self.questions.len(),
            questions: self.questions.iter().map(Question::to_public).collect(),
            created_at: self.created_at,
        }
    }
}

/// DTO for returning a generated test to the test taker.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicTestPaper {
    pub test_id: String,
    pub subject: String,
    pub total_questions: usize,
    pub questions: Vec<PublicQuestion>,
    pub created_at: DateTime<Utc>,
}

/// How questions are drawn for a test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestPattern {
    /// All questions from one subject.
    #[default]
    Subject,
    /// Weighted draw across the configured subjects.
    Mixed,
}

/// Query parameters for `GET /api/tests/generate`.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateTestParams {
    #[validate(length(min = 1, max = 64))]
    pub subject: Option<String>,
    pub difficulty: Option<String>,
    #[validate(range(min = 1))]
    pub count: Option<usize>,
    #[serde(default)]
    pub pattern: TestPattern,
    #[validate(length(min = 1, max = 100))]
    pub user_id: Option<String>,
}
