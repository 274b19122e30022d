// src/models/response.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One answered (or skipped) question in a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question_id: String,

    /// Selected option key. `None` or an empty string means unanswered.
    #[serde(default)]
    pub user_answer: Option<String>,

    /// Seconds spent on the question, if the client tracked it.
    #[serde(default)]
    pub time_taken: Option<f64>,
}

impl QuestionResponse {
    /// The selected key, treating an empty string as unanswered.
    pub fn selected(&self) -> Option<&str> {
        self.user_answer.as_deref().filter(|a| !a.is_empty())
    }
}

/// DTO for submitting a test attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitTestRequest {
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,

    #[validate(length(min = 1, max = 64))]
    pub test_id: String,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub responses: Vec<QuestionResponse>,
}

/// A frozen question after grading. One per question of the test, answered
/// or not; persisted for cumulative performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: String,
    pub subject: String,
    pub topic: String,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub correct: bool,
    pub time_taken: Option<f64>,
}
