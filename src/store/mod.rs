// src/store/mod.rs

//! Persistence collaborators.
//!
//! The scoring and planning core only sees these traits; `SqliteStore` is the
//! production implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        question::{Difficulty, Question, SubjectCount},
        response::GradedAnswer,
        score::{HistoryEntry, ScoreSummary},
        test_paper::TestPaper,
    },
};

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Filter for question bank lookups. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    /// Matched case-insensitively.
    pub subject: Option<String>,
    pub difficulty: Option<Difficulty>,
}

#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Questions matching the filter, ordered by id.
    async fn find_questions(
        &self,
        filter: &QuestionFilter,
        limit: Option<i64>,
    ) -> Result<Vec<Question>, AppError>;

    async fn find_question_by_id(&self, question_id: &str) -> Result<Option<Question>, AppError>;

    /// Inserts all questions or none. An existing id yields `Conflict`.
    async fn insert_questions(&self, questions: &[Question]) -> Result<usize, AppError>;

    /// Returns false when no such question existed.
    async fn delete_question(&self, question_id: &str) -> Result<bool, AppError>;

    async fn list_subjects(&self) -> Result<Vec<SubjectCount>, AppError>;
}

#[async_trait]
pub trait TestStore: Send + Sync {
    async fn save_test(&self, test: &TestPaper) -> Result<(), AppError>;

    async fn load_test(&self, test_id: &str) -> Result<Option<TestPaper>, AppError>;

    /// Stores the graded answers and the summary of one submission,
    /// replacing any earlier submission for the same test.
    async fn save_submission(
        &self,
        test: &TestPaper,
        graded: &[GradedAnswer],
        summary: &ScoreSummary,
    ) -> Result<(), AppError>;

    async fn load_score_summary(&self, test_id: &str) -> Result<Option<ScoreSummary>, AppError>;

    /// Most recent summary of `user_id` other than `exclude_test_id`.
    async fn load_previous_score_summary(
        &self,
        user_id: &str,
        exclude_test_id: &str,
    ) -> Result<Option<ScoreSummary>, AppError>;

    /// The `limit` most recent submissions of the user, oldest first.
    async fn load_score_history(&self, user_id: &str, limit: i64) -> Result<Vec<HistoryEntry>, AppError>;

    /// Subject accuracy over every graded answer of the user.
    async fn load_cumulative_performance(&self, user_id: &str) -> Result<BTreeMap<String, f64>, AppError>;
}
