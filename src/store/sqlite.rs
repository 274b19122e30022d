// src/store/sqlite.rs

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    error::AppError,
    models::{
        question::{Difficulty, Question, SubjectCount},
        response::GradedAnswer,
        score::{HistoryEntry, ScoreSummary, SubjectStat},
        test_paper::TestPaper,
    },
    store::{QuestionBank, QuestionFilter, TestStore},
    utils::subject::normalize_subject,
};

/// Opens a SQLite pool. In-memory databases are per connection, so they get
/// a single connection that is never recycled.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options.connect_with(options).await
}

/// Applies the embedded migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Helper struct for reading the 'questions' table.
#[derive(sqlx::FromRow)]
struct QuestionRow {
    question_id: String,
    subject: String,
    topic: String,
    difficulty: String,
    question: String,
    options: String,
    correct_answer: String,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let difficulty = Difficulty::from_str(&row.difficulty).map_err(|e| {
            AppError::InternalServerError(format!("question {}: {}", row.question_id, e))
        })?;
        let options = serde_json::from_str(&row.options).map_err(|e| {
            AppError::InternalServerError(format!("question {} has corrupt options: {}", row.question_id, e))
        })?;

        Ok(Question {
            question_id: row.question_id,
            subject: row.subject,
            topic: row.topic,
            difficulty,
            question: row.question,
            options,
            correct_answer: row.correct_answer,
        })
    }
}

/// Helper struct for reading the 'tests' table.
#[derive(sqlx::FromRow)]
struct TestRow {
    test_id: String,
    user_id: Option<String>,
    subject: String,
    questions: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TestRow> for TestPaper {
    type Error = AppError;

    fn try_from(row: TestRow) -> Result<Self, Self::Error> {
        let questions = serde_json::from_str(&row.questions).map_err(|e| {
            AppError::InternalServerError(format!("test {} has a corrupt snapshot: {}", row.test_id, e))
        })?;

        Ok(TestPaper {
            test_id: row.test_id,
            user_id: row.user_id,
            subject: row.subject,
            questions,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    summary: String,
    submitted_at: DateTime<Utc>,
}

fn decode_summary(raw: &str) -> Result<ScoreSummary, AppError> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::InternalServerError(format!("corrupt score summary: {}", e)))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// SQLite-backed question bank and test store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionBank for SqliteStore {
    async fn find_questions(
        &self,
        filter: &QuestionFilter,
        limit: Option<i64>,
    ) -> Result<Vec<Question>, AppError> {
        let subject = filter.subject.as_deref().map(normalize_subject);
        let difficulty = filter.difficulty.map(|d| d.as_str());

        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question_id, subject, topic, difficulty, question, options, correct_answer
            FROM questions
            WHERE (? IS NULL OR subject = ? COLLATE NOCASE)
              AND (? IS NULL OR difficulty = ?)
            ORDER BY question_id
            LIMIT ?
            "#,
        )
        .bind(&subject)
        .bind(&subject)
        .bind(difficulty)
        .bind(difficulty)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions: {:?}", e);
            AppError::from(e)
        })?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn find_question_by_id(&self, question_id: &str) -> Result<Option<Question>, AppError> {
        sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question_id, subject, topic, difficulty, question, options, correct_answer
            FROM questions
            WHERE question_id = ?
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Question::try_from)
        .transpose()
    }

    async fn insert_questions(&self, questions: &[Question]) -> Result<usize, AppError> {
        let mut tx = self.pool.begin().await?;

        for q in questions {
            sqlx::query(
                r#"
                INSERT INTO questions (question_id, subject, topic, difficulty, question, options, correct_answer)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&q.question_id)
            .bind(&q.subject)
            .bind(&q.topic)
            .bind(q.difficulty.as_str())
            .bind(&q.question)
            .bind(encode(&q.options)?)
            .bind(&q.correct_answer)
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::Conflict(format!("Question '{}' already exists", q.question_id))
                }
                _ => {
                    tracing::error!("Failed to insert question: {:?}", e);
                    AppError::from(e)
                }
            })?;
        }

        tx.commit().await?;
        Ok(questions.len())
    }

    async fn delete_question(&self, question_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM questions WHERE question_id = ?")
            .bind(question_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_subjects(&self) -> Result<Vec<SubjectCount>, AppError> {
        let subjects = sqlx::query_as::<_, SubjectCount>(
            r#"
            SELECT subject, COUNT(*) AS questions
            FROM questions
            GROUP BY subject
            ORDER BY subject
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subjects)
    }
}

#[async_trait]
impl TestStore for SqliteStore {
    async fn save_test(&self, test: &TestPaper) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tests (test_id, user_id, subject, questions, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&test.test_id)
        .bind(&test.user_id)
        .bind(&test.subject)
        .bind(encode(&test.questions)?)
        .bind(test.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save test {}: {:?}", test.test_id, e);
            AppError::from(e)
        })?;

        Ok(())
    }

    async fn load_test(&self, test_id: &str) -> Result<Option<TestPaper>, AppError> {
        sqlx::query_as::<_, TestRow>(
            "SELECT test_id, user_id, subject, questions, created_at FROM tests WHERE test_id = ?",
        )
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?
        .map(TestPaper::try_from)
        .transpose()
    }

    async fn save_submission(
        &self,
        test: &TestPaper,
        graded: &[GradedAnswer],
        summary: &ScoreSummary,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Resubmitting replaces the earlier attempt for this test.
        sqlx::query("DELETE FROM responses WHERE test_id = ?")
            .bind(&test.test_id)
            .execute(&mut *tx)
            .await?;

        for answer in graded {
            sqlx::query(
                r#"
                INSERT INTO responses
                    (test_id, user_id, question_id, subject, topic, user_answer, correct_answer, correct, time_taken, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&test.test_id)
            .bind(&summary.user_id)
            .bind(&answer.question_id)
            .bind(&answer.subject)
            .bind(&answer.topic)
            .bind(&answer.user_answer)
            .bind(&answer.correct_answer)
            .bind(answer.correct)
            .bind(answer.time_taken)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO score_summaries (test_id, user_id, total_questions, correct_count, score_percent, summary, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(test_id) DO UPDATE SET
                user_id = excluded.user_id,
                total_questions = excluded.total_questions,
                correct_count = excluded.correct_count,
                score_percent = excluded.score_percent,
                summary = excluded.summary,
                submitted_at = excluded.submitted_at
            "#,
        )
        .bind(&test.test_id)
        .bind(&summary.user_id)
        .bind(summary.total_questions as i64)
        .bind(summary.correct_count as i64)
        .bind(i64::from(summary.score_percent))
        .bind(encode(summary)?)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit submission for {}: {:?}", test.test_id, e);
            AppError::from(e)
        })?;

        Ok(())
    }

    async fn load_score_summary(&self, test_id: &str) -> Result<Option<ScoreSummary>, AppError> {
        let raw: Option<String> = sqlx::query_scalar("SELECT summary FROM score_summaries WHERE test_id = ?")
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?;

        raw.as_deref().map(decode_summary).transpose()
    }

    async fn load_previous_score_summary(
        &self,
        user_id: &str,
        exclude_test_id: &str,
    ) -> Result<Option<ScoreSummary>, AppError> {
        let raw: Option<String> = sqlx::query_scalar(
            r#"
            SELECT summary FROM score_summaries
            WHERE user_id = ? AND test_id <> ?
            ORDER BY submitted_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(exclude_test_id)
        .fetch_optional(&self.pool)
        .await?;

        raw.as_deref().map(decode_summary).transpose()
    }

    async fn load_score_history(&self, user_id: &str, limit: i64) -> Result<Vec<HistoryEntry>, AppError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT summary, submitted_at FROM score_summaries
            WHERE user_id = ?
            ORDER BY submitted_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = rows
            .into_iter()
            .map(|row| {
                Ok(HistoryEntry {
                    submitted_at: row.submitted_at,
                    summary: decode_summary(&row.summary)?,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;
        entries.reverse();
        Ok(entries)
    }

    async fn load_cumulative_performance(&self, user_id: &str) -> Result<BTreeMap<String, f64>, AppError> {
        let stats = sqlx::query_as::<_, SubjectStat>(
            r#"
            SELECT subject, COUNT(*) AS attempted, SUM(correct) AS correct
            FROM responses
            WHERE user_id = ?
            GROUP BY subject
            ORDER BY subject
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(stats.into_iter().map(|s| (s.subject.clone(), s.accuracy())).collect())
    }
}
