// src/handlers/performance.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    config::HISTORY_LIMIT,
    error::AppError,
    models::score::{HistoryResponse, PerformanceResponse},
    services::tier::classify_all,
    store::{QuestionBank, SqliteStore, TestStore},
};

/// Cumulative subject accuracy over every submission of a user.
pub async fn get_user_performance(
    State(store): State<SqliteStore>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let performance = store.load_cumulative_performance(&user_id).await?;
    if performance.is_empty() {
        return Err(AppError::NotFound(format!(
            "No submissions for user '{}'",
            user_id
        )));
    }

    let classification = classify_all(&performance)?;

    Ok(Json(PerformanceResponse {
        scope: "user".to_string(),
        id: user_id,
        performance,
        classification,
    }))
}

/// The user's most recent submissions, oldest first. An unknown user gets an
/// empty history rather than a 404.
pub async fn get_user_history(
    State(store): State<SqliteStore>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entries = store.load_score_history(&user_id, HISTORY_LIMIT).await?;

    Ok(Json(HistoryResponse {
        available: !entries.is_empty(),
        user_id,
        entries,
    }))
}

/// Subjects in the question bank with their question counts.
pub async fn list_subjects(State(store): State<SqliteStore>) -> Result<impl IntoResponse, AppError> {
    let subjects = store.list_subjects().await?;
    Ok(Json(subjects))
}
