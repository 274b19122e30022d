// src/handlers/admin.rs

use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    extract::AppJson,
    models::question::{ImportQuestionsRequest, Question},
    store::{QuestionBank, SqliteStore},
    utils::jwt::Claims,
};

/// Imports a batch of questions into the bank.
/// Admin only.
///
/// All-or-nothing: one invalid entry or one existing id rejects the batch.
pub async fn import_questions(
    State(store): State<SqliteStore>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<ImportQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let mut seen = HashSet::new();
    let mut questions: Vec<Question> = Vec::with_capacity(payload.questions.len());
    for (index, entry) in payload.questions.into_iter().enumerate() {
        if let Err(validation_errors) = entry.validate() {
            return Err(AppError::Validation(format!(
                "questions[{}]: {}",
                index, validation_errors
            )));
        }
        let question = entry.into_question();
        if !seen.insert(question.question_id.clone()) {
            return Err(AppError::Validation(format!(
                "questions[{}]: duplicate question_id '{}' in batch",
                index, question.question_id
            )));
        }
        questions.push(question);
    }

    let imported = store.insert_questions(&questions).await?;
    tracing::info!("'{}' imported {} questions", claims.sub, imported);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "imported": imported })),
    ))
}

/// Full question including its answer key.
/// Admin only.
pub async fn get_question(
    State(store): State<SqliteStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let question = store
        .find_question_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", id)))?;

    Ok(Json(question))
}

/// Deletes a question from the bank. Assembled tests keep their snapshot.
/// Admin only.
pub async fn delete_question(
    State(store): State<SqliteStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_question(&id).await? {
        return Err(AppError::NotFound(format!("Question '{}' not found", id)));
    }

    tracing::info!("'{}' deleted question {}", claims.sub, id);
    Ok(StatusCode::NO_CONTENT)
}
