// src/handlers/test_paper.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rand::{SeedableRng, rngs::StdRng};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    extract::{AppJson, AppQuery},
    models::{
        response::SubmitTestRequest,
        score::{PerformanceResponse, ScoreSummary, SubmitTestResponse},
        test_paper::GenerateTestParams,
    },
    services::{
        assembler::{AssemblyRequest, assemble},
        scorer::score_test,
        tier::classify_all,
        trend::compare,
    },
    store::{SqliteStore, TestStore},
};

/// Assembles a new test.
///
/// Returns the public projection; answer keys never leave the server.
pub async fn generate_test(
    State(store): State<SqliteStore>,
    State(config): State<Config>,
    AppQuery(params): AppQuery<GenerateTestParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let request = AssemblyRequest::from_params(params, &config)?;

    let mut rng = StdRng::from_entropy();
    let test = assemble(&store, &store, request, &config.mixed_weights, &mut rng).await?;

    Ok(Json(test.to_public()))
}

/// Scores a submission against the frozen question set of its test.
///
/// * Persists graded answers and the summary (resubmission replaces).
/// * Classifies per-subject accuracy into tiers.
/// * Compares with the user's previous test when there is one.
pub async fn submit_test(
    State(store): State<SqliteStore>,
    AppJson(req): AppJson<SubmitTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let test = store
        .load_test(&req.test_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Test '{}' not found", req.test_id)))?;

    if let Some(owner) = test.user_id.as_deref() {
        if owner != req.user_id {
            tracing::warn!(
                "Test {} was assembled for '{}' but submitted by '{}'",
                test.test_id,
                owner,
                req.user_id
            );
        }
    }

    let scored = score_test(&test, &req.user_id, &req.responses)?;
    store
        .save_submission(&test, &scored.graded, &scored.summary)
        .await?;

    let current = scored.summary.accuracy_as_performance();
    let classification = classify_all(&current)?;

    let previous = store
        .load_previous_score_summary(&req.user_id, &test.test_id)
        .await?;
    let comparison = previous.and_then(|prev| {
        compare(&prev.accuracy_as_performance(), &current, Some(prev.test_id))
    });

    tracing::info!(
        "User '{}' scored {}% on test {}",
        req.user_id,
        scored.summary.score_percent,
        test.test_id
    );

    Ok(Json(SubmitTestResponse {
        status: "submitted".to_string(),
        summary: scored.summary,
        classification,
        comparison,
    }))
}

async fn require_summary(store: &SqliteStore, test_id: &str) -> Result<ScoreSummary, AppError> {
    store
        .load_score_summary(test_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No submission for test '{}'", test_id)))
}

pub async fn get_test_summary(
    State(store): State<SqliteStore>,
    Path(test_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let summary = require_summary(&store, &test_id).await?;
    Ok(Json(summary))
}

/// Subject accuracy of one submitted test, with tiers.
pub async fn get_test_performance(
    State(store): State<SqliteStore>,
    Path(test_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let summary = require_summary(&store, &test_id).await?;
    let performance = summary.accuracy_as_performance();
    let classification = classify_all(&performance)?;

    Ok(Json(PerformanceResponse {
        scope: "test".to_string(),
        id: test_id,
        performance,
        classification,
    }))
}
