// src/handlers/planner.rs

use std::collections::BTreeMap;

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    extract::AppJson,
    models::plan::{PlanRequest, PlanResponse},
    services::{
        allocation::allocate_weekly_hours,
        planner::build_plan,
        tier::classify_all,
        trend::{Comparison, compare},
    },
    store::{SqliteStore, TestStore},
};

/// Where the performance map of a plan request came from.
enum Source {
    Explicit,
    Test(String),
    Cumulative,
}

async fn resolve_performance(
    store: &SqliteStore,
    req: &PlanRequest,
) -> Result<(BTreeMap<String, f64>, Source), AppError> {
    if !req.performance.is_empty() {
        return Ok((req.performance.clone(), Source::Explicit));
    }

    if let Some(test_id) = req.test_id.as_deref() {
        let summary = store
            .load_score_summary(test_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No submission for test '{}'", test_id)))?;
        return Ok((summary.accuracy_as_performance(), Source::Test(summary.test_id)));
    }

    if let Some(user_id) = req.user_id.as_deref() {
        let performance = store.load_cumulative_performance(user_id).await?;
        if !performance.is_empty() {
            return Ok((performance, Source::Cumulative));
        }
    }

    Err(AppError::Validation(
        "performance is empty and no submitted results were found".to_string(),
    ))
}

async fn previous_comparison(
    store: &SqliteStore,
    req: &PlanRequest,
    source: &Source,
    performance: &BTreeMap<String, f64>,
) -> Result<Option<Comparison>, AppError> {
    let Some(user_id) = req.user_id.as_deref() else {
        return Ok(None);
    };

    let exclude = match source {
        Source::Test(test_id) => test_id.as_str(),
        Source::Explicit => "",
        Source::Cumulative => return Ok(None),
    };

    let previous = store.load_previous_score_summary(user_id, exclude).await?;
    Ok(previous.and_then(|prev| {
        compare(&prev.accuracy_as_performance(), performance, Some(prev.test_id))
    }))
}

/// Builds a 7-day and a 30-day plan.
///
/// Performance comes from the body, else the summary of `test_id`, else the
/// cumulative results of `user_id`.
pub async fn create_plan(
    State(store): State<SqliteStore>,
    State(config): State<Config>,
    AppJson(req): AppJson<PlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let (performance, source) = resolve_performance(&store, &req).await?;

    let classification = classify_all(&performance)?;
    let plan = build_plan(&performance)?;
    let weekly_hours = allocate_weekly_hours(&performance, &config.planner);
    let comparison = previous_comparison(&store, &req, &source, &performance).await?;

    tracing::info!(
        "Built plan: {} weak, {} moderate, {} strong",
        plan.weak_subjects.len(),
        plan.moderate_subjects.len(),
        plan.strong_subjects.len()
    );

    Ok(Json(PlanResponse {
        plan,
        classification,
        weekly_hours,
        comparison,
    }))
}
