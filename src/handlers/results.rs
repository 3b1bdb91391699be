// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError, models::exam_result::ResultSummary, state::AppState, utils::jwt::Claims,
};

/// Results recorded for one exam. Owner only.
pub async fn list_exam_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.exams.owned(id, claims.user_id()).await?;

    let results = state.results.list_for_exam(id).await?;
    Ok(Json(results))
}

/// Average, extremes, score bands and pass rate for one exam. Owner only.
pub async fn exam_results_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.exams.owned(id, claims.user_id()).await?;

    let results = state.results.list_for_exam(id).await?;
    Ok(Json(ResultSummary::from_results(&results)))
}

/// The caller's own results across all exams, deleted ones included.
pub async fn list_my_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results = state.results.list_for_respondent(claims.user_id()).await?;
    Ok(Json(results))
}
