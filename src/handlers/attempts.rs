// src/handlers/attempts.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::attempt::{AnswerRequest, SeekRequest, StartAttemptRequest},
    state::AppState,
    utils::jwt::Claims,
};

/// Starts an attempt of an exam for the caller.
///
/// The exam is snapshotted at this point; later edits by the author do not
/// affect the running attempt.
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = state
        .exams
        .get(req.exam_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

    let view = state.attempts.start(&exam, claims.user_id()).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Current question, progress and countdown of an attempt.
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.attempts.view(id, claims.user_id()).await?;
    Ok(Json(view))
}

/// Records or replaces the answer to one question.
pub async fn answer_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .attempts
        .answer(id, claims.user_id(), &req.question_id, &req.value)
        .await?;
    Ok(Json(view))
}

/// Moves the attempt to another question.
pub async fn seek_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<SeekRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.attempts.seek(id, claims.user_id(), req.index).await?;
    Ok(Json(view))
}

/// Submits the attempt, scores it and records the result.
/// Unanswered questions score zero.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.attempts.submit(id, claims.user_id()).await?;
    Ok(Json(result))
}
