// src/handlers/exams.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::exam::{CreateExamRequest, PublicExam, UpdateExamRequest},
    store::exams::ExamStore,
    utils::jwt::Claims,
};

/// Lists the caller's own exams, drafts included.
pub async fn list_exams(
    State(exams): State<ExamStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let owned = exams.list(claims.user_id()).await?;
    Ok(Json(owned))
}

/// Creates a new exam owned by the caller.
/// Returns 201 Created and the stored definition.
pub async fn create_exam(
    State(exams): State<ExamStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = exams.create(payload, claims.user_id()).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

/// Public, anonymous view of an exam. Correct answers are never included.
pub async fn get_exam(
    State(exams): State<ExamStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exam = exams
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(PublicExam::from(&exam)))
}

/// Full definition, including answer keys. Owner only.
pub async fn get_exam_definition(
    State(exams): State<ExamStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exam = exams.owned(id, claims.user_id()).await?;
    Ok(Json(exam))
}

/// Partially updates an exam. Omitted fields are kept. Owner only.
pub async fn update_exam(
    State(exams): State<ExamStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = exams.update(id, payload, claims.user_id()).await?;
    Ok(Json(exam))
}

/// Deletes an exam. Results already recorded for it stay available.
pub async fn delete_exam(
    State(exams): State<ExamStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    exams.delete(id, claims.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
