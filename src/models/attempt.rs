// src/models/attempt.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    engine::session::{AttemptSession, AttemptStatus},
    models::question::{Answer, PublicQuestion},
};

/// What the presentation layer needs to render an attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptView {
    pub attempt_id: Uuid,
    pub exam_id: Uuid,
    pub exam_title: String,
    pub status: AttemptStatus,
    pub current_index: usize,
    pub question_count: usize,
    pub answered_count: usize,
    pub total_points: u32,
    /// `None` for untimed exams.
    pub remaining_seconds: Option<u64>,
    pub current_question: PublicQuestion,
    pub answers: BTreeMap<String, Answer>,
    /// Present once the attempt is submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl From<&AttemptSession> for AttemptView {
    fn from(session: &AttemptSession) -> Self {
        let exam = session.exam();
        AttemptView {
            attempt_id: session.id(),
            exam_id: exam.id,
            exam_title: exam.title.clone(),
            status: session.status(),
            current_index: session.current_index(),
            question_count: exam.questions.len(),
            answered_count: session.answers().len(),
            total_points: exam.total_points(),
            remaining_seconds: session.remaining_seconds(),
            current_question: PublicQuestion::from(session.current_question()),
            answers: session.answers().clone(),
            score: session.outcome().map(|outcome| outcome.score),
        }
    }
}

/// DTO for starting an attempt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptRequest {
    pub exam_id: Uuid,
}

/// DTO for answering one question. `value` is normalized against the
/// question type before it is stored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: String,
    pub value: serde_json::Value,
}

/// DTO for moving to another question. Signed so that a negative index is
/// reported as out of range rather than as a malformed body.
#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub index: i64,
}
