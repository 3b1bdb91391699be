// src/store/results.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::AppError,
    models::exam_result::{ExamResult, NewResult},
    store::storage::{Records, Storage},
};

const NAMESPACE: &str = "results";

/// Append-only collection of scored attempts.
#[derive(Clone)]
pub struct ResultStore {
    records: Records<ExamResult>,
}

impl ResultStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            records: Records::new(storage, NAMESPACE),
        }
    }

    pub async fn append(&self, result: NewResult) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.append_with_id(id, result).await?;
        Ok(id)
    }

    /// Stores `result` under a caller-chosen id. Writing the same id again
    /// overwrites in place, so retries never duplicate a result.
    pub async fn append_with_id(&self, id: Uuid, result: NewResult) -> Result<ExamResult, AppError> {
        let result = result.into_result(id);
        self.records.put(&id.to_string(), &result).await?;

        tracing::info!(
            "Result {} recorded for exam {}: {}/{}",
            id,
            result.exam_id,
            result.score,
            result.total_points
        );
        Ok(result)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ExamResult>, AppError> {
        self.records.get(&id.to_string()).await
    }

    /// Every result, in completion order.
    pub async fn list_all(&self) -> Result<Vec<ExamResult>, AppError> {
        self.records.list().await
    }

    pub async fn list_for_exam(&self, exam_id: Uuid) -> Result<Vec<ExamResult>, AppError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|r| r.exam_id == exam_id)
            .collect())
    }

    pub async fn list_for_respondent(&self, respondent_id: &str) -> Result<Vec<ExamResult>, AppError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|r| r.respondent_id == respondent_id)
            .collect())
    }
}
