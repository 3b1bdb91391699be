// src/store/exams.rs

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::clock::Clock,
    error::AppError,
    models::exam::{CreateExamRequest, Exam, UpdateExamRequest},
    store::storage::{Records, Storage},
};

const NAMESPACE: &str = "exams";

/// Owns every exam definition and enforces ownership on mutation.
#[derive(Clone)]
pub struct ExamStore {
    records: Records<Exam>,
    clock: Arc<dyn Clock>,
    // Serializes read-merge-write cycles so concurrent patches cannot interleave.
    write_lock: Arc<Mutex<()>>,
}

impl ExamStore {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Records::new(storage, NAMESPACE),
            clock,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Creates an exam owned by `owner_id`. New exams are drafts unless the
    /// request explicitly publishes them.
    pub async fn create(&self, req: CreateExamRequest, owner_id: &str) -> Result<Exam, AppError> {
        req.validate()?;

        let mut exam = req.into_exam(Uuid::new_v4(), owner_id, self.clock.now());
        exam.sanitize();
        exam.assign_question_ids();
        exam.check()?;

        let _guard = self.write_lock.lock().await;
        self.records.put(&exam.id.to_string(), &exam).await?;

        tracing::info!("Exam {} created by {}", exam.id, owner_id);
        Ok(exam)
    }

    /// Merges `patch` into the stored exam. Only the owner may update.
    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateExamRequest,
        caller_id: &str,
    ) -> Result<Exam, AppError> {
        patch.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut exam = self.owned(id, caller_id).await?;

        exam.apply(patch);
        exam.sanitize();
        exam.assign_question_ids();
        exam.check()?;

        self.records.put(&id.to_string(), &exam).await?;

        tracing::info!("Exam {} updated", id);
        Ok(exam)
    }

    /// Removes the exam. Results already recorded for it are kept.
    pub async fn delete(&self, id: Uuid, caller_id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.owned(id, caller_id).await?;

        self.records.delete(&id.to_string()).await?;

        tracing::info!("Exam {} deleted", id);
        Ok(())
    }

    /// Looks up an exam without any ownership check.
    pub async fn get(&self, id: Uuid) -> Result<Option<Exam>, AppError> {
        self.records.get(&id.to_string()).await
    }

    /// Looks up an exam that `caller_id` must own.
    pub async fn owned(&self, id: Uuid, caller_id: &str) -> Result<Exam, AppError> {
        let exam = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

        if exam.owner_id != caller_id {
            tracing::warn!("User {} tried to modify exam {} they do not own", caller_id, id);
            return Err(AppError::Forbidden("Not permitted".to_string()));
        }

        Ok(exam)
    }

    /// Exams belonging to `owner_id`, in creation order.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Exam>, AppError> {
        Ok(self
            .records
            .list()
            .await?
            .into_iter()
            .filter(|exam| exam.owner_id == owner_id)
            .collect())
    }
}
