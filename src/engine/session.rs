// src/engine/session.rs

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    engine::{clock::Clock, scoring},
    error::AppError,
    models::{
        exam::Exam,
        exam_result::NewResult,
        question::{Answer, Question},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
}

/// One respondent taking one exam.
///
/// The session works on a snapshot of the exam taken at start, so edits made
/// by the author mid-attempt do not leak in. Once submitted it is frozen:
/// every mutating call fails with [`AppError::InvalidState`].
pub struct AttemptSession {
    id: Uuid,
    exam: Exam,
    respondent_id: String,
    answers: BTreeMap<String, Answer>,
    current_index: usize,
    remaining_seconds: Option<u64>,
    status: AttemptStatus,
    started_at: DateTime<Utc>,
    last_synced: DateTime<Utc>,
    outcome: Option<NewResult>,
    clock: Arc<dyn Clock>,
}

impl AttemptSession {
    pub fn start(
        exam: &Exam,
        respondent_id: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        if exam.questions.is_empty() {
            return Err(AppError::Validation(
                "An exam without questions cannot be taken".to_string(),
            ));
        }

        let now = clock.now();
        Ok(Self {
            id: Uuid::new_v4(),
            exam: exam.clone(),
            respondent_id: respondent_id.into(),
            answers: BTreeMap::new(),
            current_index: 0,
            remaining_seconds: exam.time_limit.map(|minutes| u64::from(minutes) * 60),
            status: AttemptStatus::InProgress,
            started_at: now,
            last_synced: now,
            outcome: None,
            clock,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn respondent_id(&self) -> &str {
        &self.respondent_id
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.exam.questions[self.current_index]
    }

    pub fn remaining_seconds(&self) -> Option<u64> {
        self.remaining_seconds
    }

    pub fn answers(&self) -> &BTreeMap<String, Answer> {
        &self.answers
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The scored result, once submitted.
    pub fn outcome(&self) -> Option<&NewResult> {
        self.outcome.as_ref()
    }

    /// Advisory only: submission is allowed with gaps.
    pub fn is_complete(&self) -> bool {
        self.exam
            .questions
            .iter()
            .all(|q| self.answers.contains_key(&q.id))
    }

    /// Records (or replaces) the answer to `question_id`.
    pub fn answer(&mut self, question_id: &str, raw: &Value) -> Result<(), AppError> {
        self.ensure_in_progress()?;

        let question = self
            .exam
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| {
                AppError::Validation(format!("Question '{}' is not part of this exam", question_id))
            })?;

        let answer = Answer::normalize(&question.kind, raw);
        self.answers.insert(question.id.clone(), answer);
        Ok(())
    }

    /// Moves to question `index`. Out-of-range requests leave the position alone.
    pub fn seek(&mut self, index: usize) -> Result<(), AppError> {
        self.ensure_in_progress()?;

        if index >= self.exam.questions.len() {
            return Err(AppError::InvalidState(format!(
                "Question index {} is out of range 0..{}",
                index,
                self.exam.questions.len()
            )));
        }

        self.current_index = index;
        Ok(())
    }

    /// Counts `elapsed_seconds` off the timer.
    ///
    /// Returns the result of the forced submission when the timer runs out;
    /// that happens at most once per session. Untimed or already submitted
    /// sessions ignore ticks.
    pub fn tick(&mut self, elapsed_seconds: u64) -> Option<NewResult> {
        if self.status != AttemptStatus::InProgress {
            return None;
        }
        let remaining = self.remaining_seconds.as_mut()?;

        *remaining = remaining.saturating_sub(elapsed_seconds);
        if *remaining > 0 {
            return None;
        }

        tracing::info!("Attempt {} ran out of time, submitting", self.id);
        Some(self.finish())
    }

    /// Feeds the whole seconds elapsed on the clock since the last sync into
    /// [`tick`](Self::tick). Sub-second remainders carry over to the next sync.
    pub fn sync(&mut self) -> Option<NewResult> {
        let now = self.clock.now();
        let elapsed = (now - self.last_synced).num_seconds();
        if elapsed <= 0 {
            return None;
        }

        self.last_synced += Duration::seconds(elapsed);
        self.tick(elapsed as u64)
    }

    /// Ends the attempt and scores it.
    pub fn submit(&mut self) -> Result<NewResult, AppError> {
        self.ensure_in_progress()?;
        Ok(self.finish())
    }

    fn finish(&mut self) -> NewResult {
        let score = scoring::score(&self.exam.questions, &self.answers);
        let outcome = NewResult {
            exam_id: self.exam.id,
            exam_title: self.exam.title.clone(),
            respondent_id: self.respondent_id.clone(),
            score: score.score,
            total_points: score.total_points,
            completed_at: self.clock.now(),
            answers: self.answers.clone(),
        };

        self.status = AttemptStatus::Submitted;
        self.outcome = Some(outcome.clone());
        outcome
    }

    fn ensure_in_progress(&self) -> Result<(), AppError> {
        match self.status {
            AttemptStatus::InProgress => Ok(()),
            AttemptStatus::Submitted => Err(AppError::InvalidState(
                "This attempt has already been submitted".to_string(),
            )),
        }
    }
}
