// src/models/exam.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{PublicQuestion, Question, QuestionKind},
    utils::html::clean_html,
};

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 5000;

/// An exam definition, as stored under the `exams` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: Uuid,

    /// Opaque id of the authoring user. Only this user may mutate the exam.
    pub owner_id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Presentation order.
    #[serde(default)]
    pub questions: Vec<Question>,

    /// Time limit in minutes. `None` means untimed.
    #[serde(default)]
    pub time_limit: Option<u32>,

    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_published: bool,

    pub created_at: DateTime<Utc>,
}

impl Exam {
    /// Sum of all question weights, saturating at `u32::MAX`.
    pub fn total_points(&self) -> u32 {
        self.questions
            .iter()
            .fold(0u32, |total, q| total.saturating_add(q.points))
    }

    /// Whether the scheduling window admits a new attempt at `now`.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.starts_at.is_none_or(|starts| now >= starts);
        let not_ended = self.ends_at.is_none_or(|ends| now < ends);
        started && not_ended
    }

    /// Checks every invariant of a saved exam. Nothing is mutated on failure.
    ///
    /// Length limits apply to the text as stored, after sanitizing.
    pub fn check(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Exam title is required".to_string()));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "Exam title is longer than {} characters",
                MAX_TITLE_CHARS
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AppError::Validation(format!(
                "Exam description is longer than {} characters",
                MAX_DESCRIPTION_CHARS
            )));
        }
        if self.time_limit == Some(0) {
            return Err(AppError::Validation(
                "Time limit must be at least one minute".to_string(),
            ));
        }
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at) {
            if starts >= ends {
                return Err(AppError::Validation(
                    "Exam must start before it ends".to_string(),
                ));
            }
        }
        if self.is_published && self.questions.is_empty() {
            return Err(AppError::Validation(
                "An exam without questions cannot be published".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(AppError::Validation(format!(
                    "Duplicate question id '{}'",
                    question.id
                )));
            }
            question.check().map_err(AppError::Validation)?;
        }

        Ok(())
    }

    /// Gives every question without an id a fresh one.
    pub fn assign_question_ids(&mut self) {
        for question in &mut self.questions {
            if question.id.trim().is_empty() {
                question.id = Uuid::new_v4().to_string();
            }
        }
    }

    /// Runs every free-text field through the HTML sanitizer.
    pub fn sanitize(&mut self) {
        self.title = clean_html(&self.title);
        self.description = clean_html(&self.description);
        for question in &mut self.questions {
            question.prompt = clean_html(&question.prompt);
            if let QuestionKind::MultipleChoice { options, .. } = &mut question.kind {
                for option in options.iter_mut() {
                    *option = clean_html(option);
                }
            }
        }
    }

    /// Merges a partial update. Fields missing from the patch keep their value.
    pub fn apply(&mut self, patch: UpdateExamRequest) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(questions) = patch.questions {
            self.questions = questions;
        }
        if let Some(time_limit) = patch.time_limit {
            self.time_limit = time_limit;
        }
        if let Some(starts_at) = patch.starts_at {
            self.starts_at = starts_at;
        }
        if let Some(ends_at) = patch.ends_at {
            self.ends_at = ends_at;
        }
        if let Some(is_published) = patch.is_published {
            self.is_published = is_published;
        }
    }
}

/// DTO for creating a new exam.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200, message = "Title length must be between 1 and 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[validate(range(min = 1))]
    pub time_limit: Option<u32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_published: bool,
}

impl CreateExamRequest {
    pub fn into_exam(self, id: Uuid, owner_id: &str, created_at: DateTime<Utc>) -> Exam {
        Exam {
            id,
            owner_id: owner_id.to_string(),
            title: self.title,
            description: self.description,
            questions: self.questions,
            time_limit: self.time_limit,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_published: self.is_published,
            created_at,
        }
    }
}

/// DTO for a partial exam update.
///
/// Nullable fields use a double option: an absent key leaves the field
/// alone, an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExamRequest {
    #[validate(length(min = 1, max = 200, message = "Title length must be between 1 and 200 characters."))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub questions: Option<Vec<Question>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub time_limit: Option<Option<u32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub starts_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub ends_at: Option<Option<DateTime<Utc>>>,
    pub is_published: Option<bool>,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Respondent-facing view of an exam (no correct answers).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicExam {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub time_limit: Option<u32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_published: bool,
    pub question_count: usize,
    pub total_points: u32,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Exam> for PublicExam {
    fn from(exam: &Exam) -> Self {
        PublicExam {
            id: exam.id,
            title: exam.title.clone(),
            description: exam.description.clone(),
            time_limit: exam.time_limit,
            starts_at: exam.starts_at,
            ends_at: exam.ends_at,
            is_published: exam.is_published,
            question_count: exam.questions.len(),
            total_points: exam.total_points(),
            questions: exam.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}
