// src/models/question.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upper bound on the weight of a single question.
pub const MAX_QUESTION_POINTS: u32 = 10_000;

/// The literal `"true"` / `"false"` token a true/false question is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    True,
    False,
}

impl Verdict {
    pub fn as_token(self) -> &'static str {
        match self {
            Verdict::True => "true",
            Verdict::False => "false",
        }
    }
}

/// Type-specific part of a question. Serialized inline with the question
/// under the `type` tag, so a stored question reads like
/// `{"id": "q1", "type": "multiple-choice", "options": [...], "correctAnswer": 2, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    #[serde(rename_all = "camelCase")]
    MultipleChoice {
        options: Vec<String>,
        /// Zero-based index into `options`.
        correct_answer: usize,
    },
    #[serde(rename_all = "camelCase")]
    TrueFalse { correct_answer: Verdict },
    /// Never auto-graded.
    OpenEnded,
}

impl QuestionKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple-choice",
            QuestionKind::TrueFalse { .. } => "true-false",
            QuestionKind::OpenEnded => "open-ended",
        }
    }
}

/// One prompt of an exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique within its exam. Left empty by clients, the store fills it in.
    #[serde(default)]
    pub id: String,

    #[serde(flatten)]
    pub kind: QuestionKind,

    #[serde(alias = "question")]
    pub prompt: String,

    /// Weight of the question. Always positive.
    pub points: u32,
}

impl Question {
    /// Checks the per-question invariants. Returns a human readable reason on failure.
    pub fn check(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err(format!("question '{}' has an empty prompt", self.id));
        }
        if self.prompt.chars().count() > 2000 {
            return Err(format!("question '{}' prompt is longer than 2000 characters", self.id));
        }
        if self.points == 0 {
            return Err(format!("question '{}' must be worth at least one point", self.id));
        }
        if self.points > MAX_QUESTION_POINTS {
            return Err(format!(
                "question '{}' is worth more than {} points",
                self.id, MAX_QUESTION_POINTS
            ));
        }

        if let QuestionKind::MultipleChoice {
            options,
            correct_answer,
        } = &self.kind
        {
            if options.len() < 2 {
                return Err(format!("question '{}' needs at least two options", self.id));
            }
            if options.iter().any(|opt| opt.trim().is_empty() || opt.chars().count() > 500) {
                return Err(format!(
                    "question '{}' options must be between 1 and 500 characters",
                    self.id
                ));
            }
            if *correct_answer >= options.len() {
                return Err(format!(
                    "question '{}' correct answer {} is not one of its {} options",
                    self.id,
                    correct_answer,
                    options.len()
                ));
            }
        }

        Ok(())
    }
}

/// A respondent's answer, normalized against the question it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Option index of a multiple-choice question.
    Choice(usize),
    /// True/false token, free text, or anything that could not be read as a choice.
    Text(String),
}

impl Answer {
    /// Normalizes a raw client value at collection time.
    ///
    /// True/false answers accept JSON booleans as well as the string tokens, so
    /// `true` and `"true"` grade the same. Multiple-choice answers accept an
    /// integer or a numeric string. Anything else is kept as text, which never
    /// matches a correct answer.
    pub fn normalize(kind: &QuestionKind, raw: &Value) -> Answer {
        match kind {
            QuestionKind::TrueFalse { .. } => match raw {
                Value::Bool(flag) => Answer::Text(flag.to_string()),
                Value::String(token) => {
                    let token = token.trim().to_ascii_lowercase();
                    Answer::Text(token)
                }
                other => Answer::Text(other.to_string()),
            },
            QuestionKind::MultipleChoice { .. } => match raw {
                Value::Number(n) => match n.as_u64() {
                    Some(index) => Answer::Choice(index as usize),
                    None => Answer::Text(n.to_string()),
                },
                Value::String(s) => match s.trim().parse::<usize>() {
                    Ok(index) => Answer::Choice(index),
                    Err(_) => Answer::Text(s.clone()),
                },
                other => Answer::Text(other.to_string()),
            },
            QuestionKind::OpenEnded => match raw {
                Value::String(s) => Answer::Text(s.clone()),
                other => Answer::Text(other.to_string()),
            },
        }
    }
}

/// DTO for sending a question to a respondent (excludes the correct answer).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: &'static str,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub points: u32,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        let options = match &q.kind {
            QuestionKind::MultipleChoice { options, .. } => Some(options.clone()),
            _ => None,
        };
        PublicQuestion {
            id: q.id.clone(),
            question_type: q.kind.type_name(),
            prompt: q.prompt.clone(),
            options,
            points: q.points,
        }
    }
}
