// src/engine/scoring.rs

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::question::{Answer, Question, QuestionKind};

/// Outcome of grading one answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub score: u32,
    pub total_points: u32,
}

/// Points awarded for a single question. Open-ended questions always earn 0
/// here since they need a human grader.
pub fn grade_question(question: &Question, answer: Option<&Answer>) -> u32 {
    let correct = match (&question.kind, answer) {
        (QuestionKind::MultipleChoice { correct_answer, .. }, Some(Answer::Choice(index))) => {
            index == correct_answer
        }
        (QuestionKind::TrueFalse { correct_answer }, Some(Answer::Text(token))) => {
            token == correct_answer.as_token()
        }
        _ => false,
    };

    if correct { question.points } else { 0 }
}

/// Scores an answer set against the questions it was collected for.
///
/// All-or-nothing per question, no negative marking. `total_points` counts
/// every question whether answered or not. Both sums saturate, which keeps
/// `score <= total_points`.
pub fn score(questions: &[Question], answers: &BTreeMap<String, Answer>) -> Score {
    questions.iter().fold(
        Score {
            score: 0,
            total_points: 0,
        },
        |acc, question| Score {
            score: acc
                .score
                .saturating_add(grade_question(question, answers.get(&question.id))),
            total_points: acc.total_points.saturating_add(question.points),
        },
    )
}
