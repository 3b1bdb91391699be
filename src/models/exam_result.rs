// src/models/exam_result.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{EXCELLENT_SCORE_PERCENTAGE, PASSING_SCORE_PERCENTAGE},
    models::question::Answer,
};

/// A completed, scored attempt. Immutable once appended.
///
/// The exam title and total points are copied at completion time so the
/// record survives later edits or deletion of the exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub exam_title: String,
    pub respondent_id: String,
    pub score: u32,
    pub total_points: u32,
    pub completed_at: DateTime<Utc>,
    pub answers: BTreeMap<String, Answer>,
}

impl ExamResult {
    pub fn percentage(&self) -> f64 {
        if self.total_points == 0 {
            return 0.0;
        }
        f64::from(self.score) * 100.0 / f64::from(self.total_points)
    }
}

/// A scored attempt that has not been given an id by the result store yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResult {
    pub exam_id: Uuid,
    pub exam_title: String,
    pub respondent_id: String,
    pub score: u32,
    pub total_points: u32,
    pub completed_at: DateTime<Utc>,
    pub answers: BTreeMap<String, Answer>,
}

impl NewResult {
    pub fn into_result(self, id: Uuid) -> ExamResult {
        ExamResult {
            id,
            exam_id: self.exam_id,
            exam_title: self.exam_title,
            respondent_id: self.respondent_id,
            score: self.score,
            total_points: self.total_points,
            completed_at: self.completed_at,
            answers: self.answers,
        }
    }
}

/// Number of results per score band.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDistribution {
    /// 80 % and above.
    pub excellent: usize,
    /// 60 % to 79 %.
    pub passing: usize,
    /// Below 60 %.
    pub failing: usize,
}

/// Aggregate view over a sequence of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub attempts: usize,
    pub average_percentage: f64,
    pub highest_percentage: f64,
    pub lowest_percentage: f64,
    pub distribution: ScoreDistribution,
    /// Share of results at or above the passing threshold, as a percentage.
    pub pass_rate: f64,
}

impl ResultSummary {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a ExamResult>,
    {
        let percentages: Vec<f64> = results.into_iter().map(ExamResult::percentage).collect();
        if percentages.is_empty() {
            return ResultSummary::default();
        }

        let attempts = percentages.len();
        let mut distribution = ScoreDistribution::default();
        for pct in &percentages {
            if *pct >= EXCELLENT_SCORE_PERCENTAGE {
                distribution.excellent += 1;
            } else if *pct >= PASSING_SCORE_PERCENTAGE {
                distribution.passing += 1;
            } else {
                distribution.failing += 1;
            }
        }
        let passed = distribution.excellent + distribution.passing;

        ResultSummary {
            attempts,
            average_percentage: percentages.iter().sum::<f64>() / attempts as f64,
            highest_percentage: percentages.iter().copied().fold(f64::MIN, f64::max),
            lowest_percentage: percentages.iter().copied().fold(f64::MAX, f64::min),
            distribution,
            pass_rate: passed as f64 * 100.0 / attempts as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u32, total_points: u32) -> ExamResult {
        ExamResult {
            id: Uuid::new_v4(),
            exam_id: Uuid::nil(),
            exam_title: "Quiz".into(),
            respondent_id: "r".into(),
            score,
            total_points,
            completed_at: Utc::now(),
            answers: BTreeMap::new(),
        }
    }

    #[test]
    fn summary_of_nothing_is_zeroed() {
        let none: Vec<ExamResult> = Vec::new();
        assert_eq!(ResultSummary::from_results(&none), ResultSummary::default());
    }

    #[test]
    fn summary_buckets_and_pass_rate() {
        let results = [result(9, 10), result(6, 10), result(3, 10), result(10, 10)];

        let summary = ResultSummary::from_results(&results);

        assert_eq!(summary.attempts, 4);
        assert_eq!(summary.average_percentage, 70.0);
        assert_eq!(summary.highest_percentage, 100.0);
        assert_eq!(summary.lowest_percentage, 30.0);
        assert_eq!(
            summary.distribution,
            ScoreDistribution {
                excellent: 2,
                passing: 1,
                failing: 1
            }
        );
        assert_eq!(summary.pass_rate, 75.0);
    }
}
