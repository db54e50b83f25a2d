use serde::{Deserialize, Serialize};

use super::super::domain::{Answer, Question};

/// Fixed per-question maximum raw score a manager can assign.
pub const MAX_RAW_SCORE: f64 = 100.0;

/// Weighted contribution of one scored answer. Pure arithmetic; the caller
/// guarantees `score` is finite and non-negative and `weight` positive.
pub fn weighted_score(score: f64, weight: f64) -> f64 {
    score * weight
}

/// Round half-up to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One answer joined to its question so the aggregator sees the weight.
#[derive(Debug, Clone)]
pub struct AnswerSheetEntry {
    pub answer: Answer,
    pub question: Question,
}

impl AnswerSheetEntry {
    /// Unscored answers contribute 0 to totals.
    pub fn weighted_score(&self) -> f64 {
        self.answer
            .score
            .map(|score| weighted_score(score, self.question.weight))
            .unwrap_or(0.0)
    }
}

/// How far the manager has progressed through scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringProgress {
    pub total_answers: usize,
    pub scored_answers: usize,
    pub unscored_answers: usize,
    pub completion_percentage: u32,
}

/// Read-side aggregate over one application's answer sheet. Idempotent:
/// recomputing over unchanged inputs yields identical values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub total_score: f64,
    pub max_possible_score: f64,
    pub score_percentage: f64,
    pub progress: ScoringProgress,
}

impl EvaluationSummary {
    /// Every answer has a score; the finalize precondition.
    pub const fn is_complete(&self) -> bool {
        self.progress.unscored_answers == 0
    }
}

/// Aggregate an application's answers into totals, percentage, and scoring
/// progress. Does not mutate anything; safe to call repeatedly.
pub fn summarize(sheet: &[AnswerSheetEntry]) -> EvaluationSummary {
    let total_answers = sheet.len();
    let scored_answers = sheet
        .iter()
        .filter(|entry| entry.answer.is_scored())
        .count();

    let max_possible_score: f64 = sheet
        .iter()
        .map(|entry| MAX_RAW_SCORE * entry.question.weight)
        .sum();
    let total_score: f64 = sheet.iter().map(AnswerSheetEntry::weighted_score).sum();

    let score_percentage = if max_possible_score > 0.0 {
        round2(total_score / max_possible_score * 100.0)
    } else {
        0.0
    };

    let completion_percentage = if total_answers > 0 {
        (scored_answers as f64 / total_answers as f64 * 100.0).round() as u32
    } else {
        0
    };

    EvaluationSummary {
        total_score,
        max_possible_score,
        score_percentage,
        progress: ScoringProgress {
            total_answers,
            scored_answers,
            unscored_answers: total_answers - scored_answers,
            completion_percentage,
        },
    }
}
