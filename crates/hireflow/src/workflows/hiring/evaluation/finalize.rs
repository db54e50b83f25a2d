use serde::{Deserialize, Serialize};

use super::scoring::EvaluationSummary;

/// Percentage of the maximum weighted score required to pass. Inclusive:
/// exactly 70.00% passes.
pub const PASS_THRESHOLD: f64 = 70.0;

/// Committed finalize decision returned to the caller alongside the
/// persisted application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeOutcome {
    pub total_score: f64,
    pub max_possible_score: f64,
    pub score_percentage: f64,
    pub threshold: f64,
    pub passed: bool,
}

/// Threshold decision over a complete summary. The comparison uses the
/// already-rounded percentage, so 69.996% finalizes as PASSED via 70.00.
pub fn decide(summary: &EvaluationSummary) -> FinalizeOutcome {
    FinalizeOutcome {
        total_score: summary.total_score,
        max_possible_score: summary.max_possible_score,
        score_percentage: summary.score_percentage,
        threshold: PASS_THRESHOLD,
        passed: summary.score_percentage >= PASS_THRESHOLD,
    }
}
