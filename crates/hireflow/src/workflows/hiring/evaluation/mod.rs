mod finalize;
mod scoring;

pub use finalize::{decide, FinalizeOutcome, PASS_THRESHOLD};
pub use scoring::{
    round2, summarize, weighted_score, AnswerSheetEntry, EvaluationSummary, ScoringProgress,
    MAX_RAW_SCORE,
};
