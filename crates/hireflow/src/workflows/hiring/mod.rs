//! Hiring interview workflow: positions, questions, candidate applications,
//! manager-side evaluation and finalization, and funnel analytics.

pub mod analytics;
pub mod auth;
pub mod domain;
pub(crate) mod evaluation;
pub(crate) mod export;
pub mod repository;
pub mod router;
pub mod service;
pub(crate) mod views;

#[cfg(test)]
mod tests;

pub use analytics::{
    AbandonedApplication, AbandonedReport, CompletionRatioSummary, CompletionTimeSummary,
    OverallCompletionRatio, PositionApplications, PositionBreakdown, PositionCompletionRatio,
    ResultDistribution, ResultSlice, StatusSummary, TrendBucket, TrendPeriod, TrendReport,
    DEFAULT_ABANDON_HOURS, DEFAULT_TREND_DAYS,
};
pub use auth::{AccessError, Caller, Role};
pub use domain::{
    Answer, AnswerId, Application, ApplicationId, ApplicationStatus, EvaluationStatus, ManagerId,
    OverallResult, Position, PositionDraft, PositionId, Question, QuestionDraft, QuestionId,
    QuestionKind,
};
pub use evaluation::{
    decide, round2, summarize, weighted_score, AnswerSheetEntry, EvaluationSummary,
    FinalizeOutcome, ScoringProgress, MAX_RAW_SCORE, PASS_THRESHOLD,
};
pub use repository::{
    GeneratorError, HiringNotification, HiringRepository, NotificationError,
    NotificationPublisher, QuestionGenerator, RepositoryError,
};
pub use router::{hiring_router, AuthRejection};
pub use service::{HiringService, HiringServiceError, ValidationError};
pub use views::{
    AnswerDetailView, ApplicationEvaluationView, ApplicationView, EvaluationView, FinalizeView,
    QuestionRef, ScoreAnswerView, ScoredApplicationRef,
};
