use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub String);

/// Identifier wrapper for interview questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionId(pub String);

/// Identifier wrapper for candidate applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for submitted answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnswerId(pub String);

/// Store-assigned subject id of a manager account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagerId(pub String);

/// A job opening owned by exactly one manager. Positions contain the
/// interview questions and are the scoping root for every manager-facing
/// query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: PositionId,
    pub owner: ManagerId,
    pub title: String,
    pub description: Option<String>,
    pub intro: Option<String>,
    pub farewell: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields a manager supplies when opening a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub farewell: Option<String>,
}

/// Interview prompt kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    Text,
    MultipleChoice,
}

/// An interview prompt belonging to one position.
///
/// Invariant: `options` is `Some` iff `kind` is `MultipleChoice`, with at
/// least two non-empty entries. `weight` is positive and fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub position_id: PositionId,
    pub text: String,
    pub order: u32,
    pub kind: QuestionKind,
    pub options: Option<Vec<String>>,
    pub weight: f64,
}

impl Question {
    /// Membership check for multiple-choice responses. Text questions accept
    /// any response.
    pub fn accepts_response(&self, response: &str) -> bool {
        match (&self.kind, &self.options) {
            (QuestionKind::MultipleChoice, Some(options)) => {
                options.iter().any(|option| option == response)
            }
            (QuestionKind::MultipleChoice, None) => false,
            (QuestionKind::Text, _) => true,
        }
    }
}

/// Fields supplied when adding a question, either manually or from the
/// question generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub text: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Candidate progress through the interview itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    InProgress,
    Completed,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::InProgress => "in_progress",
            ApplicationStatus::Completed => "completed",
        }
    }
}

/// Final hiring outcome mirrored from the finalize decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallResult {
    Pending,
    Passed,
    Failed,
}

impl OverallResult {
    pub const fn label(self) -> &'static str {
        match self {
            OverallResult::Pending => "PENDING",
            OverallResult::Passed => "PASSED",
            OverallResult::Failed => "FAILED",
        }
    }
}

/// Scoring-workflow state of an application, advanced only by the
/// finalization state machine (and the first-score side effect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    Pending,
    InReview,
    Passed,
    Failed,
}

impl EvaluationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "PENDING",
            EvaluationStatus::InReview => "IN_REVIEW",
            EvaluationStatus::Passed => "PASSED",
            EvaluationStatus::Failed => "FAILED",
        }
    }

    /// PASSED and FAILED are terminal; finalize treats them as committed.
    pub const fn is_terminal(self) -> bool {
        matches!(self, EvaluationStatus::Passed | EvaluationStatus::Failed)
    }
}

/// One candidate's interview attempt for a position.
///
/// Invariant: at most one application per (position, email) pair; a duplicate
/// submission reuses the existing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub position_id: PositionId,
    pub candidate_name: String,
    pub candidate_email: String,
    pub status: ApplicationStatus,
    pub overall_result: OverallResult,
    pub evaluation_status: EvaluationStatus,
    pub total_score: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A candidate's response to one question within an application. At most one
/// answer per (application, question) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: AnswerId,
    pub application_id: ApplicationId,
    pub question_id: QuestionId,
    pub response: String,
    pub score: Option<f64>,
    pub submitted_at: DateTime<Utc>,
    pub scored_at: Option<DateTime<Utc>>,
}

impl Answer {
    /// Scored-with-0 is distinct from unscored: only a `Some` score counts.
    pub const fn is_scored(&self) -> bool {
        self.score.is_some()
    }
}
