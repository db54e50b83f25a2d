//! JSON views honoring the wire contract of the evaluation core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Answer, AnswerId, Application, ApplicationId, ApplicationStatus, EvaluationStatus,
    OverallResult, PositionId, Question, QuestionId, QuestionKind,
};
use super::evaluation::{FinalizeOutcome, ScoringProgress};

/// Sanitized application snapshot embedded in evaluation responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub position_id: PositionId,
    pub name: String,
    pub email: String,
    pub status: ApplicationStatus,
    pub overall_result: OverallResult,
    pub evaluation_status: EvaluationStatus,
    pub total_score: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Application> for ApplicationView {
    fn from(application: &Application) -> Self {
        Self {
            id: application.id.clone(),
            position_id: application.position_id.clone(),
            name: application.candidate_name.clone(),
            email: application.candidate_email.clone(),
            status: application.status,
            overall_result: application.overall_result,
            evaluation_status: application.evaluation_status,
            total_score: application.total_score,
            started_at: application.started_at,
            completed_at: application.completed_at,
        }
    }
}

/// Question fields echoed back with a scored answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRef {
    pub id: QuestionId,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub weight: f64,
}

impl From<&Question> for QuestionRef {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            text: question.text.clone(),
            kind: question.kind,
            weight: question.weight,
        }
    }
}

/// Response to `score-answer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAnswerView {
    pub id: AnswerId,
    pub score: f64,
    pub question: QuestionRef,
    pub application: ScoredApplicationRef,
}

/// Application fields echoed back with a scored answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredApplicationRef {
    pub id: ApplicationId,
    pub name: String,
    pub email: String,
    pub evaluation_status: EvaluationStatus,
}

/// One answer row in evaluation and finalize responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetailView {
    pub id: AnswerId,
    pub response: String,
    pub score: Option<f64>,
    pub weighted_score: f64,
    pub question: QuestionRef,
}

pub(crate) fn answer_detail(answer: &Answer, question: &Question) -> AnswerDetailView {
    AnswerDetailView {
        id: answer.id.clone(),
        response: answer.response.clone(),
        score: answer.score,
        weighted_score: answer
            .score
            .map(|score| score * question.weight)
            .unwrap_or(0.0),
        question: QuestionRef::from(question),
    }
}

/// Evaluation block of the `application-evaluation` response.
/// `score_percentage` is null until at least one answer has been scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationView {
    pub total_score: f64,
    pub max_possible_score: f64,
    pub score_percentage: Option<f64>,
    pub threshold: f64,
    pub is_passed: bool,
    pub is_failed: bool,
    pub is_complete: bool,
    pub progress: ScoringProgress,
}

/// Response to `application-evaluation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEvaluationView {
    pub application: ApplicationView,
    pub evaluation: EvaluationView,
    pub answers: Vec<AnswerDetailView>,
}

/// Response to `finalize-application`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeView {
    pub application: ApplicationView,
    pub scoring: FinalizeOutcome,
    pub answers: Vec<AnswerDetailView>,
}
