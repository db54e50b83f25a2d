use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::analytics::TrendPeriod;
use super::auth::{Caller, Role};
use super::domain::{
    AnswerId, ApplicationId, PositionDraft, PositionId, QuestionDraft, QuestionId,
};
use super::repository::{
    HiringRepository, NotificationPublisher, QuestionGenerator, RepositoryError,
};
use super::service::{HiringService, HiringServiceError, ValidationError};

/// Router builder exposing the hiring workflow over HTTP. Caller identity is
/// read from `x-caller-*` headers placed by the session edge.
pub fn hiring_router<R, N, G>(service: Arc<HiringService<R, N, G>>) -> Router
where
    R: HiringRepository + 'static,
    N: NotificationPublisher + 'static,
    G: QuestionGenerator + 'static,
{
    Router::new()
        .route(
            "/api/v1/hiring/positions",
            post(create_position_handler::<R, N, G>).get(list_positions_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/positions/:position_id",
            get(get_position_handler::<R, N, G>).delete(delete_position_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/positions/:position_id/questions",
            post(add_question_handler::<R, N, G>).get(list_questions_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/positions/:position_id/questions/generate",
            post(generate_questions_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/questions/:question_id",
            delete(delete_question_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/positions/:position_id/applications",
            post(start_application_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/applications/:application_id/answers",
            post(submit_answer_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/applications/:application_id/complete",
            post(complete_application_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/answers/:answer_id/score",
            post(score_answer_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/applications/:application_id/evaluation",
            get(application_evaluation_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/applications/:application_id/finalize",
            post(finalize_application_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/analytics/status-summary",
            get(status_summary_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/analytics/avg-completion-time",
            get(avg_completion_time_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/analytics/by-position",
            get(by_position_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/analytics/result-distribution",
            get(result_distribution_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/analytics/completion-ratio",
            get(completion_ratio_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/analytics/trends",
            get(trends_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/analytics/abandoned",
            get(abandoned_handler::<R, N, G>),
        )
        .route(
            "/api/v1/hiring/analytics/export",
            get(export_handler::<R, N, G>),
        )
        .with_state(service)
}

/// Rejection when the edge supplied no usable identity.
#[derive(Debug)]
pub enum AuthRejection {
    MissingIdentity,
    InvalidRole(String),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthRejection::MissingIdentity => "authentication required".to_string(),
            AuthRejection::InvalidRole(role) => format!("unknown role '{role}'"),
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, AuthRejection> {
    let subject =
        header_value(headers, "x-caller-subject").ok_or(AuthRejection::MissingIdentity)?;
    let email = header_value(headers, "x-caller-email").ok_or(AuthRejection::MissingIdentity)?;
    let role_raw = header_value(headers, "x-caller-role").ok_or(AuthRejection::MissingIdentity)?;
    let role = Role::parse(&role_raw).ok_or(AuthRejection::InvalidRole(role_raw))?;

    Ok(Caller {
        subject,
        email,
        role,
    })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers)
    }
}

impl IntoResponse for HiringServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            HiringServiceError::Access(_) => StatusCode::FORBIDDEN,
            HiringServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            HiringServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            HiringServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            HiringServiceError::Repository(RepositoryError::Unavailable(_))
            | HiringServiceError::Notification(_)
            | HiringServiceError::Generator(_)
            | HiringServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            // Structured count so callers can render "X of Y still need scoring".
            HiringServiceError::Validation(ValidationError::UnscoredAnswers {
                unscored, ..
            }) => json!({ "error": self.to_string(), "unscoredAnswers": unscored }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Analytics responses share a `{success, data, timestamp}` envelope.
fn envelope<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": data,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartApplicationRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAnswerRequest {
    question_id: String,
    response: String,
}

#[derive(Debug, Deserialize)]
struct ScoreRequest {
    score: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateQuestionsRequest {
    #[serde(default = "default_generate_count")]
    count: usize,
}

fn default_generate_count() -> usize {
    5
}

#[derive(Debug, Deserialize)]
struct TrendsQuery {
    period: Option<TrendPeriod>,
    days: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AbandonedQuery {
    hours: Option<i64>,
}

async fn create_position_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Json(draft): Json<PositionDraft>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    let position = service.create_position(&caller, draft)?;
    Ok((StatusCode::CREATED, Json(position)))
}

async fn list_positions_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(Json(service.list_positions(&caller)?))
}

async fn get_position_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(position_id): Path<String>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(Json(
        service.get_position(&caller, &PositionId(position_id))?,
    ))
}

async fn delete_position_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(position_id): Path<String>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    service.delete_position(&caller, &PositionId(position_id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_question_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(position_id): Path<String>,
    Json(draft): Json<QuestionDraft>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    let question = service.add_question(&caller, &PositionId(position_id), draft)?;
    Ok((StatusCode::CREATED, Json(question)))
}

async fn list_questions_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(position_id): Path<String>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(Json(
        service.list_questions(&caller, &PositionId(position_id))?,
    ))
}

async fn generate_questions_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(position_id): Path<String>,
    Json(request): Json<GenerateQuestionsRequest>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    let questions =
        service.generate_questions(&caller, &PositionId(position_id), request.count)?;
    Ok((StatusCode::CREATED, Json(questions)))
}

async fn delete_question_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    service.delete_question(&caller, &QuestionId(question_id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_application_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(position_id): Path<String>,
    Json(request): Json<StartApplicationRequest>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    let application =
        service.start_application(&caller, &PositionId(position_id), &request.name)?;
    Ok((StatusCode::CREATED, Json(application)))
}

async fn submit_answer_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(application_id): Path<String>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    let answer = service.submit_answer(
        &caller,
        &ApplicationId(application_id),
        &QuestionId(request.question_id),
        &request.response,
    )?;
    Ok((StatusCode::CREATED, Json(answer)))
}

async fn complete_application_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(application_id): Path<String>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(Json(
        service.complete_application(&caller, &ApplicationId(application_id))?,
    ))
}

async fn score_answer_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(answer_id): Path<String>,
    Json(request): Json<ScoreRequest>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(Json(service.score_answer(
        &caller,
        &AnswerId(answer_id),
        request.score,
    )?))
}

async fn application_evaluation_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(application_id): Path<String>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(Json(service.application_evaluation(
        &caller,
        &ApplicationId(application_id),
    )?))
}

async fn finalize_application_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Path(application_id): Path<String>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(Json(service.finalize_application(
        &caller,
        &ApplicationId(application_id),
    )?))
}

async fn status_summary_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(envelope(service.analytics_status_summary(&caller)?))
}

async fn avg_completion_time_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(envelope(service.analytics_average_completion_time(&caller)?))
}

async fn by_position_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(envelope(service.analytics_by_position(&caller)?))
}

async fn result_distribution_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(envelope(service.analytics_result_distribution(&caller)?))
}

async fn completion_ratio_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(envelope(service.analytics_completion_ratio(&caller)?))
}

async fn trends_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Query(query): Query<TrendsQuery>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    let period = query.period.unwrap_or(TrendPeriod::Daily);
    Ok(envelope(service.analytics_trends(
        &caller,
        period,
        query.days,
    )?))
}

async fn abandoned_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
    Query(query): Query<AbandonedQuery>,
) -> Result<impl IntoResponse, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    Ok(envelope(service.analytics_abandoned(&caller, query.hours)?))
}

async fn export_handler<R, N, G>(
    State(service): State<Arc<HiringService<R, N, G>>>,
    caller: Caller,
) -> Result<Response, HiringServiceError>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    let body = service.export_applications_csv(&caller)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv")],
        body,
    )
        .into_response())
}
