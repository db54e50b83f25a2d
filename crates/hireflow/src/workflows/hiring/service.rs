use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use super::analytics::{
    self, AbandonedReport, CompletionRatioSummary, CompletionTimeSummary, PositionBreakdown,
    ResultDistribution, StatusSummary, TrendPeriod, TrendReport, DEFAULT_ABANDON_HOURS,
    DEFAULT_TREND_DAYS,
};
use super::auth::{self, AccessError, Caller};
use super::domain::{
    Answer, AnswerId, Application, ApplicationId, ApplicationStatus, EvaluationStatus,
    OverallResult, Position, PositionDraft, PositionId, Question, QuestionDraft, QuestionId,
    QuestionKind,
};
use super::evaluation::{
    decide, summarize, AnswerSheetEntry, FinalizeOutcome, PASS_THRESHOLD,
};
use super::export;
use super::repository::{
    GeneratorError, HiringNotification, HiringRepository, NotificationError,
    NotificationPublisher, QuestionGenerator, RepositoryError,
};
use super::views::{
    answer_detail, ApplicationEvaluationView, ApplicationView, EvaluationView, FinalizeView,
    QuestionRef, ScoreAnswerView, ScoredApplicationRef,
};

/// Service composing the repository, authorization checks, evaluation
/// engine, analytics, and outbound notifications.
pub struct HiringService<R, N, G> {
    repository: Arc<R>,
    notifications: Arc<N>,
    generator: Arc<G>,
    locks: ApplicationLocks,
}

static POSITION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static QUESTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ANSWER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_position_id() -> PositionId {
    let id = POSITION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PositionId(format!("pos-{id:06}"))
}

fn next_question_id() -> QuestionId {
    let id = QUESTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    QuestionId(format!("q-{id:06}"))
}

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn next_answer_id() -> AnswerId {
    let id = ANSWER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AnswerId(format!("ans-{id:06}"))
}

/// Per-application mutexes serializing the score/finalize check-then-write
/// sequences, the only places where a read-then-conditionally-write race has
/// externally visible consequences.
#[derive(Default)]
struct ApplicationLocks {
    entries: Mutex<HashMap<ApplicationId, Arc<Mutex<()>>>>,
}

impl ApplicationLocks {
    fn entry(&self, id: &ApplicationId) -> Arc<Mutex<()>> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.entry(id.clone()).or_default().clone()
    }

    /// Drop the registry entry once an application is terminal so the map
    /// does not grow with finished interviews. A late caller re-creates the
    /// entry and observes the committed outcome on its re-read.
    fn release(&self, id: &ApplicationId) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.remove(id);
    }
}

impl<R, N, G> HiringService<R, N, G>
where
    R: HiringRepository,
    N: NotificationPublisher,
    G: QuestionGenerator,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, generator: Arc<G>) -> Self {
        Self {
            repository,
            notifications,
            generator,
            locks: ApplicationLocks::default(),
        }
    }

    // ---- positions -------------------------------------------------------

    pub fn create_position(
        &self,
        caller: &Caller,
        draft: PositionDraft,
    ) -> Result<Position, HiringServiceError> {
        auth::require_manager(caller)?;
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }

        let position = Position {
            id: next_position_id(),
            owner: caller.manager_id(),
            title,
            description: draft.description,
            intro: draft.intro,
            farewell: draft.farewell,
            created_at: Utc::now(),
        };
        Ok(self.repository.insert_position(position)?)
    }

    pub fn list_positions(&self, caller: &Caller) -> Result<Vec<Position>, HiringServiceError> {
        auth::require_manager(caller)?;
        Ok(self.repository.positions_for_manager(&caller.manager_id())?)
    }

    pub fn get_position(
        &self,
        caller: &Caller,
        id: &PositionId,
    ) -> Result<Position, HiringServiceError> {
        self.position_owned_by(caller, id)
    }

    pub fn delete_position(
        &self,
        caller: &Caller,
        id: &PositionId,
    ) -> Result<(), HiringServiceError> {
        self.position_owned_by(caller, id)?;
        Ok(self.repository.delete_position(id)?)
    }

    // ---- questions -------------------------------------------------------

    pub fn add_question(
        &self,
        caller: &Caller,
        position_id: &PositionId,
        draft: QuestionDraft,
    ) -> Result<Question, HiringServiceError> {
        let position = self.position_owned_by(caller, position_id)?;
        self.insert_validated_question(&position, draft)
    }

    /// Draft questions via the generator collaborator, then validate and
    /// store them exactly like manually authored ones.
    pub fn generate_questions(
        &self,
        caller: &Caller,
        position_id: &PositionId,
        count: usize,
    ) -> Result<Vec<Question>, HiringServiceError> {
        let position = self.position_owned_by(caller, position_id)?;
        let drafts = self.generator.generate(&position, count)?;

        let mut stored = Vec::with_capacity(drafts.len());
        for draft in drafts {
            stored.push(self.insert_validated_question(&position, draft)?);
        }
        Ok(stored)
    }

    pub fn delete_question(
        &self,
        caller: &Caller,
        question_id: &QuestionId,
    ) -> Result<(), HiringServiceError> {
        let question = self
            .repository
            .fetch_question(question_id)?
            .ok_or(RepositoryError::NotFound)?;
        self.position_owned_by(caller, &question.position_id)?;
        Ok(self.repository.delete_question(question_id)?)
    }

    pub fn list_questions(
        &self,
        caller: &Caller,
        position_id: &PositionId,
    ) -> Result<Vec<Question>, HiringServiceError> {
        self.position_owned_by(caller, position_id)?;
        Ok(self.repository.questions_for_position(position_id)?)
    }

    fn insert_validated_question(
        &self,
        position: &Position,
        draft: QuestionDraft,
    ) -> Result<Question, HiringServiceError> {
        let (text, options, weight) = validated_question_fields(&draft)?;

        let order = self
            .repository
            .questions_for_position(&position.id)?
            .iter()
            .map(|question| question.order)
            .max()
            .unwrap_or(0)
            + 1;

        let question = Question {
            id: next_question_id(),
            position_id: position.id.clone(),
            text,
            order,
            kind: draft.kind,
            options,
            weight,
        };
        Ok(self.repository.insert_question(question)?)
    }

    // ---- candidate flow --------------------------------------------------

    /// Begin an interview. A duplicate submission for the same (position,
    /// email) pair returns the existing application instead of a new row.
    pub fn start_application(
        &self,
        caller: &Caller,
        position_id: &PositionId,
        candidate_name: &str,
    ) -> Result<Application, HiringServiceError> {
        let position = self
            .repository
            .fetch_position(position_id)?
            .ok_or(RepositoryError::NotFound)?;

        let email = caller.email.trim().to_ascii_lowercase();
        if email.is_empty() {
            return Err(ValidationError::EmptyEmail.into());
        }
        let name = candidate_name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyCandidateName.into());
        }

        if let Some(existing) = self.repository.find_application(&position.id, &email)? {
            return Ok(existing);
        }

        let application = Application {
            id: next_application_id(),
            position_id: position.id.clone(),
            candidate_name: name.to_string(),
            candidate_email: email.clone(),
            status: ApplicationStatus::InProgress,
            overall_result: OverallResult::Pending,
            evaluation_status: EvaluationStatus::Pending,
            total_score: None,
            started_at: Utc::now(),
            completed_at: None,
        };

        match self.repository.insert_application(application) {
            Ok(stored) => Ok(stored),
            // Lost a duplicate race; the winner's row is the application.
            Err(RepositoryError::Conflict) => Ok(self
                .repository
                .find_application(&position.id, &email)?
                .ok_or(RepositoryError::NotFound)?),
            Err(err) => Err(err.into()),
        }
    }

    pub fn submit_answer(
        &self,
        caller: &Caller,
        application_id: &ApplicationId,
        question_id: &QuestionId,
        response: &str,
    ) -> Result<Answer, HiringServiceError> {
        let application = self
            .repository
            .fetch_application(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        auth::require_application_candidate(caller, &application)?;

        if application.status == ApplicationStatus::Completed {
            return Err(ValidationError::ApplicationCompleted.into());
        }

        let question = self
            .repository
            .fetch_question(question_id)?
            .ok_or(RepositoryError::NotFound)?;
        if question.position_id != application.position_id {
            return Err(ValidationError::QuestionNotInPosition.into());
        }
        if !question.accepts_response(response) {
            return Err(ValidationError::ResponseNotInOptions {
                response: response.to_string(),
            }
            .into());
        }

        let answer = Answer {
            id: next_answer_id(),
            application_id: application.id.clone(),
            question_id: question.id.clone(),
            response: response.to_string(),
            score: None,
            submitted_at: Utc::now(),
            scored_at: None,
        };

        match self.repository.insert_answer(answer) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => Err(ValidationError::DuplicateAnswer.into()),
            Err(err) => Err(err.into()),
        }
    }

    /// Flip the interview to completed and notify the candidate. Completing
    /// twice is a no-op returning the stored record.
    pub fn complete_application(
        &self,
        caller: &Caller,
        application_id: &ApplicationId,
    ) -> Result<Application, HiringServiceError> {
        let mut application = self
            .repository
            .fetch_application(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        auth::require_application_candidate(caller, &application)?;

        if application.status == ApplicationStatus::Completed {
            return Ok(application);
        }

        application.status = ApplicationStatus::Completed;
        application.completed_at = Some(Utc::now());
        self.repository.update_application(application.clone())?;

        let mut details = BTreeMap::new();
        details.insert(
            "positionId".to_string(),
            application.position_id.0.clone(),
        );
        self.notifications.publish(HiringNotification {
            template: "application_completed".to_string(),
            recipient: application.candidate_email.clone(),
            application_id: application.id.clone(),
            details,
        })?;

        Ok(application)
    }

    // ---- evaluation core -------------------------------------------------

    /// Record a manager's score for one answer. The first score while the
    /// application is PENDING moves it to IN_REVIEW.
    pub fn score_answer(
        &self,
        caller: &Caller,
        answer_id: &AnswerId,
        score: f64,
    ) -> Result<ScoreAnswerView, HiringServiceError> {
        if !score.is_finite() || score < 0.0 {
            return Err(ValidationError::InvalidScore(score).into());
        }

        let mut answer = self
            .repository
            .fetch_answer(answer_id)?
            .ok_or(RepositoryError::NotFound)?;
        let application = self
            .repository
            .fetch_application(&answer.application_id)?
            .ok_or(RepositoryError::NotFound)?;
        self.position_owned_by(caller, &application.position_id)?;
        let question = self
            .repository
            .fetch_question(&answer.question_id)?
            .ok_or(RepositoryError::NotFound)?;

        let lock = self.locks.entry(&application.id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Re-read under the lock so concurrent first scores cannot
        // double-apply or miss the PENDING -> IN_REVIEW transition.
        let mut application = self
            .repository
            .fetch_application(&answer.application_id)?
            .ok_or(RepositoryError::NotFound)?;

        answer.score = Some(score);
        answer.scored_at = Some(Utc::now());
        self.repository.update_answer(answer.clone())?;

        if application.evaluation_status == EvaluationStatus::Pending {
            application.evaluation_status = EvaluationStatus::InReview;
            self.repository.update_application(application.clone())?;
        }

        Ok(ScoreAnswerView {
            id: answer.id,
            score,
            question: QuestionRef::from(&question),
            application: ScoredApplicationRef {
                id: application.id,
                name: application.candidate_name,
                email: application.candidate_email,
                evaluation_status: application.evaluation_status,
            },
        })
    }

    /// Read-side evaluation snapshot: totals, percentage, pass/fail flags,
    /// and scoring progress. Never mutates persisted state.
    pub fn application_evaluation(
        &self,
        caller: &Caller,
        application_id: &ApplicationId,
    ) -> Result<ApplicationEvaluationView, HiringServiceError> {
        let application = self
            .repository
            .fetch_application(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        self.position_owned_by(caller, &application.position_id)?;

        let sheet = self.answer_sheet(&application)?;
        let summary = summarize(&sheet);

        let evaluation = EvaluationView {
            total_score: summary.total_score,
            max_possible_score: summary.max_possible_score,
            score_percentage: (summary.progress.scored_answers > 0)
                .then_some(summary.score_percentage),
            threshold: PASS_THRESHOLD,
            is_passed: application.evaluation_status == EvaluationStatus::Passed,
            is_failed: application.evaluation_status == EvaluationStatus::Failed,
            is_complete: summary.is_complete(),
            progress: summary.progress,
        };

        Ok(ApplicationEvaluationView {
            application: ApplicationView::from(&application),
            evaluation,
            answers: sheet
                .iter()
                .map(|entry| answer_detail(&entry.answer, &entry.question))
                .collect(),
        })
    }

    /// Commit the threshold decision. Fails with the unscored count while any
    /// answer lacks a score; re-finalizing a terminal application is a no-op
    /// returning the recorded outcome.
    pub fn finalize_application(
        &self,
        caller: &Caller,
        application_id: &ApplicationId,
    ) -> Result<FinalizeView, HiringServiceError> {
        let application = self
            .repository
            .fetch_application(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        self.position_owned_by(caller, &application.position_id)?;

        let lock = self.locks.entry(application_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Re-read under the lock; a racing finalize that committed first is
        // observed here and answered with its recorded outcome.
        let mut application = self
            .repository
            .fetch_application(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        let sheet = self.answer_sheet(&application)?;
        let summary = summarize(&sheet);

        if application.evaluation_status.is_terminal() {
            let outcome = FinalizeOutcome {
                total_score: application.total_score.unwrap_or(summary.total_score),
                max_possible_score: summary.max_possible_score,
                score_percentage: summary.score_percentage,
                threshold: PASS_THRESHOLD,
                passed: application.evaluation_status == EvaluationStatus::Passed,
            };
            self.locks.release(application_id);
            return Ok(finalize_view(application, outcome, &sheet));
        }

        if !summary.is_complete() {
            return Err(ValidationError::UnscoredAnswers {
                unscored: summary.progress.unscored_answers,
                total: summary.progress.total_answers,
            }
            .into());
        }

        let outcome = decide(&summary);
        let (status, result) = if outcome.passed {
            (EvaluationStatus::Passed, OverallResult::Passed)
        } else {
            (EvaluationStatus::Failed, OverallResult::Failed)
        };
        application.evaluation_status = status;
        application.overall_result = result;
        application.total_score = Some(outcome.total_score);
        self.repository.update_application(application.clone())?;
        self.locks.release(application_id);

        let mut details = BTreeMap::new();
        details.insert(
            "result".to_string(),
            application.overall_result.label().to_string(),
        );
        details.insert(
            "scorePercentage".to_string(),
            format!("{:.2}", outcome.score_percentage),
        );
        self.notifications.publish(HiringNotification {
            template: "application_result".to_string(),
            recipient: application.candidate_email.clone(),
            application_id: application.id.clone(),
            details,
        })?;

        Ok(finalize_view(application, outcome, &sheet))
    }

    // ---- analytics -------------------------------------------------------

    pub fn analytics_status_summary(
        &self,
        caller: &Caller,
    ) -> Result<StatusSummary, HiringServiceError> {
        let (_, applications) = self.manager_snapshot(caller)?;
        Ok(analytics::status_summary(&applications))
    }

    pub fn analytics_average_completion_time(
        &self,
        caller: &Caller,
    ) -> Result<CompletionTimeSummary, HiringServiceError> {
        let (_, applications) = self.manager_snapshot(caller)?;
        Ok(analytics::average_completion_time(&applications))
    }

    pub fn analytics_by_position(
        &self,
        caller: &Caller,
    ) -> Result<PositionBreakdown, HiringServiceError> {
        let (positions, applications) = self.manager_snapshot(caller)?;
        Ok(analytics::applications_by_position(&positions, &applications))
    }

    pub fn analytics_result_distribution(
        &self,
        caller: &Caller,
    ) -> Result<ResultDistribution, HiringServiceError> {
        let (_, applications) = self.manager_snapshot(caller)?;
        Ok(analytics::result_distribution(&applications))
    }

    pub fn analytics_completion_ratio(
        &self,
        caller: &Caller,
    ) -> Result<CompletionRatioSummary, HiringServiceError> {
        let (positions, applications) = self.manager_snapshot(caller)?;
        Ok(analytics::completion_ratio(&positions, &applications))
    }

    pub fn analytics_trends(
        &self,
        caller: &Caller,
        period: TrendPeriod,
        lookback_days: Option<i64>,
    ) -> Result<TrendReport, HiringServiceError> {
        let days = lookback_days.unwrap_or(DEFAULT_TREND_DAYS);
        if days <= 0 {
            return Err(ValidationError::InvalidWindow { value: days }.into());
        }
        let (_, applications) = self.manager_snapshot(caller)?;
        Ok(analytics::trends(&applications, period, days, Utc::now()))
    }

    pub fn analytics_abandoned(
        &self,
        caller: &Caller,
        threshold_hours: Option<i64>,
    ) -> Result<AbandonedReport, HiringServiceError> {
        let hours = threshold_hours.unwrap_or(DEFAULT_ABANDON_HOURS);
        if hours <= 0 {
            return Err(ValidationError::InvalidWindow { value: hours }.into());
        }
        let (_, applications) = self.manager_snapshot(caller)?;
        Ok(analytics::abandoned(&applications, hours, Utc::now()))
    }

    /// Manager's applications as CSV rows for spreadsheet handoff.
    pub fn export_applications_csv(&self, caller: &Caller) -> Result<String, HiringServiceError> {
        let (positions, applications) = self.manager_snapshot(caller)?;
        Ok(export::applications_csv(&positions, &applications)?)
    }

    // ---- internals -------------------------------------------------------

    #[cfg(test)]
    pub(crate) fn tracked_application_locks(&self) -> usize {
        self.locks
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn position_owned_by(
        &self,
        caller: &Caller,
        id: &PositionId,
    ) -> Result<Position, HiringServiceError> {
        let position = self
            .repository
            .fetch_position(id)?
            .ok_or(RepositoryError::NotFound)?;
        auth::require_position_owner(caller, &position)?;
        Ok(position)
    }

    /// All positions owned by the caller plus every application reachable
    /// from them; the scoping root for analytics and export.
    fn manager_snapshot(
        &self,
        caller: &Caller,
    ) -> Result<(Vec<Position>, Vec<Application>), HiringServiceError> {
        auth::require_manager(caller)?;
        let positions = self.repository.positions_for_manager(&caller.manager_id())?;
        let mut applications = Vec::new();
        for position in &positions {
            applications.extend(self.repository.applications_for_position(&position.id)?);
        }
        Ok((positions, applications))
    }

    fn answer_sheet(
        &self,
        application: &Application,
    ) -> Result<Vec<AnswerSheetEntry>, HiringServiceError> {
        let answers = self.repository.answers_for_application(&application.id)?;
        let questions: HashMap<QuestionId, Question> = self
            .repository
            .questions_for_position(&application.position_id)?
            .into_iter()
            .map(|question| (question.id.clone(), question))
            .collect();

        answers
            .into_iter()
            .map(|answer| -> Result<AnswerSheetEntry, HiringServiceError> {
                let question = questions.get(&answer.question_id).cloned().ok_or_else(|| {
                    RepositoryError::Unavailable(format!(
                        "answer {} references a missing question",
                        answer.id.0
                    ))
                })?;
                Ok(AnswerSheetEntry { answer, question })
            })
            .collect()
    }
}

fn finalize_view(
    application: Application,
    scoring: FinalizeOutcome,
    sheet: &[AnswerSheetEntry],
) -> FinalizeView {
    FinalizeView {
        application: ApplicationView::from(&application),
        scoring,
        answers: sheet
            .iter()
            .map(|entry| answer_detail(&entry.answer, &entry.question))
            .collect(),
    }
}

fn validated_question_fields(
    draft: &QuestionDraft,
) -> Result<(String, Option<Vec<String>>, f64), ValidationError> {
    let text = draft.text.trim().to_string();
    if text.is_empty() {
        return Err(ValidationError::EmptyQuestionText);
    }

    let weight = draft.weight.unwrap_or(1.0);
    if !weight.is_finite() || weight <= 0.0 {
        return Err(ValidationError::InvalidWeight(weight));
    }

    let options = match (draft.kind, &draft.options) {
        (QuestionKind::MultipleChoice, Some(options)) => {
            let cleaned: Vec<String> = options
                .iter()
                .map(|option| option.trim().to_string())
                .collect();
            if cleaned.len() < 2 || cleaned.iter().any(String::is_empty) {
                return Err(ValidationError::OptionsRequired);
            }
            Some(cleaned)
        }
        (QuestionKind::MultipleChoice, None) => return Err(ValidationError::OptionsRequired),
        (QuestionKind::Text, Some(_)) => return Err(ValidationError::OptionsNotAllowed),
        (QuestionKind::Text, None) => None,
    };

    Ok((text, options, weight))
}

/// Malformed input rejected before any mutation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("score must be a finite number >= 0, got {0}")]
    InvalidScore(f64),
    #[error("question weight must be a positive finite number, got {0}")]
    InvalidWeight(f64),
    #[error("question text must not be empty")]
    EmptyQuestionText,
    #[error("multiple choice questions require at least two non-empty options")]
    OptionsRequired,
    #[error("options are only allowed on multiple choice questions")]
    OptionsNotAllowed,
    #[error("position title must not be empty")]
    EmptyTitle,
    #[error("candidate email must not be empty")]
    EmptyEmail,
    #[error("candidate name must not be empty")]
    EmptyCandidateName,
    #[error("response '{response}' is not one of the question's options")]
    ResponseNotInOptions { response: String },
    #[error("question already answered for this application")]
    DuplicateAnswer,
    #[error("question does not belong to the application's position")]
    QuestionNotInPosition,
    #[error("application is already completed")]
    ApplicationCompleted,
    #[error("{unscored} of {total} answers still need scoring")]
    UnscoredAnswers { unscored: usize, total: usize },
    #[error("window must be a positive number, got {value}")]
    InvalidWindow { value: i64 },
}

/// Error raised by the hiring service.
#[derive(Debug, thiserror::Error)]
pub enum HiringServiceError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error("csv export failed: {0}")]
    Export(#[from] csv::Error),
}
