use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, Response};
use chrono::Utc;
use serde_json::Value;

use crate::workflows::hiring::auth::{Caller, Role};
use crate::workflows::hiring::domain::{
    Answer, AnswerId, Application, ApplicationId, ManagerId, Position, PositionDraft, PositionId,
    Question, QuestionDraft, QuestionId, QuestionKind,
};
use crate::workflows::hiring::evaluation::AnswerSheetEntry;
use crate::workflows::hiring::repository::{
    GeneratorError, HiringNotification, HiringRepository, NotificationError,
    NotificationPublisher, QuestionGenerator, RepositoryError,
};
use crate::workflows::hiring::service::HiringService;

pub(super) type TestService = HiringService<MemoryRepository, MemoryNotifications, StaticGenerator>;

pub(super) fn manager() -> Caller {
    Caller {
        subject: "mgr-1".to_string(),
        email: "hiring@example.com".to_string(),
        role: Role::Manager,
    }
}

pub(super) fn other_manager() -> Caller {
    Caller {
        subject: "mgr-2".to_string(),
        email: "other@example.com".to_string(),
        role: Role::Manager,
    }
}

pub(super) fn candidate(email: &str) -> Caller {
    Caller {
        subject: format!("cand-{email}"),
        email: email.to_string(),
        role: Role::Candidate,
    }
}

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let generator = Arc::new(StaticGenerator);
    let service = Arc::new(HiringService::new(
        repository.clone(),
        notifications.clone(),
        generator,
    ));
    (service, repository, notifications)
}

pub(super) fn text_question(text: &str, weight: f64) -> QuestionDraft {
    QuestionDraft {
        text: text.to_string(),
        kind: QuestionKind::Text,
        options: None,
        weight: Some(weight),
    }
}

pub(super) fn choice_question(text: &str, options: &[&str], weight: f64) -> QuestionDraft {
    QuestionDraft {
        text: text.to_string(),
        kind: QuestionKind::MultipleChoice,
        options: Some(options.iter().map(ToString::to_string).collect()),
        weight: Some(weight),
    }
}

/// Position with two text questions weighted [1, 2], the setup behind most
/// scoring scenarios.
pub(super) fn seeded_position(service: &TestService) -> (Position, Vec<Question>) {
    let position = service
        .create_position(
            &manager(),
            PositionDraft {
                title: "Backend Engineer".to_string(),
                description: Some("Rust services team".to_string()),
                intro: None,
                farewell: None,
            },
        )
        .expect("position created");

    let first = service
        .add_question(
            &manager(),
            &position.id,
            text_question("Walk us through a production incident you handled.", 1.0),
        )
        .expect("first question");
    let second = service
        .add_question(
            &manager(),
            &position.id,
            text_question("Design a rate limiter for a public API.", 2.0),
        )
        .expect("second question");

    (position, vec![first, second])
}

/// Start, answer every question, and complete an interview for `email`.
pub(super) fn answered_application(
    service: &TestService,
    position: &Position,
    questions: &[Question],
    email: &str,
) -> (Application, Vec<Answer>) {
    let caller = candidate(email);
    let application = service
        .start_application(&caller, &position.id, "Dana Whitfield")
        .expect("application started");

    let answers = questions
        .iter()
        .map(|question| {
            service
                .submit_answer(
                    &caller,
                    &application.id,
                    &question.id,
                    "A considered answer.",
                )
                .expect("answer submitted")
        })
        .collect();

    let application = service
        .complete_application(&caller, &application.id)
        .expect("application completed");

    (application, answers)
}

/// Detached sheet entry for exercising the aggregator without a repository.
pub(super) fn sheet_entry(index: usize, score: Option<f64>, weight: f64) -> AnswerSheetEntry {
    let question = Question {
        id: QuestionId(format!("q-test-{index}")),
        position_id: PositionId("pos-test".to_string()),
        text: format!("Question {index}"),
        order: index as u32,
        kind: QuestionKind::Text,
        options: None,
        weight,
    };
    let answer = Answer {
        id: AnswerId(format!("ans-test-{index}")),
        application_id: ApplicationId("app-test".to_string()),
        question_id: question.id.clone(),
        response: "response".to_string(),
        score,
        submitted_at: Utc::now(),
        scored_at: score.map(|_| Utc::now()),
    };
    AnswerSheetEntry { answer, question }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    positions: Mutex<HashMap<PositionId, Position>>,
    questions: Mutex<HashMap<QuestionId, Question>>,
    applications: Mutex<HashMap<ApplicationId, Application>>,
    answers: Mutex<HashMap<AnswerId, Answer>>,
}

impl HiringRepository for MemoryRepository {
    fn insert_position(&self, position: Position) -> Result<Position, RepositoryError> {
        let mut guard = self.positions.lock().expect("positions mutex poisoned");
        if guard.contains_key(&position.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(position.id.clone(), position.clone());
        Ok(position)
    }

    fn fetch_position(&self, id: &PositionId) -> Result<Option<Position>, RepositoryError> {
        let guard = self.positions.lock().expect("positions mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn positions_for_manager(
        &self,
        manager: &ManagerId,
    ) -> Result<Vec<Position>, RepositoryError> {
        let guard = self.positions.lock().expect("positions mutex poisoned");
        let mut owned: Vec<Position> = guard
            .values()
            .filter(|position| &position.owner == manager)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(owned)
    }

    fn delete_position(&self, id: &PositionId) -> Result<(), RepositoryError> {
        let removed = self
            .positions
            .lock()
            .expect("positions mutex poisoned")
            .remove(id);
        if removed.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let question_ids: Vec<QuestionId> = {
            let mut questions = self.questions.lock().expect("questions mutex poisoned");
            let ids: Vec<QuestionId> = questions
                .values()
                .filter(|question| &question.position_id == id)
                .map(|question| question.id.clone())
                .collect();
            for question_id in &ids {
                questions.remove(question_id);
            }
            ids
        };

        let application_ids: Vec<ApplicationId> = {
            let mut applications = self
                .applications
                .lock()
                .expect("applications mutex poisoned");
            let ids: Vec<ApplicationId> = applications
                .values()
                .filter(|application| &application.position_id == id)
                .map(|application| application.id.clone())
                .collect();
            for application_id in &ids {
                applications.remove(application_id);
            }
            ids
        };

        let mut answers = self.answers.lock().expect("answers mutex poisoned");
        answers.retain(|_, answer| {
            !question_ids.contains(&answer.question_id)
                && !application_ids.contains(&answer.application_id)
        });
        Ok(())
    }

    fn insert_question(&self, question: Question) -> Result<Question, RepositoryError> {
        let mut guard = self.questions.lock().expect("questions mutex poisoned");
        if guard.contains_key(&question.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(question.id.clone(), question.clone());
        Ok(question)
    }

    fn fetch_question(&self, id: &QuestionId) -> Result<Option<Question>, RepositoryError> {
        let guard = self.questions.lock().expect("questions mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn questions_for_position(
        &self,
        position: &PositionId,
    ) -> Result<Vec<Question>, RepositoryError> {
        let guard = self.questions.lock().expect("questions mutex poisoned");
        let mut questions: Vec<Question> = guard
            .values()
            .filter(|question| &question.position_id == position)
            .cloned()
            .collect();
        questions.sort_by_key(|question| question.order);
        Ok(questions)
    }

    fn delete_question(&self, id: &QuestionId) -> Result<(), RepositoryError> {
        let removed = self
            .questions
            .lock()
            .expect("questions mutex poisoned")
            .remove(id);
        if removed.is_none() {
            return Err(RepositoryError::NotFound);
        }
        let mut answers = self.answers.lock().expect("answers mutex poisoned");
        answers.retain(|_, answer| &answer.question_id != id);
        Ok(())
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self
            .applications
            .lock()
            .expect("applications mutex poisoned");
        let duplicate = guard.values().any(|existing| {
            existing.position_id == application.position_id
                && existing.candidate_email == application.candidate_email
        });
        if duplicate || guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self
            .applications
            .lock()
            .expect("applications mutex poisoned");
        if !guard.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(application.id.clone(), application);
        Ok(())
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self
            .applications
            .lock()
            .expect("applications mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_application(
        &self,
        position: &PositionId,
        email: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self
            .applications
            .lock()
            .expect("applications mutex poisoned");
        Ok(guard
            .values()
            .find(|application| {
                &application.position_id == position && application.candidate_email == email
            })
            .cloned())
    }

    fn applications_for_position(
        &self,
        position: &PositionId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let guard = self
            .applications
            .lock()
            .expect("applications mutex poisoned");
        let mut applications: Vec<Application> = guard
            .values()
            .filter(|application| &application.position_id == position)
            .cloned()
            .collect();
        applications.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(applications)
    }

    fn insert_answer(&self, answer: Answer) -> Result<Answer, RepositoryError> {
        let mut guard = self.answers.lock().expect("answers mutex poisoned");
        let duplicate = guard.values().any(|existing| {
            existing.application_id == answer.application_id
                && existing.question_id == answer.question_id
        });
        if duplicate || guard.contains_key(&answer.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(answer.id.clone(), answer.clone());
        Ok(answer)
    }

    fn update_answer(&self, answer: Answer) -> Result<(), RepositoryError> {
        let mut guard = self.answers.lock().expect("answers mutex poisoned");
        if !guard.contains_key(&answer.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(answer.id.clone(), answer);
        Ok(())
    }

    fn fetch_answer(&self, id: &AnswerId) -> Result<Option<Answer>, RepositoryError> {
        let guard = self.answers.lock().expect("answers mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn answers_for_application(
        &self,
        application: &ApplicationId,
    ) -> Result<Vec<Answer>, RepositoryError> {
        let guard = self.answers.lock().expect("answers mutex poisoned");
        let mut answers: Vec<Answer> = guard
            .values()
            .filter(|answer| &answer.application_id == application)
            .cloned()
            .collect();
        answers.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(answers)
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<HiringNotification>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<HiringNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: HiringNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Deterministic generator standing in for the external drafting service.
pub(super) struct StaticGenerator;

impl QuestionGenerator for StaticGenerator {
    fn generate(
        &self,
        position: &Position,
        count: usize,
    ) -> Result<Vec<QuestionDraft>, GeneratorError> {
        Ok((1..=count)
            .map(|index| QuestionDraft {
                text: format!("Generated question {index} for {}", position.title),
                kind: QuestionKind::Text,
                options: None,
                weight: Some(1.0),
            })
            .collect())
    }
}

pub(super) fn authed_request(
    method: &str,
    uri: &str,
    caller: &Caller,
    body: Option<Value>,
) -> Request<Body> {
    let role = match caller.role {
        Role::Manager => "MANAGER",
        Role::Candidate => "CANDIDATE",
    };
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-caller-subject", &caller.subject)
        .header("x-caller-email", &caller.email)
        .header("x-caller-role", role);

    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&value).expect("serialize body"),
            ))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(super) async fn read_json_body(response: Response<axum::body::Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
