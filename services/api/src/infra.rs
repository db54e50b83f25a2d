use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;

use hireflow::workflows::hiring::{
    Answer, AnswerId, Application, ApplicationId, GeneratorError, HiringNotification,
    HiringRepository, ManagerId, NotificationError, NotificationPublisher, Position, PositionId,
    Question, QuestionDraft, QuestionGenerator, QuestionId, QuestionKind, RepositoryError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store backing the service until a database adapter lands.
#[derive(Default)]
pub(crate) struct InMemoryHiringRepository {
    positions: Mutex<HashMap<PositionId, Position>>,
    questions: Mutex<HashMap<QuestionId, Question>>,
    applications: Mutex<HashMap<ApplicationId, Application>>,
    answers: Mutex<HashMap<AnswerId, Answer>>,
}

impl HiringRepository for InMemoryHiringRepository {
    fn insert_position(&self, position: Position) -> Result<Position, RepositoryError> {
        let mut guard = self.positions.lock().expect("repository mutex poisoned");
        if guard.contains_key(&position.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(position.id.clone(), position.clone());
        Ok(position)
    }

    fn fetch_position(&self, id: &PositionId) -> Result<Option<Position>, RepositoryError> {
        let guard = self.positions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn positions_for_manager(
        &self,
        manager: &ManagerId,
    ) -> Result<Vec<Position>, RepositoryError> {
        let guard = self.positions.lock().expect("repository mutex poisoned");
        let mut owned: Vec<Position> = guard
            .values()
            .filter(|position| &position.owner == manager)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(owned)
    }

    fn delete_position(&self, id: &PositionId) -> Result<(), RepositoryError> {
        if self
            .positions
            .lock()
            .expect("repository mutex poisoned")
            .remove(id)
            .is_none()
        {
            return Err(RepositoryError::NotFound);
        }

        self.questions
            .lock()
            .expect("repository mutex poisoned")
            .retain(|_, question| &question.position_id != id);

        let removed: Vec<ApplicationId> = {
            let mut applications = self
                .applications
                .lock()
                .expect("repository mutex poisoned");
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

        self.answers
            .lock()
            .expect("repository mutex poisoned")
            .retain(|_, answer| !removed.contains(&answer.application_id));
        Ok(())
    }

    fn insert_question(&self, question: Question) -> Result<Question, RepositoryError> {
        let mut guard = self.questions.lock().expect("repository mutex poisoned");
        if guard.contains_key(&question.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(question.id.clone(), question.clone());
        Ok(question)
    }

    fn fetch_question(&self, id: &QuestionId) -> Result<Option<Question>, RepositoryError> {
        let guard = self.questions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn questions_for_position(
        &self,
        position: &PositionId,
    ) -> Result<Vec<Question>, RepositoryError> {
        let guard = self.questions.lock().expect("repository mutex poisoned");
        let mut questions: Vec<Question> = guard
            .values()
            .filter(|question| &question.position_id == position)
            .cloned()
            .collect();
        questions.sort_by_key(|question| question.order);
        Ok(questions)
    }

    fn delete_question(&self, id: &QuestionId) -> Result<(), RepositoryError> {
        if self
            .questions
            .lock()
            .expect("repository mutex poisoned")
            .remove(id)
            .is_none()
        {
            return Err(RepositoryError::NotFound);
        }
        self.answers
            .lock()
            .expect("repository mutex poisoned")
            .retain(|_, answer| &answer.question_id != id);
        Ok(())
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self
            .applications
            .lock()
            .expect("repository mutex poisoned");
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
            .expect("repository mutex poisoned");
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
            .expect("repository mutex poisoned");
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
            .expect("repository mutex poisoned");
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
            .expect("repository mutex poisoned");
        let mut applications: Vec<Application> = guard
            .values()
            .filter(|application| &application.position_id == position)
            .cloned()
            .collect();
        applications.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(applications)
    }

    fn insert_answer(&self, answer: Answer) -> Result<Answer, RepositoryError> {
        let mut guard = self.answers.lock().expect("repository mutex poisoned");
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
        let mut guard = self.answers.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&answer.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(answer.id.clone(), answer);
        Ok(())
    }

    fn fetch_answer(&self, id: &AnswerId) -> Result<Option<Answer>, RepositoryError> {
        let guard = self.answers.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn answers_for_application(
        &self,
        application: &ApplicationId,
    ) -> Result<Vec<Answer>, RepositoryError> {
        let guard = self.answers.lock().expect("repository mutex poisoned");
        let mut answers: Vec<Answer> = guard
            .values()
            .filter(|answer| &answer.application_id == application)
            .cloned()
            .collect();
        answers.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(answers)
    }
}

/// Logs notifications instead of sending mail; the transport adapter is a
/// deployment concern.
#[derive(Default)]
pub(crate) struct LoggingNotificationPublisher {
    events: Mutex<Vec<HiringNotification>>,
}

impl LoggingNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<HiringNotification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl NotificationPublisher for LoggingNotificationPublisher {
    fn publish(&self, notification: HiringNotification) -> Result<(), NotificationError> {
        tracing::info!(
            template = %notification.template,
            recipient = %notification.recipient,
            application = %notification.application_id.0,
            "candidate notification queued"
        );
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Drafts interview questions from a fixed prompt bank keyed off the position
/// title. Stands in for an external drafting model.
pub(crate) struct TemplateQuestionGenerator;

const PROMPT_BANK: &[&str] = &[
    "What drew you to the {title} role?",
    "Describe a recent project you are proud of and your part in it.",
    "Walk through a hard technical decision you made and its trade-offs.",
    "How do you handle disagreement with a teammate about direction?",
    "What would you want to learn or improve in your first six months?",
];

impl QuestionGenerator for TemplateQuestionGenerator {
    fn generate(
        &self,
        position: &Position,
        count: usize,
    ) -> Result<Vec<QuestionDraft>, GeneratorError> {
        Ok(PROMPT_BANK
            .iter()
            .cycle()
            .take(count)
            .map(|template| QuestionDraft {
                text: template.replace("{title}", &position.title),
                kind: QuestionKind::Text,
                options: None,
                weight: Some(1.0),
            })
            .collect())
    }
}
