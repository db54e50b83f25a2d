use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Answer, AnswerId, Application, ApplicationId, ManagerId, Position, PositionId, Question,
    QuestionDraft, QuestionId,
};

/// Storage abstraction over the four related entities so the service module
/// can be exercised in isolation. Implementations must enforce the unique
/// pairs (application position+email) and (answer application+question) by
/// returning [`RepositoryError::Conflict`].
pub trait HiringRepository: Send + Sync {
    fn insert_position(&self, position: Position) -> Result<Position, RepositoryError>;
    fn fetch_position(&self, id: &PositionId) -> Result<Option<Position>, RepositoryError>;
    fn positions_for_manager(&self, manager: &ManagerId)
        -> Result<Vec<Position>, RepositoryError>;
    /// Cascades to the position's questions, applications, and answers.
    fn delete_position(&self, id: &PositionId) -> Result<(), RepositoryError>;

    fn insert_question(&self, question: Question) -> Result<Question, RepositoryError>;
    fn fetch_question(&self, id: &QuestionId) -> Result<Option<Question>, RepositoryError>;
    /// Questions sorted by their per-position `order`.
    fn questions_for_position(
        &self,
        position: &PositionId,
    ) -> Result<Vec<Question>, RepositoryError>;
    /// Cascades to the question's answers.
    fn delete_question(&self, id: &QuestionId) -> Result<(), RepositoryError>;

    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn find_application(
        &self,
        position: &PositionId,
        email: &str,
    ) -> Result<Option<Application>, RepositoryError>;
    fn applications_for_position(
        &self,
        position: &PositionId,
    ) -> Result<Vec<Application>, RepositoryError>;

    fn insert_answer(&self, answer: Answer) -> Result<Answer, RepositoryError>;
    fn update_answer(&self, answer: Answer) -> Result<(), RepositoryError>;
    fn fetch_answer(&self, id: &AnswerId) -> Result<Option<Answer>, RepositoryError>;
    fn answers_for_application(
        &self,
        application: &ApplicationId,
    ) -> Result<Vec<Answer>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hooks (e-mail adapters and similar).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: HiringNotification) -> Result<(), NotificationError>;
}

/// Notification payload so routes and tests can assert integration
/// boundaries without a mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiringNotification {
    pub template: String,
    pub recipient: String,
    pub application_id: ApplicationId,
    pub details: BTreeMap<String, String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Optional question-generation collaborator. Drafts still pass the same
/// validation as manually authored questions.
pub trait QuestionGenerator: Send + Sync {
    fn generate(
        &self,
        position: &Position,
        count: usize,
    ) -> Result<Vec<QuestionDraft>, GeneratorError>;
}

/// Question generator failure.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("question generator unavailable: {0}")]
    Unavailable(String),
}
