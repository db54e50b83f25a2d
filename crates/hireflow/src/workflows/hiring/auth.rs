//! Centralized authorization checks applied before any core logic runs.
//!
//! The session provider itself is out of scope; the edge hands us a
//! [`Caller`] and every service operation funnels through these capability
//! checks instead of comparing role strings inline.

use serde::{Deserialize, Serialize};

use super::domain::{Application, ManagerId, Position};

/// Role attached to an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Manager,
    Candidate,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MANAGER" => Some(Self::Manager),
            "CANDIDATE" => Some(Self::Candidate),
            _ => None,
        }
    }
}

/// Authenticated caller identity supplied by the edge.
///
/// `subject` is the store-assigned id compared against `Position::owner`;
/// candidate ownership is identity-by-email (weak, non-cryptographic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub subject: String,
    pub email: String,
    pub role: Role,
}

impl Caller {
    pub fn manager_id(&self) -> ManagerId {
        ManagerId(self.subject.clone())
    }
}

/// Authorization failure; core logic is never executed after one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("manager role required")]
    ManagerRoleRequired,
    #[error("position is owned by another manager")]
    NotPositionOwner,
    #[error("application belongs to another candidate")]
    NotApplicationCandidate,
}

pub fn require_manager(caller: &Caller) -> Result<(), AccessError> {
    if caller.role == Role::Manager {
        Ok(())
    } else {
        Err(AccessError::ManagerRoleRequired)
    }
}

/// Manager-facing mutations and reads are scoped to owned positions.
pub fn require_position_owner(caller: &Caller, position: &Position) -> Result<(), AccessError> {
    require_manager(caller)?;
    if position.owner.0 == caller.subject {
        Ok(())
    } else {
        Err(AccessError::NotPositionOwner)
    }
}

pub fn require_application_candidate(
    caller: &Caller,
    application: &Application,
) -> Result<(), AccessError> {
    if application
        .candidate_email
        .eq_ignore_ascii_case(&caller.email)
    {
        Ok(())
    } else {
        Err(AccessError::NotApplicationCandidate)
    }
}
