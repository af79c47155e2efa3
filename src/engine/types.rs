use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Action, Role, Status};
use crate::payload::PayloadError;
use crate::store::SystemMessage;
use crate::validator::TransitionCheckError;

/// Result of a committed transition. Cached verbatim by the idempotency
/// layer, so replays within the TTL return an identical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub chat_id: i64,
    pub action: Action,
    pub from_status: Status,
    /// Target computed from the graph; equals `from_status` for the
    /// no-status-change actions.
    pub to_status: Status,
    pub status_changed: bool,
    pub system_message: Option<SystemMessage>,
    pub audit_id: Option<i64>,
    pub action_id: i64,
    pub committed_at: DateTime<Utc>,
}

/// Error taxonomy surfaced to callers.
///
/// Everything except `Internal` is rejected pre-transaction and therefore
/// guaranteed side-effect-free. `Internal` deliberately carries no detail:
/// persistence failures are logged with full context but not leaked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("transition engine is disabled")]
    Disabled,
    #[error("chat {chat_id} not found")]
    NotFound { chat_id: i64 },
    #[error("chat {chat_id} is not a shipment chat")]
    WrongEntityType { chat_id: i64 },
    #[error("role {role} is not permitted to perform {action}")]
    RoleNotPermitted { action: Action, role: Role },
    #[error("action {action} is not allowed from status {status}")]
    StatusNotPermitted { action: Action, status: Status },
    #[error(transparent)]
    PayloadInvalid(#[from] PayloadError),
    #[error("internal error")]
    Internal,
}

impl EngineError {
    /// Stable machine-readable code for API responses and error metrics.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Disabled => "disabled",
            EngineError::NotFound { .. } => "not-found",
            EngineError::WrongEntityType { .. } => "wrong-entity-type",
            EngineError::RoleNotPermitted { .. } => "role-not-permitted",
            EngineError::StatusNotPermitted { .. } => "status-not-permitted",
            EngineError::PayloadInvalid(_) => "payload-invalid",
            EngineError::Internal => "internal-error",
        }
    }
}

impl From<TransitionCheckError> for EngineError {
    fn from(err: TransitionCheckError) -> Self {
        match err {
            TransitionCheckError::RoleNotPermitted { action, role } => {
                EngineError::RoleNotPermitted { action, role }
            }
            TransitionCheckError::StatusNotPermitted { action, status } => {
                EngineError::StatusNotPermitted { action, status }
            }
        }
    }
}
