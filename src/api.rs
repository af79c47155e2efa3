//! Request/response DTOs for the presentation layer.
//!
//! Transport-agnostic: a bot handler or HTTP route deserializes an
//! `ActionRequest`, supplies the authenticated `Actor` out of band, and
//! relays the `ActionResponse` verbatim. Error codes are stable strings
//! suitable for client-side branching and localization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{Actor, EngineError, TransitionEngine, TransitionOutcome};
use crate::model::{Action, Role, Status};
use crate::payload::PayloadError;
use crate::query::{ActionDescriptor, QuerySurface, TimelineEntry};
use crate::store::{ShipmentStore, SystemMessage};

/// Inbound action invocation. `client_id` keys idempotent retries and must
/// stay constant across resubmissions of the same logical request.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub payload: Value,
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_changed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<SystemMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ActionResponse {
    fn success(outcome: TransitionOutcome) -> Self {
        Self {
            ok: true,
            from: Some(outcome.from_status),
            to: Some(outcome.to_status),
            status_changed: Some(outcome.status_changed),
            system_message: outcome.system_message,
            audit_id: outcome.audit_id,
            action_id: Some(outcome.action_id),
            error: None,
        }
    }

    fn failure(err: EngineError) -> Self {
        Self {
            ok: false,
            from: None,
            to: None,
            status_changed: None,
            system_message: None,
            audit_id: None,
            action_id: None,
            error: Some(ApiError {
                code: err.code(),
                message: err.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableActionsResponse {
    pub chat_id: i64,
    pub actions: Vec<ActionDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineResponse {
    pub chat_id: i64,
    pub entries: Vec<TimelineEntry>,
}

/// Execute one action on behalf of an authenticated caller.
///
/// An unknown action name is a payload error, same as a malformed payload
/// for a known action; it never reaches the engine.
pub async fn handle_action<S: ShipmentStore>(
    engine: &TransitionEngine<S>,
    chat_id: i64,
    actor: &Actor,
    request: &ActionRequest,
) -> ActionResponse {
    let Some(action) = Action::parse(&request.action) else {
        let err = EngineError::PayloadInvalid(PayloadError::UnknownAction(request.action.clone()));
        engine.metrics().record_error(err.code());
        tracing::warn!(
            chat.id = chat_id,
            transition.action = %request.action,
            "unknown action name rejected"
        );
        return ActionResponse::failure(err);
    };

    match engine
        .execute(chat_id, action, &request.payload, actor, &request.client_id)
        .await
    {
        Ok(outcome) => ActionResponse::success(outcome),
        Err(err) => ActionResponse::failure(err),
    }
}

pub async fn handle_available_actions<S: ShipmentStore>(
    query: &QuerySurface<S>,
    chat_id: i64,
    role: Role,
) -> Result<AvailableActionsResponse, ApiError> {
    query
        .available_actions(chat_id, role)
        .await
        .map(|actions| AvailableActionsResponse { chat_id, actions })
        .map_err(|err| ApiError {
            code: err.code(),
            message: err.to_string(),
        })
}

pub async fn handle_timeline<S: ShipmentStore>(
    query: &QuerySurface<S>,
    chat_id: i64,
    limit: usize,
) -> Result<TimelineResponse, ApiError> {
    query
        .timeline(chat_id, limit)
        .await
        .map(|entries| TimelineResponse { chat_id, entries })
        .map_err(|err| ApiError {
            code: err.code(),
            message: err.to_string(),
        })
}
