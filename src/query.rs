//! Read-only query surface over the store and the transition graph.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::EngineError;
use crate::model::{self, Action, Role, Status};
use crate::store::{ChatKind, LogisticsAction, ShipmentStore, ShipmentTransition};

/// One action a caller may perform right now, with UI affordances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub action: Action,
    pub label: String,
    pub to_status: Status,
}

/// Audit and action rows interleaved into one chat timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum TimelineEntry {
    Transition(ShipmentTransition),
    Action(LogisticsAction),
}

impl TimelineEntry {
    fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        match self {
            TimelineEntry::Transition(row) => row.created_at,
            TimelineEntry::Action(row) => row.created_at,
        }
    }
}

pub struct QuerySurface<S> {
    store: Arc<S>,
}

impl<S: ShipmentStore> QuerySurface<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn shipment(&self, chat_id: i64) -> Result<crate::store::ShipmentRecord, EngineError> {
        let shipment = self
            .store
            .load_shipment(chat_id)
            .await
            .map_err(|err| {
                tracing::error!(chat.id = chat_id, error = %err, "failed to load shipment");
                EngineError::Internal
            })?
            .ok_or(EngineError::NotFound { chat_id })?;
        if shipment.kind != ChatKind::Shipment {
            return Err(EngineError::WrongEntityType { chat_id });
        }
        Ok(shipment)
    }

    /// Actions the given role may perform on the chat in its current
    /// status. No-status-change actions are excluded, matching the graph's
    /// listing behavior.
    pub async fn available_actions(
        &self,
        chat_id: i64,
        role: Role,
    ) -> Result<Vec<ActionDescriptor>, EngineError> {
        let shipment = self.shipment(chat_id).await?;
        let descriptors = model::available_actions(shipment.status, role)
            .into_iter()
            .filter_map(|action| {
                model::next_status(shipment.status, action).map(|to_status| ActionDescriptor {
                    action,
                    label: action.label().to_string(),
                    to_status,
                })
            })
            .collect();
        Ok(descriptors)
    }

    pub async fn transition_history(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<ShipmentTransition>, EngineError> {
        self.shipment(chat_id).await?;
        self.store
            .transition_history(chat_id, limit)
            .await
            .map_err(|err| {
                tracing::error!(chat.id = chat_id, error = %err, "transition history query failed");
                EngineError::Internal
            })
    }

    pub async fn action_history(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<LogisticsAction>, EngineError> {
        self.shipment(chat_id).await?;
        self.store
            .action_history(chat_id, limit)
            .await
            .map_err(|err| {
                tracing::error!(chat.id = chat_id, error = %err, "action history query failed");
                EngineError::Internal
            })
    }

    /// Merged timeline of audit and action rows, newest first.
    pub async fn timeline(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<TimelineEntry>, EngineError> {
        let transitions = self.transition_history(chat_id, limit).await?;
        let actions = self.action_history(chat_id, limit).await?;

        let mut entries: Vec<TimelineEntry> = transitions
            .into_iter()
            .map(TimelineEntry::Transition)
            .chain(actions.into_iter().map(TimelineEntry::Action))
            .collect();
        entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        entries.truncate(limit);
        Ok(entries)
    }
}
