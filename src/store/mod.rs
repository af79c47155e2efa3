//! Persistence collaborator interface.
//!
//! The engine never talks to a database directly; it hands the store one
//! `TransitionWriteSet` describing the complete transaction (action row,
//! optional audit row + status update + sequenced system message, and the
//! side-effect fan-out) and the store applies it atomically. The store
//! MUST reject the write-set with `StoreError::Conflict` when the
//! shipment's status no longer matches `expected_from_status`; that check
//! is what prevents two concurrent transitions from both succeeding off a
//! stale read.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{Action, Status};
use crate::payload::{ActionPayload, ParcelSpec};

pub use memory::MemoryStore;

/// What kind of chat an id refers to. The engine only governs shipments;
/// acting on any other kind is a wrong-entity-type error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatKind {
    Shipment,
    Support,
}

/// Current persisted state of a shipment chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub chat_id: i64,
    pub kind: ChatKind,
    pub status: Status,
    /// When the shipment entered its current status; feeds dwell-time
    /// metrics and is reset by every status change.
    pub status_changed_at: DateTime<Utc>,
    /// Child shipments attached for consolidation.
    pub children: Vec<i64>,
}

/// Immutable audit row, written only when the status actually changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentTransition {
    pub id: i64,
    pub chat_id: i64,
    pub from_status: Status,
    pub to_status: Status,
    pub actor_user_id: i64,
    pub reason: String,
    pub meta: Value,
    pub created_at: DateTime<Utc>,
}

/// Immutable action row, written for every accepted action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsAction {
    pub id: i64,
    pub chat_id: i64,
    pub action: Action,
    pub actor_user_id: i64,
    pub payload: ActionPayload,
    pub created_at: DateTime<Utc>,
}

pub const SYSTEM_MESSAGE_KIND: &str = "system";

/// Sequenced entry in a chat's message timeline. `seq` is strictly
/// increasing and gap-free per chat, computed as max+1 inside the same
/// transaction that writes the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub chat_id: i64,
    pub seq: i64,
    pub kind: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// Domain side-effect writes executed inside the transition transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOp {
    /// Replace the parcel configuration for a chat.
    UpsertParcels {
        chat_id: i64,
        parcels: Vec<ParcelSpec>,
    },
    /// Mark every parcel of a chat as sealed (packing completed).
    SealParcels { chat_id: i64 },
    /// Link a child shipment to a consolidation chat.
    AttachChild {
        parent_chat_id: i64,
        child_chat_id: i64,
    },
    /// Bulk-move attached children that sit in one of `from` into `to`.
    PromoteChildren {
        parent_chat_id: i64,
        from: Vec<Status>,
        to: Status,
    },
}

/// Status mutation part of a write-set, present only when the transition
/// actually changes status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub to_status: Status,
    pub reason: String,
    pub message_payload: Value,
}

/// Everything one accepted action persists, applied atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionWriteSet {
    pub chat_id: i64,
    pub expected_from_status: Status,
    pub action: Action,
    pub actor_user_id: i64,
    pub payload: ActionPayload,
    pub status_change: Option<StatusChange>,
    pub effects: Vec<EffectOp>,
}

/// Ids and rows produced by a committed write-set.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedTransition {
    pub action_id: i64,
    pub audit_id: Option<i64>,
    pub system_message: Option<SystemMessage>,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("chat {0} not found")]
    NotFound(i64),
    #[error("concurrent transition on chat {chat_id}: expected status {expected}, found {actual}")]
    Conflict {
        chat_id: i64,
        expected: Status,
        actual: Status,
    },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Transactional persistence collaborator.
///
/// Implementations must provide at least read-committed isolation for
/// `apply_transition` and must enforce the `expected_from_status` conflict
/// check; audit, action, and message rows are append-only.
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    async fn load_shipment(&self, chat_id: i64) -> Result<Option<ShipmentRecord>, StoreError>;

    /// Apply the whole write-set as one transaction: all rows and status
    /// mutations commit together or not at all.
    async fn apply_transition(
        &self,
        write: TransitionWriteSet,
    ) -> Result<CommittedTransition, StoreError>;

    /// Transition history for a chat, newest first, truncated to `limit`.
    async fn transition_history(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<ShipmentTransition>, StoreError>;

    /// Action history for a chat, newest first, truncated to `limit`.
    async fn action_history(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<LogisticsAction>, StoreError>;
}
