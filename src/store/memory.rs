//! In-memory reference store.
//!
//! Conformant implementation of `ShipmentStore` used in tests and as the
//! reference for the transactional contract: one mutex guards all
//! tables, so a write-set either applies in full or not at all, the
//! expected-status conflict check runs under the same lock as the status
//! update, and message sequence numbers are max+1 within that critical
//! section.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::model::Status;
use crate::payload::ParcelSpec;

use super::{
    ChatKind, CommittedTransition, EffectOp, LogisticsAction, ShipmentRecord, ShipmentStore,
    ShipmentTransition, StoreError, SystemMessage, TransitionWriteSet, SYSTEM_MESSAGE_KIND,
};

/// Parcel row kept per chat; `sealed` flips when packing completes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelRecord {
    pub spec: ParcelSpec,
    pub sealed: bool,
}

#[derive(Debug, Default)]
struct Tables {
    shipments: HashMap<i64, ShipmentRecord>,
    transitions: Vec<ShipmentTransition>,
    actions: Vec<LogisticsAction>,
    messages: Vec<SystemMessage>,
    parcels: HashMap<i64, Vec<ParcelRecord>>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn next_seq(&self, chat_id: i64) -> i64 {
        self.messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| m.seq)
            .max()
            .unwrap_or(0)
            + 1
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a shipment chat in the given status.
    pub fn seed(&self, chat_id: i64, kind: ChatKind, status: Status) {
        self.seed_with_children(chat_id, kind, status, Vec::new());
    }

    pub fn seed_with_children(
        &self,
        chat_id: i64,
        kind: ChatKind,
        status: Status,
        children: Vec<i64>,
    ) {
        let mut tables = self.lock();
        tables.shipments.insert(
            chat_id,
            ShipmentRecord {
                chat_id,
                kind,
                status,
                status_changed_at: Utc::now(),
                children,
            },
        );
    }

    pub fn shipment(&self, chat_id: i64) -> Option<ShipmentRecord> {
        self.lock().shipments.get(&chat_id).cloned()
    }

    pub fn system_messages(&self, chat_id: i64) -> Vec<SystemMessage> {
        self.lock()
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub fn parcels(&self, chat_id: i64) -> Vec<ParcelRecord> {
        self.lock()
            .parcels
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // Poisoning only happens if a panicking test held the lock; the
        // tables are still structurally valid.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ShipmentStore for MemoryStore {
    async fn load_shipment(&self, chat_id: i64) -> Result<Option<ShipmentRecord>, StoreError> {
        Ok(self.lock().shipments.get(&chat_id).cloned())
    }

    async fn apply_transition(
        &self,
        write: TransitionWriteSet,
    ) -> Result<CommittedTransition, StoreError> {
        let mut tables = self.lock();

        // All checks first: nothing below may fail once mutation starts.
        let current = tables
            .shipments
            .get(&write.chat_id)
            .ok_or(StoreError::NotFound(write.chat_id))?
            .status;
        if current != write.expected_from_status {
            return Err(StoreError::Conflict {
                chat_id: write.chat_id,
                expected: write.expected_from_status,
                actual: current,
            });
        }

        let committed_at = Utc::now();

        let action_id = tables.next_id();
        tables.actions.push(LogisticsAction {
            id: action_id,
            chat_id: write.chat_id,
            action: write.action,
            actor_user_id: write.actor_user_id,
            payload: write.payload.clone(),
            created_at: committed_at,
        });

        let mut audit_id = None;
        let mut system_message = None;
        if let Some(change) = &write.status_change {
            let id = tables.next_id();
            tables.transitions.push(ShipmentTransition {
                id,
                chat_id: write.chat_id,
                from_status: write.expected_from_status,
                to_status: change.to_status,
                actor_user_id: write.actor_user_id,
                reason: change.reason.clone(),
                meta: serde_json::json!({
                    "action": write.action,
                    "payload": write.payload,
                }),
                created_at: committed_at,
            });
            audit_id = Some(id);

            if let Some(shipment) = tables.shipments.get_mut(&write.chat_id) {
                shipment.status = change.to_status;
                shipment.status_changed_at = committed_at;
            }

            let seq = tables.next_seq(write.chat_id);
            let message = SystemMessage {
                chat_id: write.chat_id,
                seq,
                kind: SYSTEM_MESSAGE_KIND.to_string(),
                payload: change.message_payload.clone(),
                created_at: committed_at,
            };
            tables.messages.push(message.clone());
            system_message = Some(message);
        }

        for effect in &write.effects {
            match effect {
                EffectOp::UpsertParcels { chat_id, parcels } => {
                    let records = parcels
                        .iter()
                        .cloned()
                        .map(|spec| ParcelRecord { spec, sealed: false })
                        .collect();
                    tables.parcels.insert(*chat_id, records);
                }
                EffectOp::SealParcels { chat_id } => {
                    if let Some(records) = tables.parcels.get_mut(chat_id) {
                        for record in records {
                            record.sealed = true;
                        }
                    }
                }
                EffectOp::AttachChild {
                    parent_chat_id,
                    child_chat_id,
                } => {
                    if let Some(parent) = tables.shipments.get_mut(parent_chat_id) {
                        if !parent.children.contains(child_chat_id) {
                            parent.children.push(*child_chat_id);
                        }
                    }
                }
                EffectOp::PromoteChildren {
                    parent_chat_id,
                    from,
                    to,
                } => {
                    let children = tables
                        .shipments
                        .get(parent_chat_id)
                        .map(|p| p.children.clone())
                        .unwrap_or_default();
                    for child_id in children {
                        if let Some(child) = tables.shipments.get_mut(&child_id) {
                            if from.contains(&child.status) {
                                child.status = *to;
                                child.status_changed_at = committed_at;
                            }
                        }
                    }
                }
            }
        }

        Ok(CommittedTransition {
            action_id,
            audit_id,
            system_message,
            committed_at,
        })
    }

    async fn transition_history(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<ShipmentTransition>, StoreError> {
        let mut rows: Vec<_> = self
            .lock()
            .transitions
            .iter()
            .filter(|t| t.chat_id == chat_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn action_history(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<LogisticsAction>, StoreError> {
        let mut rows: Vec<_> = self
            .lock()
            .actions
            .iter()
            .filter(|a| a.chat_id == chat_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        Ok(rows)
    }
}
