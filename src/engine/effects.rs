//! Pluggable domain side effects.
//!
//! Effects compute the extra write operations an action contributes to the
//! transition's write-set; the store executes them inside the same
//! transaction as the status change. New actions register effects here
//! without touching the executor core.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Action, Status};
use crate::payload::ActionPayload;
use crate::store::{EffectOp, ShipmentRecord};

/// Inputs available to an effect when it computes its write operations.
pub struct EffectContext<'a> {
    pub shipment: &'a ShipmentRecord,
    pub payload: &'a ActionPayload,
    pub from_status: Status,
    pub to_status: Status,
}

pub trait SideEffect: Send + Sync {
    fn ops(&self, ctx: &EffectContext<'_>) -> Vec<EffectOp>;
}

#[derive(Default)]
pub struct EffectRegistry {
    effects: HashMap<Action, Arc<dyn SideEffect>>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in logistics effects wired up.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Action::PackConfigure, Arc::new(ParcelUpsert));
        registry.register(Action::PackComplete, Arc::new(ParcelSeal));
        registry.register(Action::MergeAttach, Arc::new(ChildAttach));
        registry.register(Action::MergeComplete, Arc::new(ChildPromotion));
        registry
    }

    pub fn register(&mut self, action: Action, effect: Arc<dyn SideEffect>) {
        self.effects.insert(action, effect);
    }

    pub fn ops_for(&self, action: Action, ctx: &EffectContext<'_>) -> Vec<EffectOp> {
        self.effects
            .get(&action)
            .map(|effect| effect.ops(ctx))
            .unwrap_or_default()
    }
}

/// `pack.configure`: replace the chat's parcel configuration.
struct ParcelUpsert;

impl SideEffect for ParcelUpsert {
    fn ops(&self, ctx: &EffectContext<'_>) -> Vec<EffectOp> {
        match ctx.payload {
            ActionPayload::PackConfigure { parcels } => vec![EffectOp::UpsertParcels {
                chat_id: ctx.shipment.chat_id,
                parcels: parcels.clone(),
            }],
            _ => Vec::new(),
        }
    }
}

/// `pack.complete`: seal the configured parcels.
struct ParcelSeal;

impl SideEffect for ParcelSeal {
    fn ops(&self, ctx: &EffectContext<'_>) -> Vec<EffectOp> {
        vec![EffectOp::SealParcels {
            chat_id: ctx.shipment.chat_id,
        }]
    }
}

/// `merge.attach`: link the child shipment to the consolidation chat.
struct ChildAttach;

impl SideEffect for ChildAttach {
    fn ops(&self, ctx: &EffectContext<'_>) -> Vec<EffectOp> {
        match ctx.payload {
            ActionPayload::MergeAttach { child_chat_id } => vec![EffectOp::AttachChild {
                parent_chat_id: ctx.shipment.chat_id,
                child_chat_id: *child_chat_id,
            }],
            _ => Vec::new(),
        }
    }
}

/// `merge.complete`: move every finalized child into transit together with
/// the consolidation chat itself.
struct ChildPromotion;

impl SideEffect for ChildPromotion {
    fn ops(&self, ctx: &EffectContext<'_>) -> Vec<EffectOp> {
        // Finalized means packed or merged; earlier statuses and terminal
        // children stay where they are.
        vec![EffectOp::PromoteChildren {
            parent_chat_id: ctx.shipment.chat_id,
            from: vec![Status::Pack, Status::Merge],
            to: Status::InTransit,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::ParcelSpec;
    use crate::store::ChatKind;
    use chrono::Utc;

    fn shipment(status: Status) -> ShipmentRecord {
        ShipmentRecord {
            chat_id: 10,
            kind: ChatKind::Shipment,
            status,
            status_changed_at: Utc::now(),
            children: vec![11, 12],
        }
    }

    #[test]
    fn pack_configure_produces_parcel_upsert() {
        let registry = EffectRegistry::with_defaults();
        let shipment = shipment(Status::Pack);
        let payload = ActionPayload::PackConfigure {
            parcels: vec![ParcelSpec {
                label: "box-1".to_string(),
                weight_kg: 1.5,
                items: vec![],
            }],
        };
        let ops = registry.ops_for(
            Action::PackConfigure,
            &EffectContext {
                shipment: &shipment,
                payload: &payload,
                from_status: Status::Pack,
                to_status: Status::Pack,
            },
        );
        assert!(
            matches!(&ops[..], [EffectOp::UpsertParcels { chat_id: 10, parcels }] if parcels.len() == 1)
        );
    }

    #[test]
    fn unregistered_actions_have_no_ops() {
        let registry = EffectRegistry::with_defaults();
        let shipment = shipment(Status::New);
        let payload = ActionPayload::ReceiveFull { note: None };
        let ops = registry.ops_for(
            Action::ReceiveFull,
            &EffectContext {
                shipment: &shipment,
                payload: &payload,
                from_status: Status::New,
                to_status: Status::Receive,
            },
        );
        assert!(ops.is_empty());
    }

    #[test]
    fn merge_complete_promotes_merged_children() {
        let registry = EffectRegistry::with_defaults();
        let shipment = shipment(Status::Merge);
        let payload = ActionPayload::MergeComplete { note: None };
        let ops = registry.ops_for(
            Action::MergeComplete,
            &EffectContext {
                shipment: &shipment,
                payload: &payload,
                from_status: Status::Merge,
                to_status: Status::InTransit,
            },
        );
        assert_eq!(
            ops,
            vec![EffectOp::PromoteChildren {
                parent_chat_id: 10,
                from: vec![Status::Pack, Status::Merge],
                to: Status::InTransit,
            }]
        );
    }
}
