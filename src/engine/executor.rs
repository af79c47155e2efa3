//! Orchestration core: one `execute` call is one unit of work.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::Instrument;

use crate::config::EngineConfig;
use crate::metrics::EngineMetrics;
use crate::model::{next_status, Action, Role};
use crate::payload;
use crate::store::{ChatKind, ShipmentStore, StatusChange, TransitionWriteSet};
use crate::telemetry;
use crate::validator;

use super::effects::{EffectContext, EffectRegistry};
use super::idempotency::{IdempotencyCache, IdempotencyKey};
use super::messages;
use super::types::{EngineError, TransitionOutcome};

/// Externally authenticated caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

pub struct TransitionEngine<S> {
    store: Arc<S>,
    metrics: Arc<EngineMetrics>,
    effects: EffectRegistry,
    idempotency: IdempotencyCache,
    enabled: bool,
}

impl<S: ShipmentStore> TransitionEngine<S> {
    pub fn new(store: Arc<S>, config: &EngineConfig) -> Self {
        Self::with_parts(
            store,
            config,
            Arc::new(EngineMetrics::new()),
            EffectRegistry::with_defaults(),
        )
    }

    /// Constructor taking explicit collaborators; used when metrics are
    /// shared with an exporter or when extra side effects are registered.
    pub fn with_parts(
        store: Arc<S>,
        config: &EngineConfig,
        metrics: Arc<EngineMetrics>,
        effects: EffectRegistry,
    ) -> Self {
        Self {
            store,
            metrics,
            effects,
            idempotency: IdempotencyCache::new(
                Duration::from_secs(config.idempotency_ttl_seconds),
                config.idempotency_capacity,
            ),
            enabled: config.enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// Execute one action against a shipment chat.
    ///
    /// Validation and permission failures are rejected before any
    /// persistence write; accepted actions persist their full write-set in
    /// one store transaction. A committed outcome is cached under
    /// `(chat_id, action, client_id)` so retries within the cache TTL are
    /// answered verbatim without re-executing side effects.
    pub async fn execute(
        &self,
        chat_id: i64,
        action: Action,
        raw_payload: &Value,
        actor: &Actor,
        client_id: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        if !self.enabled {
            return Err(EngineError::Disabled);
        }

        let key = IdempotencyKey {
            chat_id,
            action,
            client_id: client_id.to_string(),
        };
        if let Some(cached) = self.idempotency.get(&key).await {
            tracing::debug!(
                chat.id = chat_id,
                transition.action = %action,
                client.id = client_id,
                "idempotent replay served from cache"
            );
            return Ok(cached);
        }

        let correlation_id = telemetry::generate_correlation_id();
        let span = telemetry::create_transition_span(chat_id, action.as_str(), &correlation_id);
        let outcome = self
            .run(chat_id, action, raw_payload, actor)
            .instrument(span)
            .await?;

        self.idempotency.insert(key, outcome.clone()).await;
        Ok(outcome)
    }

    async fn run(
        &self,
        chat_id: i64,
        action: Action,
        raw_payload: &Value,
        actor: &Actor,
    ) -> Result<TransitionOutcome, EngineError> {
        let started = Instant::now();

        let shipment = self.store.load_shipment(chat_id).await.map_err(|err| {
            tracing::error!(chat.id = chat_id, error = %err, "failed to load shipment");
            self.metrics.record_error("internal-error");
            EngineError::Internal
        })?;
        let Some(shipment) = shipment else {
            return Err(EngineError::NotFound { chat_id });
        };
        if shipment.kind != ChatKind::Shipment {
            return Err(EngineError::WrongEntityType { chat_id });
        }

        if let Err(err) = validator::check(shipment.status, action, actor.role) {
            let err = EngineError::from(err);
            self.metrics.record_error(err.code());
            tracing::warn!(
                chat.id = chat_id,
                transition.action = %action,
                actor.role = %actor.role,
                error = %err,
                "transition rejected"
            );
            return Err(err);
        }

        let validated = match payload::validate(action, raw_payload) {
            Ok(validated) => validated,
            Err(err) => {
                let err = EngineError::PayloadInvalid(err);
                self.metrics.record_error(err.code());
                tracing::warn!(
                    chat.id = chat_id,
                    transition.action = %action,
                    error = %err,
                    "payload rejected"
                );
                return Err(err);
            }
        };

        let from_status = shipment.status;
        // The validator already proved the pair is legal.
        let to_status = next_status(from_status, action).ok_or(EngineError::Internal)?;
        let status_changed = to_status != from_status;

        let status_change = status_changed.then(|| StatusChange {
            to_status,
            reason: messages::derive_reason(&validated),
            message_payload: messages::system_payload(action, from_status, to_status, &validated),
        });
        let effects = self.effects.ops_for(
            action,
            &EffectContext {
                shipment: &shipment,
                payload: &validated,
                from_status,
                to_status,
            },
        );

        let write = TransitionWriteSet {
            chat_id,
            expected_from_status: from_status,
            action,
            actor_user_id: actor.user_id,
            payload: validated,
            status_change,
            effects,
        };
        let committed = match self.store.apply_transition(write).await {
            Ok(committed) => committed,
            Err(err) => {
                // Full context stays in the log; callers get an opaque
                // internal error that is safe to retry with the same
                // client id.
                tracing::error!(
                    chat.id = chat_id,
                    transition.action = %action,
                    actor.user_id = actor.user_id,
                    error = %err,
                    "transition transaction failed"
                );
                self.metrics.record_error("internal-error");
                return Err(EngineError::Internal);
            }
        };

        self.metrics.record_action(action);
        self.metrics.record_duration(action, started.elapsed());
        if status_changed {
            self.metrics.record_transition(from_status, to_status);
            let dwell = committed
                .committed_at
                .signed_duration_since(shipment.status_changed_at);
            if let Ok(dwell) = dwell.to_std() {
                self.metrics.record_dwell(from_status, dwell);
            }
        }

        tracing::info!(
            chat.id = chat_id,
            transition.action = %action,
            transition.from = %from_status,
            transition.to = %to_status,
            transition.changed = status_changed,
            duration_ms = started.elapsed().as_millis() as u64,
            "transition committed"
        );

        Ok(TransitionOutcome {
            chat_id,
            action,
            from_status,
            to_status,
            status_changed,
            system_message: committed.system_message,
            audit_id: committed.audit_id,
            action_id: committed.action_id,
            committed_at: committed.committed_at,
        })
    }
}
