//! Process-local idempotency cache.
//!
//! Keyed by `(chat_id, action, client_id)`, holding the full committed
//! outcome for five minutes so client retries with the same `client_id`
//! are answered without re-executing side effects. The cache is advisory:
//! a restart loses it, and the conflict check in the store still protects
//! correctness. For multi-instance deployments this would move to a shared
//! keyed store with the same contract.

use std::time::Duration;

use moka::future::Cache;

use crate::model::Action;

use super::types::TransitionOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    pub chat_id: i64,
    pub action: Action,
    pub client_id: String,
}

pub struct IdempotencyCache {
    cache: Cache<IdempotencyKey, TransitionOutcome>,
}

impl IdempotencyCache {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    pub async fn get(&self, key: &IdempotencyKey) -> Option<TransitionOutcome> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: IdempotencyKey, outcome: TransitionOutcome) {
        self.cache.insert(key, outcome).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use chrono::Utc;

    fn outcome() -> TransitionOutcome {
        TransitionOutcome {
            chat_id: 1,
            action: Action::ReceiveFull,
            from_status: Status::New,
            to_status: Status::Receive,
            status_changed: true,
            system_message: None,
            audit_id: Some(5),
            action_id: 4,
            committed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn replay_returns_the_cached_outcome() {
        let cache = IdempotencyCache::new(Duration::from_secs(300), 16);
        let key = IdempotencyKey {
            chat_id: 1,
            action: Action::ReceiveFull,
            client_id: "client-a".to_string(),
        };
        assert!(cache.get(&key).await.is_none());

        let stored = outcome();
        cache.insert(key.clone(), stored.clone()).await;
        assert_eq!(cache.get(&key).await, Some(stored));

        // A different client id is a different request.
        let other = IdempotencyKey {
            client_id: "client-b".to_string(),
            ..key
        };
        assert!(cache.get(&other).await.is_none());
    }
}
