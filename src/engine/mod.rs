//! Transactional transition execution.

pub mod effects;
pub mod executor;
pub mod idempotency;
pub mod messages;
pub mod types;

pub use effects::{EffectContext, EffectRegistry, SideEffect};
pub use executor::{Actor, TransitionEngine};
pub use idempotency::{IdempotencyCache, IdempotencyKey};
pub use types::{EngineError, TransitionOutcome};
