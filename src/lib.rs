// Shipflow - shipment transition engine
// Finite-state workflow over shipment chats: validation, transactional
// execution, idempotent retries, and transition metrics.

pub mod api;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod model;
pub mod payload;
pub mod query;
pub mod store;
pub mod telemetry;
pub mod validator;

// Re-export key types for easy access
pub use api::{ActionRequest, ActionResponse, ApiError};
pub use config::{AlertThresholds, EngineConfig, ShipflowConfig};
pub use engine::{Actor, EngineError, TransitionEngine, TransitionOutcome};
pub use metrics::{AlertEngine, EngineMetrics, MetricsSnapshot, TriggeredAlert};
pub use model::{allowed_roles, available_actions, next_status, Action, Role, Status};
pub use payload::{ActionPayload, PayloadError};
pub use query::{ActionDescriptor, QuerySurface, TimelineEntry};
pub use store::{MemoryStore, ShipmentStore, StoreError, TransitionWriteSet};
pub use telemetry::{generate_correlation_id, init_telemetry};
pub use validator::{check, TransitionCheckError};
