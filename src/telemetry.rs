use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Initialize tracing with JSON output for structured logging.
/// This provides the correlation IDs and structured data needed to follow
/// a transition end to end across the executor and the store.
pub fn init_telemetry() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("shipflow telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with common transition attributes
pub fn create_transition_span(
    chat_id: i64,
    action: &str,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "shipment_transition",
        chat.id = chat_id,
        transition.action = action,
        correlation.id = correlation_id,
    )
}
