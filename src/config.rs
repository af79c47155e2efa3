use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for shipflow.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShipflowConfig {
    /// Transition engine settings
    pub engine: EngineConfig,
    /// Alert rule thresholds
    pub alerts: AlertThresholds,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Global feature switch: when false the engine is fully inert and
    /// every write operation short-circuits with a disabled error.
    pub enabled: bool,
    /// Idempotency cache time-to-live in seconds
    pub idempotency_ttl_seconds: u64,
    /// Idempotency cache entry capacity
    pub idempotency_capacity: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertThresholds {
    /// Maximum tolerated error share of total actions (0.05 = 5%)
    pub max_error_rate: f64,
    /// Maximum tolerated p95 dwell time in RECEIVE, seconds
    pub max_receive_dwell_seconds: f64,
    /// Maximum tolerated p95 execute duration, milliseconds
    pub max_execute_p95_ms: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Enable tracing subscriber initialization
    pub tracing_enabled: bool,
    /// Log level
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            idempotency_ttl_seconds: 300, // 5 minutes
            idempotency_capacity: 10_000,
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            max_error_rate: 0.05,
            max_receive_dwell_seconds: 3600.0, // 1 hour
            max_execute_p95_ms: 2000.0,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            tracing_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl Default for ShipflowConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            alerts: AlertThresholds::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ShipflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (shipflow.toml)
    /// 3. Environment variables (prefixed with SHIPFLOW_)
    ///
    /// The result is constructed and injected into the engine; there is no
    /// global configuration instance.
    pub fn load() -> Result<Self> {
        let defaults = ShipflowConfig::default();
        let mut builder = Config::builder()
            .set_default("engine.enabled", defaults.engine.enabled)?
            .set_default(
                "engine.idempotency_ttl_seconds",
                defaults.engine.idempotency_ttl_seconds,
            )?
            .set_default(
                "engine.idempotency_capacity",
                defaults.engine.idempotency_capacity,
            )?
            .set_default("alerts.max_error_rate", defaults.alerts.max_error_rate)?
            .set_default(
                "alerts.max_receive_dwell_seconds",
                defaults.alerts.max_receive_dwell_seconds,
            )?
            .set_default("alerts.max_execute_p95_ms", defaults.alerts.max_execute_p95_ms)?
            .set_default(
                "observability.tracing_enabled",
                defaults.observability.tracing_enabled,
            )?
            .set_default("observability.log_level", defaults.observability.log_level)?;

        if Path::new("shipflow.toml").exists() {
            builder = builder.add_source(File::with_name("shipflow"));
        }

        // Double underscore keeps multi-word keys addressable, e.g.
        // SHIPFLOW_ENGINE__IDEMPOTENCY_TTL_SECONDS.
        builder = builder.add_source(
            Environment::with_prefix("SHIPFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
