//! Metrics and alerting integration tests
//!
//! Exercise the recording surface through real engine executions, then the
//! snapshot, Prometheus rendering, and alert rule evaluation on top of it.
//!
//! Test coverage:
//! - Executions feed action/transition counters and duration histograms
//! - Prometheus text carries every family with the recorded labels
//! - Snapshot JSON-serializes for the pull exporter
//! - Alert rules fire on error rate and p95 duration, stay quiet otherwise

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use shipflow::config::{AlertThresholds, EngineConfig};
use shipflow::engine::{Actor, TransitionEngine};
use shipflow::metrics::{AlertEngine, AlertSeverity, EngineMetrics};
use shipflow::model::{Action, Role, Status};
use shipflow::store::{ChatKind, MemoryStore};

fn admin() -> Actor {
    Actor {
        user_id: 1,
        role: Role::Admin,
    }
}

#[tokio::test]
async fn executions_populate_counters_and_histograms() {
    let store = Arc::new(MemoryStore::new());
    store.seed(1, ChatKind::Shipment, Status::New);
    store.seed(2, ChatKind::Shipment, Status::New);
    let engine = TransitionEngine::new(Arc::clone(&store), &EngineConfig::default());

    engine
        .execute(1, Action::ReceiveFull, &json!({}), &admin(), "a-1")
        .await
        .unwrap();
    engine
        .execute(2, Action::ReceiveFull, &json!({}), &admin(), "a-2")
        .await
        .unwrap();
    engine
        .execute(1, Action::Cancel, &json!({}), &admin(), "a-3")
        .await
        .unwrap_err();

    let snapshot = engine.metrics().snapshot();
    assert_eq!(snapshot.actions["receive.full"], 2);
    assert_eq!(snapshot.actions_total, 2);
    assert_eq!(snapshot.errors_total, 1);
    assert_eq!(snapshot.transitions["NEW->RECEIVE"], 2);

    let durations = &snapshot.duration_ms["receive.full"];
    assert_eq!(durations.count, 2);
    assert!(durations.p95 >= 0.0);

    // NEW was left twice, so its dwell histogram has two samples.
    assert_eq!(snapshot.dwell_seconds["NEW"].count, 2);
}

#[tokio::test]
async fn prometheus_text_reflects_recorded_executions() {
    let store = Arc::new(MemoryStore::new());
    store.seed(1, ChatKind::Shipment, Status::OnDelivery);
    let engine = TransitionEngine::new(Arc::clone(&store), &EngineConfig::default());

    engine
        .execute(
            1,
            Action::HandoverConfirm,
            &json!({"recipient": "B. Aruzhan"}),
            &Actor {
                user_id: 9,
                role: Role::User,
            },
            "h-1",
        )
        .await
        .unwrap();

    let text = engine.metrics().render_prometheus();
    assert!(text.contains("# TYPE shipflow_actions_total counter"));
    assert!(text.contains("shipflow_actions_total{action=\"handover.confirm\"} 1"));
    assert!(text.contains("shipflow_transitions_total{from=\"ON_DELIVERY\",to=\"DELIVERED\"} 1"));
    assert!(text.contains("shipflow_transition_duration_ms_count{action=\"handover.confirm\"} 1"));
    assert!(text.contains("shipflow_status_dwell_seconds_count{status=\"ON_DELIVERY\"} 1"));
}

#[test]
fn snapshot_serializes_for_the_json_exporter() {
    let metrics = EngineMetrics::new();
    metrics.record_action(Action::ReceiveFull);
    metrics.record_error("payload-invalid");
    metrics.record_duration(Action::ReceiveFull, Duration::from_millis(7));

    let value = serde_json::to_value(metrics.snapshot()).unwrap();
    assert_eq!(value["actions_total"], 1);
    assert_eq!(value["errors"]["payload-invalid"], 1);
    assert_eq!(value["duration_ms"]["receive.full"]["count"], 1);
}

#[test]
fn error_rate_rule_fires_after_a_run_of_failures() {
    let metrics = EngineMetrics::new();
    for _ in 0..9 {
        metrics.record_action(Action::ReceiveFull);
    }
    metrics.record_error("payload-invalid");

    let alerts = AlertEngine::with_defaults(&AlertThresholds::default());
    let triggered = alerts.evaluate(&metrics.snapshot());
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].name, "action_error_rate");
    assert_eq!(triggered[0].severity, AlertSeverity::High);
}

#[test]
fn slow_executions_trigger_the_duration_rule() {
    let metrics = EngineMetrics::new();
    for _ in 0..20 {
        metrics.record_duration(Action::PackComplete, Duration::from_millis(3500));
    }

    let alerts = AlertEngine::with_defaults(&AlertThresholds::default());
    let triggered = alerts.evaluate(&metrics.snapshot());
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].name, "execute_duration_p95");
}

#[test]
fn healthy_metrics_trigger_no_alerts() {
    let metrics = EngineMetrics::new();
    for _ in 0..100 {
        metrics.record_action(Action::ReceiveFull);
        metrics.record_duration(Action::ReceiveFull, Duration::from_millis(12));
    }
    metrics.record_error("not-found");

    let alerts = AlertEngine::with_defaults(&AlertThresholds::default());
    assert!(alerts.evaluate(&metrics.snapshot()).is_empty());
}
