//! Threshold-based alert rules evaluated over a metrics snapshot.

use serde::Serialize;

use crate::config::AlertThresholds;

use super::MetricsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// A named boolean predicate over the snapshot.
pub struct AlertRule {
    pub name: String,
    pub severity: AlertSeverity,
    pub description: String,
    predicate: Box<dyn Fn(&MetricsSnapshot) -> bool + Send + Sync>,
}

impl AlertRule {
    pub fn new(
        name: impl Into<String>,
        severity: AlertSeverity,
        description: impl Into<String>,
        predicate: impl Fn(&MetricsSnapshot) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            severity,
            description: description.into(),
            predicate: Box::new(predicate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggeredAlert {
    pub name: String,
    pub severity: AlertSeverity,
    pub description: String,
}

pub struct AlertEngine {
    rules: Vec<AlertRule>,
}

impl AlertEngine {
    pub fn new(rules: Vec<AlertRule>) -> Self {
        Self { rules }
    }

    /// Built-in rule set parameterized by configured thresholds.
    pub fn with_defaults(thresholds: &AlertThresholds) -> Self {
        let max_error_rate = thresholds.max_error_rate;
        let max_dwell = thresholds.max_receive_dwell_seconds;
        let max_p95 = thresholds.max_execute_p95_ms;

        Self::new(vec![
            AlertRule::new(
                "action_error_rate",
                AlertSeverity::High,
                format!(
                    "error share of attempted actions exceeds {:.0}%",
                    max_error_rate * 100.0
                ),
                move |snapshot| {
                    snapshot.errors_total > 0 && snapshot.error_rate() > max_error_rate
                },
            ),
            AlertRule::new(
                "receive_dwell_p95",
                AlertSeverity::Medium,
                format!("p95 dwell time in RECEIVE exceeds {max_dwell:.0}s"),
                move |snapshot| {
                    snapshot
                        .dwell_seconds
                        .get("RECEIVE")
                        .is_some_and(|stats| stats.count > 0 && stats.p95 > max_dwell)
                },
            ),
            AlertRule::new(
                "execute_duration_p95",
                AlertSeverity::Medium,
                format!("p95 execute duration exceeds {max_p95:.0}ms for some action"),
                move |snapshot| {
                    snapshot
                        .duration_ms
                        .values()
                        .any(|stats| stats.count > 0 && stats.p95 > max_p95)
                },
            ),
        ])
    }

    /// Evaluate every rule; returns the currently triggered ones.
    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> Vec<TriggeredAlert> {
        let mut triggered = Vec::new();
        for rule in &self.rules {
            if (rule.predicate)(snapshot) {
                tracing::warn!(
                    alert.name = %rule.name,
                    alert.severity = ?rule.severity,
                    "alert rule triggered"
                );
                triggered.push(TriggeredAlert {
                    name: rule.name.clone(),
                    severity: rule.severity,
                    description: rule.description.clone(),
                });
            }
        }
        triggered
    }
}
