//! In-process transition metrics.
//!
//! Counters keyed by action, error kind, and (from, to) pair, plus
//! duration and dwell-time histograms. Recording is best-effort: it never
//! fails, never blocks a transition's outcome, and the snapshot degrades
//! to zeroed stats when nothing has been recorded yet.

pub mod alerts;

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use crate::model::{Action, Status};

pub use alerts::{AlertEngine, AlertRule, AlertSeverity, TriggeredAlert};

const MAX_SAMPLES: usize = 4096;

#[derive(Debug, Default)]
struct Histogram {
    count: u64,
    sum: f64,
    samples: Vec<f64>,
    cursor: usize,
}

impl Histogram {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        if self.samples.len() < MAX_SAMPLES {
            self.samples.push(value);
        } else {
            // Ring overwrite keeps percentiles tracking recent behavior.
            self.samples[self.cursor] = value;
            self.cursor = (self.cursor + 1) % MAX_SAMPLES;
        }
    }

    fn stats(&self) -> HistogramStats {
        if self.count == 0 {
            return HistogramStats::default();
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        HistogramStats {
            count: self.count,
            avg: self.sum / self.count as f64,
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        }
    }
}

fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (quantile * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistogramStats {
    pub count: u64,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Structured stats snapshot, serializable for the JSON exporter and
/// consumed by the alert rule engine.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub actions_total: u64,
    pub errors_total: u64,
    pub actions: BTreeMap<String, u64>,
    pub errors: BTreeMap<String, u64>,
    pub transitions: BTreeMap<String, u64>,
    pub duration_ms: BTreeMap<String, HistogramStats>,
    pub dwell_seconds: BTreeMap<String, HistogramStats>,
}

impl MetricsSnapshot {
    /// Share of rejected or failed executions over everything attempted.
    pub fn error_rate(&self) -> f64 {
        let attempts = self.actions_total + self.errors_total;
        if attempts == 0 {
            0.0
        } else {
            self.errors_total as f64 / attempts as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct EngineMetrics {
    actions: Mutex<HashMap<Action, u64>>,
    errors: Mutex<HashMap<&'static str, u64>>,
    transitions: Mutex<HashMap<(Status, Status), u64>>,
    durations: Mutex<HashMap<Action, Histogram>>,
    dwell: Mutex<HashMap<Status, Histogram>>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_action(&self, action: Action) {
        if let Ok(mut counters) = self.actions.lock() {
            *counters.entry(action).or_insert(0) += 1;
        }
    }

    pub fn record_error(&self, code: &'static str) {
        if let Ok(mut counters) = self.errors.lock() {
            *counters.entry(code).or_insert(0) += 1;
        }
    }

    pub fn record_transition(&self, from: Status, to: Status) {
        if let Ok(mut counters) = self.transitions.lock() {
            *counters.entry((from, to)).or_insert(0) += 1;
        }
    }

    pub fn record_duration(&self, action: Action, elapsed: Duration) {
        if let Ok(mut histograms) = self.durations.lock() {
            histograms
                .entry(action)
                .or_default()
                .record(elapsed.as_secs_f64() * 1000.0);
        }
    }

    /// Time the shipment spent in `status` before leaving it.
    pub fn record_dwell(&self, status: Status, dwell: Duration) {
        if let Ok(mut histograms) = self.dwell.lock() {
            histograms.entry(status).or_default().record(dwell.as_secs_f64());
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::default();

        if let Ok(counters) = self.actions.lock() {
            for (action, count) in counters.iter() {
                snapshot.actions_total += count;
                snapshot.actions.insert(action.as_str().to_string(), *count);
            }
        }
        if let Ok(counters) = self.errors.lock() {
            for (code, count) in counters.iter() {
                snapshot.errors_total += count;
                snapshot.errors.insert((*code).to_string(), *count);
            }
        }
        if let Ok(counters) = self.transitions.lock() {
            for ((from, to), count) in counters.iter() {
                snapshot.transitions.insert(format!("{from}->{to}"), *count);
            }
        }
        if let Ok(histograms) = self.durations.lock() {
            for (action, histogram) in histograms.iter() {
                snapshot
                    .duration_ms
                    .insert(action.as_str().to_string(), histogram.stats());
            }
        }
        if let Ok(histograms) = self.dwell.lock() {
            for (status, histogram) in histograms.iter() {
                snapshot
                    .dwell_seconds
                    .insert(status.as_str().to_string(), histogram.stats());
            }
        }

        snapshot
    }

    /// Prometheus text exposition rendering, pulled on demand.
    pub fn render_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = String::new();

        out.push_str("# TYPE shipflow_actions_total counter\n");
        for (action, count) in &snapshot.actions {
            out.push_str(&format!(
                "shipflow_actions_total{{action=\"{action}\"}} {count}\n"
            ));
        }

        out.push_str("# TYPE shipflow_errors_total counter\n");
        for (code, count) in &snapshot.errors {
            out.push_str(&format!("shipflow_errors_total{{kind=\"{code}\"}} {count}\n"));
        }

        out.push_str("# TYPE shipflow_transitions_total counter\n");
        for (pair, count) in &snapshot.transitions {
            if let Some((from, to)) = pair.split_once("->") {
                out.push_str(&format!(
                    "shipflow_transitions_total{{from=\"{from}\",to=\"{to}\"}} {count}\n"
                ));
            }
        }

        out.push_str("# TYPE shipflow_transition_duration_ms summary\n");
        for (action, stats) in &snapshot.duration_ms {
            for (quantile, value) in [("0.5", stats.p50), ("0.95", stats.p95), ("0.99", stats.p99)]
            {
                out.push_str(&format!(
                    "shipflow_transition_duration_ms{{action=\"{action}\",quantile=\"{quantile}\"}} {value}\n"
                ));
            }
            out.push_str(&format!(
                "shipflow_transition_duration_ms_count{{action=\"{action}\"}} {}\n",
                stats.count
            ));
        }

        out.push_str("# TYPE shipflow_status_dwell_seconds summary\n");
        for (status, stats) in &snapshot.dwell_seconds {
            for (quantile, value) in [("0.5", stats.p50), ("0.95", stats.p95), ("0.99", stats.p99)]
            {
                out.push_str(&format!(
                    "shipflow_status_dwell_seconds{{status=\"{status}\",quantile=\"{quantile}\"}} {value}\n"
                ));
            }
            out.push_str(&format!(
                "shipflow_status_dwell_seconds_count{{status=\"{status}\"}} {}\n",
                stats.count
            ));
        }

        out
    }
}
