//! Prometheus metrics for the orchestrator.
//!
//! All metrics are aggregated in the [`Metrics`] struct.

use action::{ActionKind, ErrorCategory};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Which observer established that a call took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detector {
    /// Direct path: the receipt arrived
    Receipt,
    /// The watcher saw the effect while the direct path was pending
    Watcher,
    /// The watcher saw the effect after the submission timed out
    FollowUp,
}

impl Detector {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Watcher => "watcher",
            Self::FollowUp => "follow_up",
        }
    }
}

/// Aggregated metrics for the orchestrator.
///
/// Descriptions are registered with the global registry on creation. Without
/// an installed recorder every call is a no-op.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Monitor loop
        describe_counter!(
            "orchestrator_cycles_total",
            "Total number of balance monitor cycles executed"
        );
        describe_counter!(
            "orchestrator_cycles_failure_total",
            "Total number of failed balance monitor cycles"
        );
        describe_histogram!(
            "orchestrator_cycle_duration_seconds",
            "Duration of each balance monitor cycle in seconds"
        );

        // Actions
        describe_counter!(
            "orchestrator_actions_started_total",
            "Actions started, by kind"
        );
        describe_counter!(
            "orchestrator_actions_success_total",
            "Actions that reached Success, by kind"
        );
        describe_counter!(
            "orchestrator_actions_failure_total",
            "Actions that reached Error, by kind and error category"
        );
        describe_counter!(
            "orchestrator_actions_busy_total",
            "Actions refused because one of the same kind was running"
        );
        describe_histogram!(
            "orchestrator_action_duration_seconds",
            "Time from start to terminal phase, by kind"
        );
        describe_counter!(
            "orchestrator_ambiguous_timeouts_total",
            "Submissions that hit the deadline without a definitive outcome"
        );
        describe_counter!(
            "orchestrator_effect_detections_total",
            "Effects observed, by kind and observer"
        );

        // Balances (gauges - current values)
        describe_gauge!(
            "orchestrator_underlying_balance",
            "Owner's underlying token balance"
        );
        describe_gauge!("orchestrator_vault_balance", "Owner's vault balance");
        describe_gauge!(
            "orchestrator_native_balance_wei",
            "Owner's native balance in wei"
        );
        describe_gauge!("orchestrator_total_debt", "Aggregate vault deposits");
    }

    /// Record a completed monitor cycle.
    pub fn record_cycle(&self, success: bool, duration: Duration) {
        counter!("orchestrator_cycles_total").increment(1);
        histogram!("orchestrator_cycle_duration_seconds").record(duration.as_secs_f64());

        if !success {
            counter!("orchestrator_cycles_failure_total").increment(1);
        }
    }

    pub fn record_action_started(&self, kind: ActionKind) {
        counter!("orchestrator_actions_started_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn record_action_success(&self, kind: ActionKind, duration: Duration) {
        counter!("orchestrator_actions_success_total", "kind" => kind.as_str()).increment(1);
        histogram!("orchestrator_action_duration_seconds", "kind" => kind.as_str())
            .record(duration.as_secs_f64());
    }

    pub fn record_action_failure(
        &self,
        kind: ActionKind,
        category: ErrorCategory,
        duration: Duration,
    ) {
        counter!(
            "orchestrator_actions_failure_total",
            "kind" => kind.as_str(),
            "category" => category.as_str()
        )
        .increment(1);
        histogram!("orchestrator_action_duration_seconds", "kind" => kind.as_str())
            .record(duration.as_secs_f64());
    }

    pub fn record_action_busy(&self, kind: ActionKind) {
        counter!("orchestrator_actions_busy_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn record_ambiguous_timeout(&self, kind: ActionKind) {
        counter!("orchestrator_ambiguous_timeouts_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn record_detection(&self, kind: ActionKind, detector: Detector) {
        counter!(
            "orchestrator_effect_detections_total",
            "kind" => kind.as_str(),
            "observer" => detector.as_str()
        )
        .increment(1);
    }

    /// Set the owner's balances, in token units.
    pub fn set_balances(&self, underlying: f64, vault: f64) {
        gauge!("orchestrator_underlying_balance").set(underlying);
        gauge!("orchestrator_vault_balance").set(vault);
    }

    pub fn set_native_balance(&self, balance_wei: f64) {
        gauge!("orchestrator_native_balance_wei").set(balance_wei);
    }

    pub fn set_total_debt(&self, total_debt: f64) {
        gauge!("orchestrator_total_debt").set(total_debt);
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
