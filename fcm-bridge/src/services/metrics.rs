//! Metrics for fcm-bridge.
//!
//! A single Prometheus recorder backs both the HTTP middleware counters from
//! `service-core` and the bridge's own send counters.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Outcome label for `fcm_bridge_send_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Relayed,
    Unauthorized,
    MissingFields,
    InvalidBody,
    Failed,
}

impl SendOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendOutcome::Relayed => "relayed",
            SendOutcome::Unauthorized => "unauthorized",
            SendOutcome::MissingFields => "missing_fields",
            SendOutcome::InvalidBody => "invalid_body",
            SendOutcome::Failed => "failed",
        }
    }
}

/// Install the global Prometheus recorder. Call once, from `main`.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("Metrics already initialized"))?;

    Ok(())
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_send(outcome: SendOutcome) {
    counter!("fcm_bridge_send_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_upstream_status(status: u16) {
    counter!("fcm_bridge_upstream_responses_total", "status" => status.to_string()).increment(1);
}
