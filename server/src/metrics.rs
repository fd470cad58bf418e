//! Billing metrics.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `billing_webhooks_total{provider,outcome}` - Webhook deliveries by result
//! - `billing_reconciliations_total{outcome}` - Reconciliation outcomes (webhooks and verify redirect)
//! - `billing_day_pass_merges_total{merged}` - Merge attempts at sign-in

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Metrics setup errors.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Bind address did not parse.
    #[error("invalid metrics address: {0}")]
    Address(String),

    /// The exporter could not be installed.
    #[error("failed to install metrics exporter: {0}")]
    Install(String),
}

/// Register all metric descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_metrics() {
    describe_counter!(
        "billing_webhooks_total",
        "Webhook deliveries by provider and outcome (applied, day_pass_granted, unchanged, dropped, failed, ignored, rejected)"
    );
    describe_counter!(
        "billing_reconciliations_total",
        "Canonical payment events reconciled, by outcome"
    );
    describe_counter!(
        "billing_day_pass_merges_total",
        "Day pass merge attempts at sign-in, by whether a pass was merged"
    );

    tracing::info!("Billing metrics registered");
}

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from inside the Tokio runtime.
///
/// # Errors
///
/// Returns error if the address does not parse or the exporter cannot be installed.
pub fn install_exporter(address: &str) -> Result<(), MetricsError> {
    let addr: SocketAddr = address
        .parse()
        .map_err(|_| MetricsError::Address(address.to_string()))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    register_metrics();
    tracing::info!(%addr, "Metrics server started - available at http://{}/metrics", addr);
    Ok(())
}

/// Record one webhook delivery.
pub fn record_webhook(provider: &'static str, outcome: &'static str) {
    metrics::counter!("billing_webhooks_total", "provider" => provider, "outcome" => outcome)
        .increment(1);
}

/// Record one reconciliation outcome.
pub fn record_reconciliation(outcome: &'static str) {
    metrics::counter!("billing_reconciliations_total", "outcome" => outcome).increment(1);
}

/// Record one merge attempt.
pub fn record_merge(merged: bool) {
    let merged = if merged { "true" } else { "false" };
    metrics::counter!("billing_day_pass_merges_total", "merged" => merged).increment(1);
}
