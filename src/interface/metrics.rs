//! Prometheus metrics exporter

use crate::domain::shared::error::BridgeError;
use crate::domain::shared::result::Result;
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use tracing::info;

/// Install the exporter with a scrape endpoint on `listen`.
///
/// Must be called from within the tokio runtime.
pub fn init_metrics(listen: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(listen)
        .set_buckets_for_metric(
            Matcher::Full("lexgate_synthesis_duration_seconds".to_string()),
            &[0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0],
        )
        .map_err(|e| BridgeError::Config(e.to_string()))?
        .install()
        .map_err(|e| BridgeError::Config(format!("metrics exporter on {}: {}", listen, e)))?;

    describe_metrics();
    info!("Prometheus metrics exported on http://{}/metrics", listen);
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "lexgate_sessions_started_total",
        "Inbound calls for which a bot session was attempted"
    );
    describe_counter!(
        "lexgate_sessions_failed_total",
        "Sessions that failed to reach the media server or bridge the caller"
    );
    describe_gauge!(
        "lexgate_active_sessions",
        "Sessions bridged to the bot and not yet torn down"
    );
    describe_counter!(
        "lexgate_playbacks_total",
        "Prompts played into calls, by source"
    );
    describe_counter!(
        "lexgate_dtmf_forwarded_total",
        "Caller keypresses forwarded to the bot"
    );
    describe_counter!(
        "lexgate_engine_command_failures_total",
        "Endpoint commands that returned an error"
    );
    describe_counter!(
        "lexgate_synthesis_failures_total",
        "Prompts that could not be synthesized"
    );
    describe_histogram!(
        "lexgate_synthesis_duration_seconds",
        Unit::Seconds,
        "Time to synthesize one prompt"
    );
}
