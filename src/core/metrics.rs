use std::sync::OnceLock;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

const QUERY_DURATION: &str = "report_query_duration_seconds";
const QUERY_FAILURES: &str = "report_query_failures_total";

/// Seconds; spans a local PostgreSQL query up to a slow cross-region REST page.
const QUERY_DURATION_BUCKETS: [f64; 12] =
    [0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 10.0];

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = builder()?.install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(QUERY_DURATION.to_string()), &QUERY_DURATION_BUCKETS)
}

/// Snapshot printed after the summary; `None` unless `PROMETHEUS_ENABLED`.
pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_query(source: &'static str, report: &'static str, elapsed: Duration) {
    metrics::histogram!(QUERY_DURATION, "source" => source, "report" => report)
        .record(elapsed.as_secs_f64());
}

pub(crate) fn record_failure(source: &'static str, report: &'static str) {
    metrics::counter!(QUERY_FAILURES, "source" => source, "report" => report).increment(1);
}
