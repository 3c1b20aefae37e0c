// src/metrics.rs
use axum::{routing::get, Router};
use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const ANALYSES_TOTAL: &str = "keyword_analyses_total";
pub const ANALYSES_SKIPPED_TOTAL: &str = "keyword_analyses_skipped_total";
pub const ANALYSIS_DURATION_MS: &str = "keyword_analysis_duration_ms";
pub const CONTRACT_VIOLATIONS_TOTAL: &str = "upstream_contract_violations_total";

// The global recorder can only be installed once per process.
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (first call) and return a render handle.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One scored (text, keyword) pair, or a skip when the keyword was blank.
pub fn record_analysis(analyzed: bool, duration_ms: f64) {
    if analyzed {
        counter!(ANALYSES_TOTAL).increment(1);
        histogram!(ANALYSIS_DURATION_MS).record(duration_ms);
    } else {
        counter!(ANALYSES_SKIPPED_TOTAL).increment(1);
    }
}

pub fn record_contract_violation() {
    counter!(CONTRACT_VIOLATIONS_TOTAL).increment(1);
}
