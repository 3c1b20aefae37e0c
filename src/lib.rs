// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod cli;
pub mod config;
pub mod contract;
pub mod density;
pub mod error;
pub mod metrics;
pub mod report;
pub mod request;
pub mod settings;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use tracing::info;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AnalyzerConfig;
pub use crate::density::{analyze, AnalysisResult, KeywordMatcher};
pub use crate::report::{DensityBand, KeywordReport};

use crate::settings::{JsonFileStore, Settings};

/// Full application router from env/file configuration.
pub fn app() -> anyhow::Result<Router> {
    let cfg = AnalyzerConfig::load()?;
    build_app(&cfg)
}

/// Router with file-backed settings at `cfg.settings.path` and `/metrics` mounted.
pub fn build_app(cfg: &AnalyzerConfig) -> anyhow::Result<Router> {
    let store = JsonFileStore::open(&cfg.settings.path)?;
    let settings = Settings::new(Arc::new(store));
    info!(
        caution_threshold = cfg.density.caution_threshold,
        settings_path = %cfg.settings.path.display(),
        summary = ?settings.summary(),
        "analyzer configured"
    );

    let state = AppState::new(settings, cfg);
    let metrics = crate::metrics::Metrics::init()?;
    Ok(api::router(state).merge(metrics.router()))
}
