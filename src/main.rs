//! SEO Article Analyzer: binary entrypoint
//! Boots the Axum HTTP server with file-backed settings and Prometheus metrics.

use shuttle_axum::ShuttleAxum;

use seo_article_analyzer::{build_app, telemetry, AnalyzerConfig};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // No-op when the runtime already installed a subscriber.
    telemetry::init_tracing();

    let cfg = AnalyzerConfig::load()?;
    let router = build_app(&cfg)?;

    Ok(router.into())
}
