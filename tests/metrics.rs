// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use seo_article_analyzer::{build_app, AnalyzerConfig};

// Build full in-process app (includes /metrics).
fn build(dir: &TempDir) -> Router {
    let mut cfg = AnalyzerConfig::default();
    cfg.settings.path = dir.path().join("settings.json");
    build_app(&cfg).expect("build_app should build Router in tests")
}

async fn post(app: &Router, uri: &str, body: &'static str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn analyses_show_up_in_exposition() {
    let dir = TempDir::new().unwrap();
    let app = build(&dir);

    assert_eq!(
        post(&app, "/analyze", r#"{"text":"seo tips for seo","keyword":"seo"}"#).await,
        StatusCode::OK
    );
    assert_eq!(
        post(&app, "/analyze", r#"{"text":"seo tips","keyword":"  "}"#).await,
        StatusCode::OK
    );
    assert_eq!(
        post(&app, "/analyze/article", r#"{"article":"{}"}"#).await,
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let m = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(m.status(), StatusCode::OK);
    let body = body::to_bytes(m.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "keyword_analyses_total",
        "keyword_analyses_skipped_total",
        "keyword_analysis_duration_ms",
        "upstream_contract_violations_total",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
