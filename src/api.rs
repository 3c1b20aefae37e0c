// src/api.rs
//! HTTP surface: keyword analysis, article contract checks, templates and settings.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::AnalyzerConfig;
use crate::contract::{
    parse_article, parse_grounded, GeneratedArticle, GroundedAnswer, Source, TemplateConfig,
};
use crate::error::{ContractError, SettingsError};
use crate::metrics;
use crate::report::{KeywordReport, DEFAULT_CAUTION_THRESHOLD};
use crate::settings::{SavedTemplate, Settings, SettingsSummary};
use crate::telemetry::{anon_hash, dev_logging_enabled};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub caution_threshold: f64,
}

impl AppState {
    pub fn new(settings: Settings, cfg: &AnalyzerConfig) -> Self {
        Self {
            settings,
            caution_threshold: cfg.density.caution_threshold,
        }
    }

    /// In-memory settings and default thresholds; used by tests and demos.
    pub fn ephemeral() -> Self {
        Self {
            settings: Settings::in_memory(),
            caution_threshold: DEFAULT_CAUTION_THRESHOLD,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze))
        .route("/analyze/article", post(analyze_article))
        .route("/analyze/batch", post(analyze_batch))
        .route("/grounding/sources", post(grounding_sources))
        .route("/templates", get(list_templates).post(save_template))
        .route("/templates/{id}", delete(delete_template))
        .route("/settings", get(settings_summary))
        .route("/settings/api-key", put(set_api_key).delete(clear_api_key))
        .route("/admin/reload-settings", post(reload_settings))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/* ----------------------------
Errors
---------------------------- */

#[derive(Debug)]
pub enum ApiError {
    Contract(ContractError),
    Settings(SettingsError),
    NotFound(String),
    /// Request body missing, not JSON, or the wrong shape.
    BadBody(JsonRejection),
}

/// `Json` extractor whose rejection is an `ApiError`, so malformed bodies get
/// the same `{ error, message }` shape as every other failure.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadBody(e)
    }
}

impl From<ContractError> for ApiError {
    fn from(e: ContractError) -> Self {
        ApiError::Contract(e)
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        ApiError::Settings(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Contract(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "upstream_contract_violation",
                e.to_string(),
            ),
            ApiError::Settings(SettingsError::Invalid(m)) => {
                (StatusCode::BAD_REQUEST, "invalid_input", m)
            }
            ApiError::Settings(e) => {
                warn!(error = %e, "settings storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "settings_storage",
                    e.to_string(),
                )
            }
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, "not_found", what),
            ApiError::BadBody(e) => (StatusCode::BAD_REQUEST, "invalid_input", e.body_text()),
        };
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

/* ----------------------------
Analysis
---------------------------- */

#[derive(Deserialize)]
struct AnalyzeReq {
    text: String,
    keyword: String,
}

#[derive(Serialize)]
struct AnalyzeResp {
    analyzed: bool,
    #[serde(flatten)]
    report: Option<KeywordReport>,
}

/// Scores one pair and records metrics/dev logs. `None` for a blank keyword.
fn score(text: &str, keyword: &str, caution_threshold: f64) -> Option<KeywordReport> {
    let started = Instant::now();
    let report = KeywordReport::score(text, keyword, caution_threshold);
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    metrics::record_analysis(report.is_some(), elapsed_ms);

    if dev_logging_enabled() {
        // Never log raw text. Only hashed id + figures.
        let id = anon_hash(text);
        match &report {
            Some(r) => info!(
                target: "density",
                %id,
                words = r.total_words,
                occurrences = r.occurrence_count,
                density = %r.density_display,
                band = ?r.band,
                elapsed_ms,
                "scored"
            ),
            None => info!(target: "density", %id, "skipped: blank keyword"),
        }
    }
    report
}

async fn analyze(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AnalyzeReq>,
) -> Json<AnalyzeResp> {
    let report = score(&body.text, &body.keyword, state.caution_threshold);
    Json(AnalyzeResp {
        analyzed: report.is_some(),
        report,
    })
}

#[derive(Deserialize)]
struct ArticleReq {
    /// Raw model output (JSON string) or an already-decoded object.
    article: Value,
    #[serde(default)]
    keyword: Option<String>,
}

#[derive(Serialize)]
struct ArticleResp {
    h1_title: String,
    url_slug_suggestion: String,
    faq_count: usize,
    analyzed: bool,
    #[serde(flatten)]
    report: Option<KeywordReport>,
}

async fn analyze_article(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ArticleReq>,
) -> Result<Json<ArticleResp>, ApiError> {
    let parsed = match body.article {
        Value::String(raw) => parse_article(&raw),
        other => GeneratedArticle::from_value(other),
    };
    let article = parsed.inspect_err(|e| {
        metrics::record_contract_violation();
        warn!(error = %e, "article rejected");
    })?;

    let keyword = body
        .keyword
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| article.seo_metadata.primary_keyword_focus.clone());
    let report = score(
        &article.article_content.body_markdown,
        &keyword,
        state.caution_threshold,
    );

    Ok(Json(ArticleResp {
        h1_title: article.article_content.h1_title,
        url_slug_suggestion: article.seo_metadata.url_slug_suggestion,
        faq_count: article.article_content.faq_section.len(),
        analyzed: report.is_some(),
        report,
    }))
}

#[derive(Deserialize)]
struct BatchItem {
    id: String,
    text: String,
    keyword: String,
}

#[derive(Serialize)]
struct BatchOut {
    id: String,
    result: Option<KeywordReport>,
}

async fn analyze_batch(
    State(state): State<AppState>,
    ApiJson(items): ApiJson<Vec<BatchItem>>,
) -> Json<Vec<BatchOut>> {
    let out = items
        .into_iter()
        .map(|it| BatchOut {
            result: score(&it.text, &it.keyword, state.caution_threshold),
            id: it.id,
        })
        .collect::<Vec<_>>();
    Json(out)
}

#[derive(Deserialize)]
struct GroundedReq {
    /// Raw grounded answer JSON (string) or an already-decoded object.
    response: Value,
}

#[derive(Serialize)]
struct GroundedResp {
    text: String,
    sources: Vec<Source>,
}

async fn grounding_sources(
    ApiJson(body): ApiJson<GroundedReq>,
) -> Result<Json<GroundedResp>, ApiError> {
    let parsed = match body.response {
        Value::String(raw) => parse_grounded(&raw),
        other => GroundedAnswer::from_value(other),
    };
    let answer = parsed.inspect_err(|e| {
        metrics::record_contract_violation();
        warn!(error = %e, "grounded answer rejected");
    })?;
    Ok(Json(GroundedResp {
        sources: answer.sources(),
        text: answer.text,
    }))
}

/* ----------------------------
Templates & settings
---------------------------- */

async fn list_templates(State(state): State<AppState>) -> Json<Vec<SavedTemplate>> {
    Json(state.settings.templates())
}

#[derive(Deserialize)]
struct SaveTemplateReq {
    name: String,
    config: TemplateConfig,
}

async fn save_template(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SaveTemplateReq>,
) -> Result<(StatusCode, Json<SavedTemplate>), ApiError> {
    let tpl = state.settings.save_template(&body.name, body.config)?;
    Ok((StatusCode::CREATED, Json(tpl)))
}

async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.settings.delete_template(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("template '{id}'")))
    }
}

async fn settings_summary(State(state): State<AppState>) -> Json<SettingsSummary> {
    Json(state.settings.summary())
}

#[derive(Deserialize)]
struct ApiKeyReq {
    api_key: String,
}

async fn set_api_key(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ApiKeyReq>,
) -> Result<Json<SettingsSummary>, ApiError> {
    state.settings.set_api_key(&body.api_key)?;
    Ok(Json(state.settings.summary()))
}

async fn clear_api_key(State(state): State<AppState>) -> Result<Json<SettingsSummary>, ApiError> {
    state.settings.clear_api_key()?;
    Ok(Json(state.settings.summary()))
}

async fn reload_settings(State(state): State<AppState>) -> Result<Json<SettingsSummary>, ApiError> {
    state.settings.reload()?;
    info!("settings reloaded on request");
    Ok(Json(state.settings.summary()))
}
