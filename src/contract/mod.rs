// src/contract/mod.rs
//! Typed shapes of upstream model responses, plus the article configuration
//! they are generated from. Anything that does not fit is a `ContractError`.

pub mod article;
pub mod grounding;

pub use article::{
    parse_article, ArticleConfig, ArticleContent, FaqItem, GeneratedArticle, InternalLink,
    MediaSuggestion, SearchIntent, SeoMetadata, TemplateConfig,
};
pub use grounding::{parse_grounded, GroundedAnswer, GroundingChunk, Source, SourceKind, SourceRef};

use crate::error::ContractError;
use serde::de::DeserializeOwned;

/// Strict JSON decode: empty input and shape mismatches both become contract errors.
pub(crate) fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, ContractError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(ContractError::Empty);
    }
    serde_json::from_str(trimmed).map_err(|e| ContractError::Violation(e.to_string()))
}

/// Same as `decode`, for callers that already hold a JSON value.
pub(crate) fn decode_value<T: DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, ContractError> {
    if value.is_null() {
        return Err(ContractError::Empty);
    }
    serde_json::from_value(value).map_err(|e| ContractError::Violation(e.to_string()))
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), ContractError> {
    if value.trim().is_empty() {
        return Err(ContractError::Violation(format!("`{field}` is blank")));
    }
    Ok(())
}
