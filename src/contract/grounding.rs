// src/contract/grounding.rs
//! Search- and maps-grounded answers: text plus the citations the model used.

use serde::{Deserialize, Serialize};

use super::{decode, decode_value, require_non_blank};
use crate::error::ContractError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundedAnswer {
    pub text: String,
    #[serde(default, alias = "grounding_chunks")]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<SourceRef>,
    #[serde(default)]
    pub maps: Option<SourceRef>,
}

/// Raw citation as it arrives; both fields are optional upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SourceRef {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    Maps,
}

/// Citation ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub kind: SourceKind,
    pub title: String,
    pub uri: String,
}

pub fn parse_grounded(raw: &str) -> Result<GroundedAnswer, ContractError> {
    let answer: GroundedAnswer = decode(raw)?;
    require_non_blank("text", &answer.text)?;
    Ok(answer)
}

impl GroundedAnswer {
    /// Same as `parse_grounded`, for an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ContractError> {
        let answer: GroundedAnswer = decode_value(value)?;
        require_non_blank("text", &answer.text)?;
        Ok(answer)
    }

    /// Deduplicated by URI, first-seen order. Chunks without a URI are skipped;
    /// a missing title falls back to the URI.
    pub fn sources(&self) -> Vec<Source> {
        let mut out: Vec<Source> = Vec::new();
        for chunk in &self.grounding_chunks {
            let candidates = [
                (SourceKind::Web, chunk.web.as_ref()),
                (SourceKind::Maps, chunk.maps.as_ref()),
            ];
            for (kind, r) in candidates {
                let Some(r) = r else { continue };
                let Some(uri) = r.uri.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
                    continue;
                };
                if out.iter().any(|s| s.uri == uri) {
                    continue;
                }
                let title = r
                    .title
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(uri);
                out.push(Source {
                    kind,
                    title: title.to_string(),
                    uri: uri.to_string(),
                });
            }
        }
        out
    }
}
