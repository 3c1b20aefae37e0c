// src/contract/article.rs
//! Generated SEO article shape and the configuration it is requested with.

use serde::{Deserialize, Serialize};

use super::{decode, decode_value, require_non_blank};
use crate::error::ContractError;

/* ----------------------------
Request side
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SearchIntent {
    #[default]
    Informational,
    Commercial,
    Transactional,
    Navigational,
}

/// Everything the article is generated from. JSON uses camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleConfig {
    pub main_keyword: String,
    #[serde(default)]
    pub article_title: Option<String>,
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub search_intent: SearchIntent,
    #[serde(default = "default_tone")]
    pub tone_of_voice: String,
    #[serde(default = "default_true")]
    pub include_images: bool,
    #[serde(default = "default_word_count")]
    pub word_count: u32,
    #[serde(default = "default_readability")]
    pub readability_level: String,
}

fn default_tone() -> String {
    "Opinionated Expert (20+ Years Exp)".to_string()
}
fn default_true() -> bool {
    true
}
fn default_word_count() -> u32 {
    1500
}
fn default_readability() -> String {
    "8th or 9th grade".to_string()
}

impl Default for ArticleConfig {
    fn default() -> Self {
        Self {
            main_keyword: String::new(),
            article_title: None,
            target_url: String::new(),
            brand_name: String::new(),
            search_intent: SearchIntent::default(),
            tone_of_voice: default_tone(),
            include_images: true,
            word_count: default_word_count(),
            readability_level: default_readability(),
        }
    }
}

impl ArticleConfig {
    /// Overwrite everything a template carries; keyword and title stay.
    pub fn apply_template(&mut self, t: &TemplateConfig) {
        self.target_url = t.target_url.clone();
        self.brand_name = t.brand_name.clone();
        self.search_intent = t.search_intent;
        self.tone_of_voice = t.tone_of_voice.clone();
        self.include_images = t.include_images;
        self.word_count = t.word_count;
        self.readability_level = t.readability_level.clone();
    }
}

/// Reusable part of an `ArticleConfig` (no keyword, no title).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub search_intent: SearchIntent,
    #[serde(default = "default_tone")]
    pub tone_of_voice: String,
    #[serde(default = "default_true")]
    pub include_images: bool,
    #[serde(default = "default_word_count")]
    pub word_count: u32,
    #[serde(default = "default_readability")]
    pub readability_level: String,
}

impl From<&ArticleConfig> for TemplateConfig {
    fn from(c: &ArticleConfig) -> Self {
        Self {
            target_url: c.target_url.clone(),
            brand_name: c.brand_name.clone(),
            search_intent: c.search_intent,
            tone_of_voice: c.tone_of_voice.clone(),
            include_images: c.include_images,
            word_count: c.word_count,
            readability_level: c.readability_level.clone(),
        }
    }
}

/* ----------------------------
Response side (all fields required)
---------------------------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub seo_metadata: SeoMetadata,
    pub article_content: ArticleContent,
    pub media_suggestions: Vec<MediaSuggestion>,
    pub internal_linking_suggestions: Vec<InternalLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoMetadata {
    pub meta_title: String,
    pub meta_description: String,
    pub url_slug_suggestion: String,
    pub primary_keyword_focus: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleContent {
    pub h1_title: String,
    /// Markdown bullet list of key takeaways.
    pub snippet_bait: String,
    pub body_markdown: String,
    pub faq_section: Vec<FaqItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSuggestion {
    pub placement: String,
    pub image_prompt: String,
    pub alt_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalLink {
    pub anchor_text: String,
    pub target_page_context: String,
    pub reason: String,
}

/// Decode and validate raw model output.
pub fn parse_article(raw: &str) -> Result<GeneratedArticle, ContractError> {
    let article: GeneratedArticle = decode(raw)?;
    article.validate()?;
    Ok(article)
}

impl GeneratedArticle {
    /// Same as `parse_article`, for an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ContractError> {
        let article: GeneratedArticle = decode_value(value)?;
        article.validate()?;
        Ok(article)
    }

    /// Schema checks serde cannot express: the parts we score and show must have content.
    pub fn validate(&self) -> Result<(), ContractError> {
        require_non_blank("article_content.h1_title", &self.article_content.h1_title)?;
        require_non_blank(
            "article_content.body_markdown",
            &self.article_content.body_markdown,
        )?;
        Ok(())
    }

    /// Plain-text export: title, meta, takeaways, body, FAQ.
    pub fn full_text(&self) -> String {
        let c = &self.article_content;
        let m = &self.seo_metadata;
        let faq = c
            .faq_section
            .iter()
            .map(|f| format!("### {}\n{}", f.question, f.answer))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "# {}\n\n**Meta Title**: {}\n**Meta Description**: {}\n\n## Key Takeaways\n{}\n\n---\n\n{}\n\n---\n\n## Frequently Asked Questions\n\n{}",
            c.h1_title, m.meta_title, m.meta_description, c.snippet_bait, c.body_markdown, faq
        )
        .trim()
        .to_string()
    }
}
