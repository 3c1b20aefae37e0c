// src/settings/mod.rs
//! Process-wide user settings (API key, saved article templates) behind a small
//! key/value store with explicit get/set/clear and a reload trigger.

pub mod store;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::contract::{ArticleConfig, TemplateConfig};
use crate::error::SettingsError;

pub use store::{JsonFileStore, MemoryStore};

pub const KEY_API_KEY: &str = "gemini_api_key";
pub const KEY_TEMPLATES: &str = "seo_templates";
/// Used when no key has been stored.
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

pub type KeyUpdate<'a> =
    dyn FnMut(Option<Value>) -> Result<Option<Value>, SettingsError> + 'a;

pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn clear(&self, key: &str) -> Result<(), SettingsError>;
    /// Read-modify-write of one key under the store's write lock. `f` sees the
    /// current value and returns the new one (`None` removes the key). An error
    /// from `f` leaves the store untouched.
    fn update(&self, key: &str, f: &mut KeyUpdate<'_>) -> Result<(), SettingsError>;
    /// Re-read the backing storage, replacing what is held in memory.
    fn reload(&self) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTemplate {
    pub id: String,
    pub name: String,
    pub config: TemplateConfig,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Safe view for diagnostics and HTTP: never carries the key itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsSummary {
    pub has_api_key: bool,
    pub api_key_len: usize,
    pub template_count: usize,
}

/// Typed facade over a `ConfigStore`.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn ConfigStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn reload(&self) -> Result<(), SettingsError> {
        self.store.reload()
    }

    /* ---- API key ---- */

    /// Stored key, else `GEMINI_API_KEY`. Blank values count as absent.
    pub fn api_key(&self) -> Option<String> {
        let stored = self
            .store
            .get(KEY_API_KEY)
            .and_then(|v| v.as_str().map(str::trim).map(str::to_string))
            .filter(|k| !k.is_empty());
        stored.or_else(|| {
            std::env::var(ENV_API_KEY)
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })
    }

    /// Trimmed before storing; a blank key clears the stored one.
    pub fn set_api_key(&self, key: &str) -> Result<(), SettingsError> {
        let key = key.trim();
        if key.is_empty() {
            return self.clear_api_key();
        }
        self.store.set(KEY_API_KEY, Value::String(key.to_string()))?;
        info!(key_len = key.len(), "api key stored");
        Ok(())
    }

    pub fn clear_api_key(&self) -> Result<(), SettingsError> {
        self.store.clear(KEY_API_KEY)?;
        info!("api key cleared");
        Ok(())
    }

    /* ---- Templates ---- */

    /// Saved templates in insertion order. An unreadable stored value yields
    /// an empty list.
    pub fn templates(&self) -> Vec<SavedTemplate> {
        decode_templates(self.store.get(KEY_TEMPLATES))
    }

    pub fn save_template(
        &self,
        name: &str,
        config: TemplateConfig,
    ) -> Result<SavedTemplate, SettingsError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SettingsError::Invalid("template name is blank".into()));
        }

        let (tpl, count) = self.modify_templates(|all| {
            let now = Utc::now();
            let mut id = now.timestamp_millis();
            while all.iter().any(|t| t.id == id.to_string()) {
                id += 1;
            }
            let tpl = SavedTemplate {
                id: id.to_string(),
                name: name.to_string(),
                config,
                created_at: Some(now),
            };
            all.push(tpl.clone());
            (tpl, all.len())
        })?;
        info!(id = %tpl.id, count, "template saved");
        Ok(tpl)
    }

    /// `Ok(false)` when no template has that id.
    pub fn delete_template(&self, id: &str) -> Result<bool, SettingsError> {
        let (removed, count) = self.modify_templates(|all| {
            let before = all.len();
            all.retain(|t| t.id != id);
            (all.len() != before, all.len())
        })?;
        if removed {
            info!(%id, count, "template deleted");
        }
        Ok(removed)
    }

    /// Copy a template's fields into `config`; keyword and title stay.
    pub fn apply_template(&self, id: &str, config: &mut ArticleConfig) -> bool {
        match self.templates().into_iter().find(|t| t.id == id) {
            Some(t) => {
                config.apply_template(&t.config);
                true
            }
            None => false,
        }
    }

    pub fn summary(&self) -> SettingsSummary {
        let key = self.api_key();
        SettingsSummary {
            has_api_key: key.is_some(),
            api_key_len: key.map(|k| k.len()).unwrap_or(0),
            template_count: self.templates().len(),
        }
    }

    /// Runs `f` on the current list inside one store update, so concurrent
    /// saves and deletes never overwrite each other.
    fn modify_templates<R, F>(&self, f: F) -> Result<R, SettingsError>
    where
        F: FnOnce(&mut Vec<SavedTemplate>) -> R,
    {
        let mut f = Some(f);
        let mut out = None;
        self.store.update(
            KEY_TEMPLATES,
            &mut |current: Option<Value>| -> Result<Option<Value>, SettingsError> {
                let mut all = decode_templates(current);
                if let Some(f) = f.take() {
                    out = Some(f(&mut all));
                }
                Ok(Some(serde_json::to_value(&all)?))
            },
        )?;
        out.ok_or_else(|| SettingsError::Corrupt("template update was not applied".into()))
    }
}

fn decode_templates(raw: Option<Value>) -> Vec<SavedTemplate> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_value::<Vec<SavedTemplate>>(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "failed to parse saved templates");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::SearchIntent;
    use serde_json::json;
    use serial_test::serial;
    use std::collections::HashSet;

    fn tpl(brand: &str) -> TemplateConfig {
        let cfg = ArticleConfig {
            brand_name: brand.to_string(),
            search_intent: SearchIntent::Transactional,
            ..ArticleConfig::default()
        };
        TemplateConfig::from(&cfg)
    }

    #[test]
    #[serial]
    fn api_key_set_trim_and_clear() {
        std::env::remove_var(ENV_API_KEY);
        let s = Settings::in_memory();
        assert_eq!(s.api_key(), None);

        s.set_api_key("  abc123  ").unwrap();
        assert_eq!(s.api_key().as_deref(), Some("abc123"));
        assert_eq!(s.summary().api_key_len, 6);

        s.set_api_key("   ").unwrap();
        assert_eq!(s.api_key(), None);

        s.set_api_key("k").unwrap();
        s.clear_api_key().unwrap();
        assert!(!s.summary().has_api_key);
    }

    #[test]
    #[serial]
    fn api_key_falls_back_to_env() {
        std::env::set_var(ENV_API_KEY, "from-env");
        let s = Settings::in_memory();
        assert_eq!(s.api_key().as_deref(), Some("from-env"));
        s.set_api_key("stored").unwrap();
        assert_eq!(s.api_key().as_deref(), Some("stored"));
        std::env::remove_var(ENV_API_KEY);
    }

    #[test]
    fn templates_save_apply_delete() {
        let s = Settings::in_memory();
        assert!(s.templates().is_empty());

        let a = s.save_template(" Shop ", tpl("Acme")).unwrap();
        let b = s.save_template("Blog", tpl("Beta")).unwrap();
        assert_eq!(a.name, "Shop");
        assert_ne!(a.id, b.id);
        assert_eq!(s.templates().len(), 2);

        let mut cfg = ArticleConfig {
            main_keyword: "leather".into(),
            ..ArticleConfig::default()
        };
        assert!(s.apply_template(&b.id, &mut cfg));
        assert_eq!(cfg.brand_name, "Beta");
        assert_eq!(cfg.main_keyword, "leather");
        assert!(!s.apply_template("missing", &mut cfg));

        assert!(s.delete_template(&a.id).unwrap());
        assert!(!s.delete_template(&a.id).unwrap());
        let left = s.templates();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "Blog");
    }

    #[test]
    fn blank_template_name_is_rejected() {
        let s = Settings::in_memory();
        assert!(matches!(
            s.save_template("  ", tpl("x")),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn corrupt_templates_read_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(KEY_TEMPLATES, json!("garbage")).unwrap();
        let s = Settings::new(store);
        assert!(s.templates().is_empty());
        assert_eq!(s.summary().template_count, 0);
    }

    #[test]
    fn templates_written_by_the_browser_shape_load() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                KEY_TEMPLATES,
                json!([{
                    "id": "1700000000000",
                    "name": "Legacy",
                    "config": {
                        "targetUrl": "https://shop.example",
                        "brandName": "Shop",
                        "searchIntent": "Commercial",
                        "toneOfVoice": "Friendly",
                        "includeImages": false,
                        "wordCount": 800,
                        "readabilityLevel": "Grade 6"
                    }
                }]),
            )
            .unwrap();
        let s = Settings::new(store);
        let t = s.templates();
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].config.search_intent, SearchIntent::Commercial);
        assert_eq!(t[0].created_at, None);
    }

    fn save_concurrently(s: &Settings, threads: usize, per_thread: usize) {
        std::thread::scope(|scope| {
            for t in 0..threads {
                scope.spawn(move || {
                    for i in 0..per_thread {
                        s.save_template(&format!("t{t}-{i}"), tpl("Acme"))
                            .expect("save template");
                    }
                });
            }
        });
    }

    fn assert_all_kept(s: &Settings, expected: usize) {
        let all = s.templates();
        assert_eq!(all.len(), expected, "saves were lost");
        let ids = all.iter().map(|t| t.id.as_str()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), expected, "ids must be unique");
    }

    #[test]
    fn concurrent_saves_are_all_kept_in_memory() {
        let s = Settings::in_memory();
        save_concurrently(&s, 16, 20);
        assert_all_kept(&s, 320);

        let ids = s.templates().into_iter().map(|t| t.id).collect::<Vec<_>>();
        std::thread::scope(|scope| {
            for chunk in ids.chunks(40) {
                let s = &s;
                scope.spawn(move || {
                    for id in chunk {
                        assert!(s.delete_template(id).expect("delete template"));
                    }
                });
            }
        });
        assert!(s.templates().is_empty());
    }

    #[test]
    fn concurrent_saves_are_all_kept_on_disk() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("settings.json");
        let s = Settings::new(Arc::new(JsonFileStore::open(&path)?));
        save_concurrently(&s, 8, 10);
        assert_all_kept(&s, 80);

        let reopened = Settings::new(Arc::new(JsonFileStore::open(&path)?));
        assert_all_kept(&reopened, 80);
        Ok(())
    }
}
