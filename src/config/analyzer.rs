// src/config/analyzer.rs
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};
use tracing::warn;

use crate::report::DEFAULT_CAUTION_THRESHOLD;

// --- env defaults & names ---
pub const DEFAULT_ANALYZER_CONFIG_PATH: &str = "config/analyzer.toml";
pub const DEFAULT_SETTINGS_PATH: &str = "state/settings.json";

pub const ENV_ANALYZER_CONFIG_PATH: &str = "ANALYZER_CONFIG_PATH";
pub const ENV_CAUTION_THRESHOLD: &str = "DENSITY_CAUTION_THRESHOLD";
pub const ENV_SETTINGS_PATH: &str = "SETTINGS_PATH";

fn default_caution_threshold() -> f64 {
    DEFAULT_CAUTION_THRESHOLD
}
fn default_settings_path() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_PATH)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DensitySection {
    /// Density (percent) above which a report is flagged as caution.
    #[serde(default = "default_caution_threshold")]
    pub caution_threshold: f64,
}

impl Default for DensitySection {
    fn default() -> Self {
        Self {
            caution_threshold: default_caution_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SettingsSection {
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub density: DensitySection,
    #[serde(default)]
    pub settings: SettingsSection,
}

impl AnalyzerConfig {
    /// Resolve the path from `ANALYZER_CONFIG_PATH` (or the default), load it,
    /// then apply env overrides. A missing file means defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var(ENV_ANALYZER_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ANALYZER_CONFIG_PATH));
        let mut cfg = Self::load_from_file(&path)?;
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read analyzer config at {}: {}", path.display(), e)
        })?;
        Self::from_toml_str(&data)
            .map_err(|e| anyhow::anyhow!("Invalid analyzer config at {}: {}", path.display(), e))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut cfg: AnalyzerConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// `DENSITY_CAUTION_THRESHOLD` and `SETTINGS_PATH` win over the file.
    pub fn apply_env(&mut self) {
        if let Some(t) = parse_threshold_env(env::var(ENV_CAUTION_THRESHOLD).ok()) {
            self.density.caution_threshold = t;
        }
        if let Ok(p) = env::var(ENV_SETTINGS_PATH) {
            if !p.trim().is_empty() {
                self.settings.path = PathBuf::from(p.trim());
            }
        }
    }

    fn sanitize(&mut self) {
        let t = self.density.caution_threshold;
        if !t.is_finite() || !(0.0..=100.0).contains(&t) {
            warn!(threshold = t, "caution threshold out of range, using default");
            self.density.caution_threshold = DEFAULT_CAUTION_THRESHOLD;
        }
    }
}

// parse optional float env and clamp to <0.0..=100.0>
fn parse_threshold_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 100.0))
}
