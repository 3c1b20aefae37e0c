// src/settings/store.rs
//! Key/value backends for `ConfigStore`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{ConfigStore, KeyUpdate};
use crate::error::SettingsError;

type Entries = Map<String, Value>;

/// Process-local store. Nothing survives a restart; `reload` is a no-op.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        let g = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        g.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut g = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        g.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), SettingsError> {
        let mut g = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        g.remove(key);
        Ok(())
    }

    fn update(&self, key: &str, f: &mut KeyUpdate<'_>) -> Result<(), SettingsError> {
        let mut g = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        apply_update(&mut g, key, f)
    }

    fn reload(&self) -> Result<(), SettingsError> {
        Ok(())
    }
}

/// JSON object on disk. Loaded once at construction, rewritten on every change
/// (temp file + rename), re-read only on `reload`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl JsonFileStore {
    /// A missing file starts empty; a corrupt file is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let entries = read_entries(&path)?;
        info!(path = %path.display(), keys = entries.len(), "settings loaded");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to a copy, persist it, then swap it in. A failed write leaves
    /// memory untouched.
    fn modify<F>(&self, f: F) -> Result<(), SettingsError>
    where
        F: FnOnce(&mut Entries) -> Result<(), SettingsError>,
    {
        let mut g = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = g.clone();
        f(&mut next)?;
        write_entries(&self.path, &next)?;
        *g = next;
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let g = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        g.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.modify(|m| {
            m.insert(key.to_string(), value);
            Ok(())
        })
    }

    fn clear(&self, key: &str) -> Result<(), SettingsError> {
        self.modify(|m| {
            m.remove(key);
            Ok(())
        })
    }

    fn update(&self, key: &str, f: &mut KeyUpdate<'_>) -> Result<(), SettingsError> {
        self.modify(|m| apply_update(m, key, f))
    }

    fn reload(&self) -> Result<(), SettingsError> {
        let fresh = read_entries(&self.path)?;
        let mut g = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        debug!(path = %self.path.display(), keys = fresh.len(), "settings reloaded");
        *g = fresh;
        Ok(())
    }
}

fn apply_update(
    entries: &mut Entries,
    key: &str,
    f: &mut KeyUpdate<'_>,
) -> Result<(), SettingsError> {
    match f(entries.get(key).cloned())? {
        Some(v) => {
            entries.insert(key.to_string(), v);
        }
        None => {
            entries.remove(key);
        }
    }
    Ok(())
}

fn read_entries(path: &Path) -> Result<Entries, SettingsError> {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
        Err(e) => return Err(e.into()),
    };
    if raw.trim().is_empty() {
        return Ok(Entries::new());
    }
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(_) => Err(SettingsError::Corrupt(format!(
            "{} does not hold a JSON object",
            path.display()
        ))),
        Err(e) => Err(SettingsError::Corrupt(format!("{}: {e}", path.display()))),
    }
}

fn write_entries(path: &Path, entries: &Entries) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(entries)?;
    let tmp = path.with_extension("json.tmp");
    let written = write_synced(&tmp, json.as_bytes()).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = written {
        // Leave no partial file behind.
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut f = fs::File::create(path)?;
    f.write_all(bytes)?;
    f.sync_all()
}
