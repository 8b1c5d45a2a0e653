//! Durable per-job enabled flags.
//!
//! The file is a pretty-printed JSON object mapping job names to booleans.
//! It is read once at startup and rewritten in full on every change. File
//! problems never reach callers: reads fall back to defaults and failed
//! writes leave the in-memory map authoritative.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SettingsError;

/// Job name to enabled flag.
pub type Settings = BTreeMap<String, bool>;

pub struct SettingsStore {
    path: PathBuf,
    defaults: RwLock<Settings>,
    /// In-memory desired state. Its lock is also the writer lock for the file.
    current: Mutex<Settings>,
}

impl SettingsStore {
    /// Open the store at `path`, loading it once merged with `defaults`.
    pub fn open(path: impl Into<PathBuf>, defaults: Settings) -> Self {
        let store = Self {
            path: path.into(),
            defaults: RwLock::new(defaults),
            current: Mutex::new(Settings::new()),
        };
        let loaded = store.load();
        *store.current.lock() = loaded;
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compiled-in defaults for every known job.
    pub fn default_settings(&self) -> Settings {
        self.defaults.read().clone()
    }

    /// Add a default for a job registered after the store was opened.
    /// A persisted value for the job, if any, wins.
    pub fn register_default(&self, name: &str, enabled: bool) {
        self.defaults.write().insert(name.to_string(), enabled);
        self.current.lock().entry(name.to_string()).or_insert(enabled);
    }

    /// Read the file and merge it over the defaults.
    ///
    /// Missing, unreadable or malformed files yield exactly the defaults.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            debug!("Settings file {} not found, using defaults", self.path.display());
            return self.default_settings();
        }

        match self.read_file() {
            Ok(persisted) => {
                let mut settings = self.default_settings();
                settings.extend(persisted);
                settings
            }
            Err(e) => {
                warn!("Ignoring settings file {}: {}", self.path.display(), e);
                self.default_settings()
            }
        }
    }

    fn read_file(&self) -> Result<Settings, SettingsError> {
        let content = std::fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&content)?;
        match value {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(name, value)| (name, truthy(&value)))
                .collect()),
            other => Err(SettingsError::NotAnObject(json_type(&other))),
        }
    }

    /// Replace the in-memory map and write it to disk.
    pub fn save(&self, settings: &Settings) {
        let mut current = self.current.lock();
        *current = settings.clone();
        self.persist(&current);
    }

    /// Set one job's flag and write the full map.
    pub fn set(&self, name: &str, enabled: bool) {
        let mut current = self.current.lock();
        current.insert(name.to_string(), enabled);
        self.persist(&current);
    }

    /// The in-memory desired state.
    pub fn snapshot(&self) -> Settings {
        self.current.lock().clone()
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.current.lock().get(name).copied()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    fn persist(&self, settings: &Settings) {
        if let Err(e) = self.write_file(settings) {
            warn!(
                "Failed to persist settings to {}: {} (keeping in-memory state)",
                self.path.display(),
                e
            );
        }
    }

    fn write_file(&self, settings: &Settings) -> Result<(), SettingsError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(settings)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| SettingsError::Persist(e.error.to_string()))?;
        Ok(())
    }
}

/// Loose boolean reading of a JSON value.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
