use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use super::domain::DiscountRule;
use super::hooks::{sanitize_option_event, HookRegistry};
use super::sanitize::{rules_to_value, sanitize_rules};

/// Settings record holding the ordered rule list.
pub const RULES_OPTION: &str = "cpd_discount_rules";

/// Generic key-value settings persistence owned by the host platform.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;
    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;
}

/// Error enumeration for settings persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file {path} is not a JSON object: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local settings, used by tests and the default server wiring.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: Mutex<HashMap<String, Value>>,
}

impl InMemorySettingsStore {
    pub fn with_rules(rules: Value) -> Self {
        let store = Self::default();
        if let Ok(mut values) = store.values.lock() {
            values.insert(RULES_OPTION.to_string(), rules);
        }
        store
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        let values = self
            .values
            .lock()
            .map_err(|_| SettingsError::Unavailable("settings mutex poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| SettingsError::Unavailable("settings mutex poisoned".to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings persisted as a single JSON object on disk, one key per option.
///
/// Writes land in a staging file that is renamed over the record, so readers
/// see either the previous or the next contents.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next write is staged in before it replaces the record.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "settings".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_all(&self) -> Result<Map<String, Value>, SettingsError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&raw).map_err(|source| SettingsError::Malformed {
            path: self.path.clone(),
            source,
        })
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| SettingsError::Unavailable("settings file lock poisoned".to_string()))?;

        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);

        let rendered =
            serde_json::to_string_pretty(&values).map_err(|source| SettingsError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        let staging = self.staging_path();
        fs::write(&staging, rendered).map_err(|source| SettingsError::Io {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Typed access to the rule list. Every call goes back to the settings store.
pub struct RuleStore<S> {
    settings: Arc<S>,
}

impl<S> RuleStore<S>
where
    S: SettingsStore,
{
    pub fn new(settings: Arc<S>) -> Self {
        Self { settings }
    }

    /// Load the stored rules, treating an unset record as an empty list.
    ///
    /// Stored entries pass through the lenient sanitizer so a hand-edited or
    /// legacy record never breaks evaluation.
    pub fn load(&self) -> Result<Vec<DiscountRule>, SettingsError> {
        Ok(self
            .settings
            .get(RULES_OPTION)?
            .map(|stored| sanitize_rules(&stored))
            .unwrap_or_default())
    }

    /// Sanitize `raw` and write it straight to the settings record.
    pub fn save(&self, raw: &Value) -> Result<Vec<DiscountRule>, SettingsError> {
        let rules = sanitize_rules(raw);
        self.settings.set(RULES_OPTION, rules_to_value(&rules))?;
        Ok(rules)
    }
}

/// Settings read/write entry point that runs registered sanitize filters on save.
pub struct SettingsApi<S> {
    store: Arc<S>,
    hooks: Arc<HookRegistry>,
}

impl<S> SettingsApi<S>
where
    S: SettingsStore,
{
    pub fn new(store: Arc<S>, hooks: Arc<HookRegistry>) -> Self {
        Self { store, hooks }
    }

    pub fn get_option(&self, name: &str) -> Result<Option<Value>, SettingsError> {
        self.store.get(name)
    }

    /// Persist `value` under `name` after every sanitize filter has run.
    pub fn update_option(&self, name: &str, value: Value) -> Result<Value, SettingsError> {
        let sanitized = self.hooks.apply_filters(&sanitize_option_event(name), value);
        self.store.set(name, sanitized.clone())?;
        Ok(sanitized)
    }
}
