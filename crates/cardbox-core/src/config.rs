//! TOML-based application configuration.
//!
//! Client-side preferences only; everything the backend owns (scheduler
//! version, timebox limit, feature flags) lives in the backend config store
//! instead. Stored at `~/.config/cardbox/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, honoring two environment overrides:
/// `CARDBOX_DATA_DIR` points anywhere (tests use this), and
/// `CARDBOX_ENV=dev` selects `~/.config/cardbox-dev/`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = if let Ok(dir) = std::env::var("CARDBOX_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");
        let env = std::env::var("CARDBOX_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base_dir.join("cardbox-dev")
        } else {
            base_dir.join("cardbox")
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Collection store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection file name inside the data directory, or an absolute path.
    #[serde(default = "default_collection_file")]
    pub file: String,
    /// Request a compatibility downgrade when closing.
    #[serde(default)]
    pub downgrade_on_close: bool,
}

/// Study-flow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Show break prompts when a timebox is reached.
    #[serde(default = "default_true")]
    pub break_prompts: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/cardbox/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub study: StudyConfig,
}

fn default_collection_file() -> String {
    "collection.db".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            file: default_collection_file(),
            downgrade_on_close: false,
        }
    }
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            break_prompts: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection: CollectionConfig::default(),
            study: StudyConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Absolute path of the collection store.
    pub fn collection_path(&self) -> Result<PathBuf, ConfigError> {
        let file = PathBuf::from(&self.collection.file);
        if file.is_absolute() {
            Ok(file)
        } else {
            Ok(data_dir()?.join(file))
        }
    }

    /// Load from disk, writing the defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = json.pointer(&dot_to_pointer(key))?.clone();
        match val {
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// The new value must parse as the same JSON type the field already has.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let slot = json
            .pointer_mut(&dot_to_pointer(key))
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        *slot = parse_as_existing_type(slot, value).ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse '{value}' as the field's type"),
        })?;

        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()
    }
}

fn dot_to_pointer(key: &str) -> String {
    format!("/{}", key.replace('.', "/"))
}

fn parse_as_existing_type(existing: &serde_json::Value, value: &str) -> Option<serde_json::Value> {
    match existing {
        serde_json::Value::Bool(_) => value.parse::<bool>().ok().map(serde_json::Value::from),
        serde_json::Value::Number(_) => value
            .parse::<i64>()
            .ok()
            .map(serde_json::Value::from)
            .or_else(|| value.parse::<f64>().ok().map(serde_json::Value::from)),
        _ => Some(serde_json::Value::from(value)),
    }
}
