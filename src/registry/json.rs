//! File-backed registry over the operator-maintained JSON maps.
//!
//! Every query re-reads the relevant file. The maps are edited by hand between
//! runs and never written by this crate, so there is nothing to invalidate.
//!
//! Only the queried entry is decoded into a record. A badly typed entry affects
//! lookups of its own name and nothing else.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{BehaviorRecord, DefaultSelection, ModelRecord, Registry};
use crate::error::ConfigError;

pub const MODELS_FILE: &str = "models.json";
pub const BEHAVIORS_FILE: &str = "behavior_templates.json";
pub const DEFAULT_DIALOG_FILE: &str = "default_dialog_config.json";

/// Registry reading `models.json`, `behavior_templates.json` and
/// `default_dialog_config.json`.
#[derive(Debug, Clone)]
pub struct JsonRegistry {
    models_path: PathBuf,
    behaviors_path: PathBuf,
    defaults_path: PathBuf,
}

impl JsonRegistry {
    /// Registry over the standard file names inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(MODELS_FILE),
            dir.join(BEHAVIORS_FILE),
            dir.join(DEFAULT_DIALOG_FILE),
        )
    }

    pub fn new(
        models_path: impl Into<PathBuf>,
        behaviors_path: impl Into<PathBuf>,
        defaults_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            models_path: models_path.into(),
            behaviors_path: behaviors_path.into(),
            defaults_path: defaults_path.into(),
        }
    }

    pub fn models_path(&self) -> &Path {
        &self.models_path
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The raw entry for `name` in the name → attributes map at `path`.
fn load_entry(path: &Path, name: &str) -> Result<Option<Value>, ConfigError> {
    let mut entries: HashMap<String, Value> = load_json(path)?;
    Ok(entries.remove(name))
}

impl Registry for JsonRegistry {
    fn model(&self, name: &str) -> Result<Option<ModelRecord>, ConfigError> {
        let Some(entry) = load_entry(&self.models_path, name)? else {
            return Ok(None);
        };
        serde_json::from_value(entry)
            .map(Some)
            .map_err(|source| ConfigError::InvalidEntry {
                path: self.models_path.clone(),
                kind: "model",
                name: name.to_string(),
                source,
            })
    }

    fn behavior(&self, name: &str) -> Result<Option<BehaviorRecord>, ConfigError> {
        let Some(entry) = load_entry(&self.behaviors_path, name)? else {
            return Ok(None);
        };
        // A known name with unusable fields is still a known behavior.
        let record = serde_json::from_value(entry).unwrap_or_else(|e| {
            debug!(behavior = name, error = %e, "behavior record has unusable fields");
            BehaviorRecord::default()
        });
        Ok(Some(record))
    }

    fn default_selection(&self) -> Result<DefaultSelection, ConfigError> {
        load_json(&self.defaults_path)
    }
}
