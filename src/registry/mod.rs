//! Model and behavior registry.
//!
//! The registry is the read-only lookup service behind dialog validation: which
//! model names are valid (and how to reach them), which behavior templates exist
//! (and what system prompt and temperature they carry), and which pair a fresh
//! dialog file starts with. Parsing and file creation depend on the [`Registry`]
//! trait only; [`JsonRegistry`] is the operator-facing implementation and
//! [`StaticRegistry`] keeps everything in memory.

pub mod json;

use std::collections::HashMap;

use serde::Deserialize;

use crate::backend::ProviderKind;
use crate::error::ConfigError;

pub use json::JsonRegistry;

/// One entry of the model map.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelRecord {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    /// Overrides provider detection from the model name.
    pub provider: Option<ProviderKind>,
}

/// What a backend needs to reach a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCredentials {
    pub api_key: String,
    pub api_base: Option<String>,
    pub provider: Option<ProviderKind>,
}

/// One entry of the behavior map.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BehaviorRecord {
    pub description: Option<String>,
    pub temperature: Option<f64>,
}

impl BehaviorRecord {
    /// `(description, temperature)` when both fields are present.
    pub fn resolved(&self) -> Option<(String, f64)> {
        Some((self.description.clone()?, self.temperature?))
    }
}

/// The model and behavior a newly created dialog file starts with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefaultSelection {
    pub default_model: String,
    pub default_behavior: String,
}

/// Read-only lookup capability over the model and behavior maps.
///
/// An unknown name is `Ok(None)`; `Err` is reserved for configuration that
/// cannot be read or does not have the expected shape.
pub trait Registry: Send + Sync {
    fn model(&self, name: &str) -> Result<Option<ModelRecord>, ConfigError>;

    fn behavior(&self, name: &str) -> Result<Option<BehaviorRecord>, ConfigError>;

    fn default_selection(&self) -> Result<DefaultSelection, ConfigError>;

    fn is_model_valid(&self, name: &str) -> Result<bool, ConfigError> {
        Ok(self.model(name)?.is_some())
    }

    fn is_behavior_valid(&self, name: &str) -> Result<bool, ConfigError> {
        Ok(self.behavior(name)?.is_some())
    }

    /// Credentials for `name`. A known model without an `api_key` is a
    /// configuration error.
    fn resolve_model(&self, name: &str) -> Result<Option<ModelCredentials>, ConfigError> {
        let Some(record) = self.model(name)? else {
            return Ok(None);
        };
        let api_key = record.api_key.ok_or_else(|| ConfigError::MissingField {
            kind: "model",
            name: name.to_string(),
            field: "api_key",
        })?;
        Ok(Some(ModelCredentials {
            api_key,
            api_base: record.api_base,
            provider: record.provider,
        }))
    }

    /// `(description, temperature)` for `name`.
    fn resolve_behavior(&self, name: &str) -> Result<Option<(String, f64)>, ConfigError> {
        let Some(record) = self.behavior(name)? else {
            return Ok(None);
        };
        let field = if record.description.is_none() {
            "description"
        } else {
            "temperature"
        };
        record
            .resolved()
            .map(Some)
            .ok_or_else(|| ConfigError::MissingField {
                kind: "behavior",
                name: name.to_string(),
                field,
            })
    }
}

/// In-memory registry.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    pub models: HashMap<String, ModelRecord>,
    pub behaviors: HashMap<String, BehaviorRecord>,
    pub defaults: Option<DefaultSelection>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, name: impl Into<String>, record: ModelRecord) -> Self {
        self.models.insert(name.into(), record);
        self
    }

    pub fn with_behavior(mut self, name: impl Into<String>, record: BehaviorRecord) -> Self {
        self.behaviors.insert(name.into(), record);
        self
    }

    pub fn with_defaults(mut self, model: impl Into<String>, behavior: impl Into<String>) -> Self {
        self.defaults = Some(DefaultSelection {
            default_model: model.into(),
            default_behavior: behavior.into(),
        });
        self
    }
}

impl Registry for StaticRegistry {
    fn model(&self, name: &str) -> Result<Option<ModelRecord>, ConfigError> {
        Ok(self.models.get(name).cloned())
    }

    fn behavior(&self, name: &str) -> Result<Option<BehaviorRecord>, ConfigError> {
        Ok(self.behaviors.get(name).cloned())
    }

    fn default_selection(&self) -> Result<DefaultSelection, ConfigError> {
        self.defaults.clone().ok_or_else(|| ConfigError::MissingField {
            kind: "registry",
            name: "static".into(),
            field: "default_model",
        })
    }
}
