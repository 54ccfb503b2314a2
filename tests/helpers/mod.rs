#![allow(dead_code)]

use std::path::{Path, PathBuf};

use fbac::error::BackendError;
use fbac::registry::{BehaviorRecord, ModelRecord, StaticRegistry};
use futures::stream::{self, Stream};
use tempfile::TempDir;

/// Registry with `gpt-4o`, `claude-3-haiku`, a `default` behavior
/// ("You are helpful.", 0.7) and a `corrupt` behavior missing its temperature.
pub fn test_registry() -> StaticRegistry {
    StaticRegistry::new()
        .with_model("gpt-4o", model("sk-openai"))
        .with_model("claude-3-haiku", model("sk-anthropic"))
        .with_behavior(
            "default",
            BehaviorRecord {
                description: Some("You are helpful.".into()),
                temperature: Some(0.7),
            },
        )
        .with_behavior(
            "corrupt",
            BehaviorRecord {
                description: Some("Half a template".into()),
                temperature: None,
            },
        )
        .with_defaults("gpt-4o", "default")
}

pub fn model(api_key: &str) -> ModelRecord {
    ModelRecord {
        api_key: Some(api_key.into()),
        ..Default::default()
    }
}

/// Write `contents` to `<tmp>/<name>` and return the path.
pub fn dialog_file(tmp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = tmp.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

/// A finite fragment stream that never fails.
pub fn fragments(parts: &[&str]) -> impl Stream<Item = Result<String, BackendError>> {
    let items: Vec<Result<String, BackendError>> =
        parts.iter().map(|p| Ok(p.to_string())).collect();
    stream::iter(items)
}

/// Fragment stream that yields `parts` and then fails.
pub fn failing_fragments(parts: &[&str]) -> impl Stream<Item = Result<String, BackendError>> {
    let mut items: Vec<Result<String, BackendError>> =
        parts.iter().map(|p| Ok(p.to_string())).collect();
    items.push(Err(BackendError::Stream("connection reset".into())));
    stream::iter(items)
}
