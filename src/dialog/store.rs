//! Dialog file creation.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::{debug, info};

use super::HUMAN_MARKER;
use crate::error::{ConfigError, DialogError};
use crate::registry::Registry;

/// Make sure a dialog file exists at `path`.
///
/// Returns `true` when the file was already there (it is left untouched) and
/// `false` when a skeleton was written from the registry's default selection.
/// Missing parent directories are created.
pub fn ensure_dialog_file(
    path: impl AsRef<Path>,
    registry: &dyn Registry,
) -> Result<bool, DialogError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DialogError::io(parent, e))?;
    }

    if path.exists() {
        debug!(path = %path.display(), "dialog file exists");
        return Ok(true);
    }

    let skeleton = default_skeleton(registry)?;

    // create_new: lose a creation race rather than truncate someone's file.
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(true),
        Err(e) => return Err(DialogError::io(path, e)),
    };
    file.write_all(skeleton.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| DialogError::io(path, e))?;

    info!(path = %path.display(), "dialog file created");
    Ok(false)
}

/// The text of a fresh dialog file, after validating the default selection.
pub fn default_skeleton(registry: &dyn Registry) -> Result<String, DialogError> {
    let defaults = registry.default_selection()?;

    if !registry.is_model_valid(&defaults.default_model)? {
        return Err(ConfigError::InvalidDefault {
            kind: "model",
            name: defaults.default_model,
        }
        .into());
    }
    if !registry.is_behavior_valid(&defaults.default_behavior)? {
        return Err(ConfigError::InvalidDefault {
            kind: "behavior",
            name: defaults.default_behavior,
        }
        .into());
    }

    Ok(format!(
        "model: {}\nbehavior: {}\n\n{HUMAN_MARKER}: ",
        defaults.default_model, defaults.default_behavior
    ))
}
