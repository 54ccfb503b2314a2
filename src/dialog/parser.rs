//! Text → [`DialogDocument`].
//!
//! The grammar is three independent extraction rules run over the whole file
//! text: the `model:` header, the `behavior:` header, and the turn boundaries.
//! They run in that order and the first failure wins, so a document is either
//! fully valid or rejected.
//!
//! Duplicate header lines are tolerated; the first occurrence is honored. Turn
//! alternation is not enforced, two Human turns in a row are parsed as two turns.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{DialogDocument, Speaker, Turn, AI_MARKER, HUMAN_MARKER};
use crate::error::{DialogError, ValidationError};
use crate::registry::Registry;

static MODEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^model:[ \t]*(\S+)").expect("valid model regex"));

static BEHAVIOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^behavior:[ \t]*(\S+)").expect("valid behavior regex"));

// No lookahead in `regex`: find every marker at a line start and slice between them.
static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?m)^({}|{}):",
        regex::escape(HUMAN_MARKER),
        regex::escape(AI_MARKER)
    ))
    .expect("valid marker regex")
});

/// Read `path` once and parse it.
pub fn parse_dialog_file(
    path: impl AsRef<Path>,
    registry: &dyn Registry,
) -> Result<DialogDocument, DialogError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| DialogError::io(path, e))?;
    let document = parse_dialog(&text, registry)?;
    debug!(
        path = %path.display(),
        model = %document.model,
        turns = document.conversation.len(),
        "dialog parsed"
    );
    Ok(document)
}

/// Parse dialog text, validating against `registry`.
pub fn parse_dialog(text: &str, registry: &dyn Registry) -> Result<DialogDocument, DialogError> {
    let model = parse_model(text, registry)?;
    let (behavior_description, temperature) = parse_behavior(text, registry)?;
    let conversation = parse_conversation(text)?;

    Ok(DialogDocument {
        model,
        behavior_description,
        temperature,
        conversation,
    })
}

/// First `model:` header, checked against the registry.
pub fn parse_model(text: &str, registry: &dyn Registry) -> Result<String, DialogError> {
    let name = first_header(&MODEL_RE, text, "model").ok_or(ValidationError::MissingModel)?;
    if !registry.is_model_valid(&name)? {
        return Err(ValidationError::UnsupportedModel(name).into());
    }
    Ok(name)
}

/// First `behavior:` header, resolved to `(description, temperature)`.
pub fn parse_behavior(text: &str, registry: &dyn Registry) -> Result<(String, f64), DialogError> {
    let name =
        first_header(&BEHAVIOR_RE, text, "behavior").ok_or(ValidationError::MissingBehavior)?;
    let Some(record) = registry.behavior(&name)? else {
        return Err(ValidationError::UnsupportedBehavior(name).into());
    };
    record
        .resolved()
        .ok_or_else(|| ValidationError::CorruptBehaviorData(name).into())
}

/// Turns of the conversation, requiring a non-empty trailing Human turn.
pub fn parse_conversation(text: &str) -> Result<Vec<Turn>, ValidationError> {
    let turns = extract_turns(text);
    match turns.last() {
        Some(last) if last.speaker == Speaker::Human && !last.content.is_empty() => Ok(turns),
        _ => Err(ValidationError::EmptyOrMissingFinalTurn),
    }
}

/// Every turn in document order, without validation.
///
/// A turn runs from just after its marker to the next marker at a line start
/// (or end of text) and is trimmed, so multi-line turns come back whole and a
/// bare `Human: ` yields an empty turn.
pub fn extract_turns(text: &str) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut open: Option<(Speaker, usize)> = None;

    for caps in MARKER_RE.captures_iter(text) {
        let (Some(whole), Some(marker)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(speaker) = Speaker::from_marker(marker.as_str()) else {
            continue;
        };
        if let Some((prev, start)) = open.take() {
            turns.push(Turn::new(prev, text[start..whole.start()].trim()));
        }
        open = Some((speaker, whole.end()));
    }

    if let Some((prev, start)) = open {
        turns.push(Turn::new(prev, text[start..].trim()));
    }

    turns
}

fn first_header(re: &Regex, text: &str, header: &str) -> Option<String> {
    let mut matches = re.captures_iter(text).filter_map(|c| c.get(1));
    let first = matches.next()?.as_str().to_string();
    let ignored = matches.count();
    if ignored > 0 {
        debug!(header, value = %first, ignored, "duplicate header lines ignored");
    }
    Some(first)
}
