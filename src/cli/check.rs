//! `--check`: validate a dialog file and print what a run would send.

use anyhow::Result;
use std::path::Path;

use fbac::backend::ProviderKind;
use fbac::config::AppConfig;
use fbac::dialog::{parse_dialog_file, Speaker};
use fbac::registry::Registry;

/// Parse `path` against the configured registry and print a summary.
pub fn check(config: &AppConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        println!("Dialog file: not found at {}", path.display());
        println!("Run `fbac {}` to create it.", path.display());
        return Ok(());
    }

    let registry = config.registry();
    let document = parse_dialog_file(path, &registry)?;

    let provider = registry
        .resolve_model(&document.model)?
        .and_then(|creds| ProviderKind::resolve(&document.model, &creds).ok())
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| "(unknown)".into());
    let human = document
        .conversation
        .iter()
        .filter(|turn| turn.speaker == Speaker::Human)
        .count();
    let ai = document.conversation.len() - human;

    println!("Dialog file:   {}", path.display());
    println!("Registry:      {}", config.resolved_config_dir().display());
    println!("Model:         {}", document.model);
    println!("Provider:      {provider}");
    println!("Temperature:   {}", document.temperature);
    println!(
        "Turns:         {} ({human} human, {ai} AI)",
        document.conversation.len()
    );
    if let Some(question) = document.pending_question() {
        let first_line = question.lines().next().unwrap_or_default();
        println!("Question:      {first_line}");
    }
    println!("Status:        ready for a reply");

    Ok(())
}
