//! Default command: create the dialog file, or answer its last question.

use anyhow::{Context, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use fbac::backend::{create_backend, ChatRequest};
use fbac::config::AppConfig;
use fbac::dialog::{append_response, ensure_dialog_file, parse_dialog_file, AppendStatus};
use fbac::error::ValidationError;
use fbac::registry::Registry;

/// Run one ensure → parse → request → append cycle on `path`.
pub async fn chat(config: &AppConfig, path: &Path) -> Result<()> {
    let registry = config.registry();

    if !ensure_dialog_file(path, &registry)? {
        println!("Dialog file created: {}", path.display());
        return Ok(());
    }

    let document = parse_dialog_file(path, &registry)?;
    let credentials = registry
        .resolve_model(&document.model)?
        .ok_or_else(|| ValidationError::UnsupportedModel(document.model.clone()))?;
    let backend = create_backend(&document.model, credentials, &config.backend)?;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let fragments = backend.stream_reply(ChatRequest::from_document(&document));
    let result = append_response(path, fragments, &cancel).await;
    watcher.abort();

    let outcome = result.with_context(|| {
        format!(
            "reply in {} is incomplete; the text received so far was kept",
            path.display()
        )
    })?;

    match outcome.status {
        AppendStatus::Completed => {
            tracing::info!(
                path = %path.display(),
                fragments = outcome.fragments,
                bytes = outcome.bytes,
                "reply written"
            );
        }
        AppendStatus::Interrupted => {
            println!("\nResponse interrupted by user.");
        }
    }

    Ok(())
}
