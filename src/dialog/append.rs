//! Streaming a model reply into the dialog file.
//!
//! Writes go through an append-only handle, so earlier turns are never
//! rewritten. Each fragment is synced before the next one is requested; an
//! interrupted or failed reply leaves whatever already reached the disk and no
//! closing `Human:` marker, which the next parse reports as an unfinished turn.

use std::path::Path;

use futures::{Stream, StreamExt};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{AI_MARKER, HUMAN_MARKER};
use crate::error::{AppendError, BackendError};

/// How an append ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendStatus {
    /// The stream ran out and a fresh Human turn was opened.
    Completed,
    /// Cancelled between fragments; the AI turn is left open.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub status: AppendStatus,
    /// Fragments written.
    pub fragments: usize,
    /// Reply bytes written, markers excluded.
    pub bytes: usize,
}

/// Append an AI turn built from `fragments` to the dialog file at `path`.
///
/// `cancel` is checked before every fragment and wins over a fragment that is
/// ready at the same moment. A backend error item stops the loop and is
/// returned after the bytes before it have been synced.
pub async fn append_response<S>(
    path: impl AsRef<Path>,
    fragments: S,
    cancel: &CancellationToken,
) -> Result<AppendOutcome, AppendError>
where
    S: Stream<Item = Result<String, BackendError>>,
{
    let path = path.as_ref();
    let io_err = |source: std::io::Error| AppendError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut outcome = AppendOutcome {
        status: AppendStatus::Interrupted,
        fragments: 0,
        bytes: 0,
    };
    if cancel.is_cancelled() {
        return Ok(outcome);
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .map_err(io_err)?;
    write_synced(&mut file, format!("\n{AI_MARKER}: ").as_bytes())
        .await
        .map_err(io_err)?;

    let mut fragments = std::pin::pin!(fragments);
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            next = fragments.next() => Some(next),
        };
        // A fragment produced while cancelling is dropped, not written.
        let next = match next {
            Some(next) if !cancel.is_cancelled() => next,
            _ => {
                info!(
                    path = %path.display(),
                    fragments = outcome.fragments,
                    "response interrupted"
                );
                return Ok(outcome);
            }
        };

        match next {
            Some(Ok(fragment)) => {
                if !fragment.is_empty() {
                    write_synced(&mut file, fragment.as_bytes())
                        .await
                        .map_err(io_err)?;
                }
                outcome.fragments += 1;
                outcome.bytes += fragment.len();
            }
            Some(Err(e)) => {
                warn!(
                    path = %path.display(),
                    fragments = outcome.fragments,
                    error = %e,
                    "backend failed mid-response, partial reply kept"
                );
                return Err(e.into());
            }
            None => break,
        }
    }

    write_synced(&mut file, format!("\n\n{HUMAN_MARKER}: ").as_bytes())
        .await
        .map_err(io_err)?;

    outcome.status = AppendStatus::Completed;
    debug!(
        path = %path.display(),
        fragments = outcome.fragments,
        bytes = outcome.bytes,
        "response appended"
    );
    Ok(outcome)
}

async fn write_synced(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_data().await
}
