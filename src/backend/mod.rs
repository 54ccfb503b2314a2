//! Model backends.
//!
//! A [`ChatBackend`] turns a [`ChatRequest`] into a lazy [`FragmentStream`]:
//! nothing goes over the network until the stream is first polled, and every
//! item is either the next piece of reply text or the error that ended it.
//! Backends are created via [`create_backend`] from registry credentials.

pub mod anthropic;
pub mod openai;
pub mod sse;

use std::collections::VecDeque;

use anyhow::Result;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::dialog::{DialogDocument, Speaker};
use crate::error::{BackendError, ConfigError};
use crate::registry::ModelCredentials;
use sse::SseDecoder;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;

/// Lazy, finite stream of reply text.
pub type FragmentStream = BoxStream<'static, Result<String, BackendError>>;

/// Wire protocol family of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions and compatible servers.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl ProviderKind {
    /// Guess the provider from the model name.
    pub fn detect(model: &str) -> Option<Self> {
        const OPENAI_PREFIXES: [&str; 4] = ["gpt-", "llama", "mistral", "mixtral"];
        if OPENAI_PREFIXES.iter().any(|p| model.starts_with(p)) {
            Some(Self::OpenAi)
        } else if model.starts_with("claude-") {
            Some(Self::Anthropic)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// The explicit provider from the credentials, else [`detect`](Self::detect).
    pub fn resolve(model: &str, credentials: &ModelCredentials) -> Result<Self, ConfigError> {
        credentials
            .provider
            .or_else(|| Self::detect(model))
            .ok_or_else(|| ConfigError::UnknownProvider(model.to_string()))
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Provider-neutral request for the next reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub behavior_description: String,
    pub temperature: f64,
    /// Conversation turns only; the behavior travels separately.
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn from_document(document: &DialogDocument) -> Self {
        let messages = document
            .conversation
            .iter()
            .map(|turn| ChatMessage {
                role: match turn.speaker {
                    Speaker::Human => Role::User,
                    Speaker::Ai => Role::Assistant,
                },
                content: turn.content.clone(),
            })
            .collect();

        Self {
            model: document.model.clone(),
            behavior_description: document.behavior_description.clone(),
            temperature: document.temperature,
            messages,
        }
    }
}

/// Something that can stream a reply.
pub trait ChatBackend: Send + Sync {
    fn stream_reply(&self, request: ChatRequest) -> FragmentStream;
}

/// Create a backend for `model` from its registry credentials.
pub fn create_backend(
    model: &str,
    credentials: ModelCredentials,
    config: &BackendConfig,
) -> Result<Box<dyn ChatBackend>> {
    let http = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
        .build()?;

    let backend: Box<dyn ChatBackend> = match ProviderKind::resolve(model, &credentials)? {
        ProviderKind::OpenAi => Box::new(OpenAiBackend::new(http, credentials)),
        ProviderKind::Anthropic => {
            Box::new(AnthropicBackend::new(http, credentials, config.max_tokens))
        }
    };
    Ok(backend)
}

/// What one SSE payload means to a provider.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StreamEvent {
    Fragment(String),
    Skip,
    Done,
}

/// Send `request` on first poll and decode its SSE body with `mapper`.
pub(crate) fn sse_fragments<M>(request: reqwest::RequestBuilder, mapper: M) -> FragmentStream
where
    M: FnMut(&str) -> Result<StreamEvent, BackendError> + Send + 'static,
{
    let opened = async move {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").into());
            tracing::warn!(%status, %message, "model backend rejected request");
            return Err(BackendError::from_status(status, message));
        }
        tracing::debug!(%status, "reply stream opened");
        Ok::<_, BackendError>(SseFragments::new(response.bytes_stream().boxed(), mapper))
    };

    stream::once(opened)
        .map_ok(|fragments| {
            stream::unfold(fragments, |mut fragments| async move {
                let item = fragments.next_fragment().await?;
                Some((item, fragments))
            })
        })
        .try_flatten()
        .boxed()
}

/// `error.message` from a JSON error body, or the trimmed body itself.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        });
    from_json.or_else(|| {
        let body = body.trim();
        (!body.is_empty()).then(|| body.to_string())
    })
}

struct SseFragments<B, M> {
    body: B,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    mapper: M,
    eof: bool,
    finished: bool,
}

impl<B, C, M> SseFragments<B, M>
where
    B: Stream<Item = reqwest::Result<C>> + Unpin,
    C: AsRef<[u8]>,
    M: FnMut(&str) -> Result<StreamEvent, BackendError>,
{
    fn new(body: B, mapper: M) -> Self {
        Self {
            body,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            mapper,
            eof: false,
            finished: false,
        }
    }

    async fn next_fragment(&mut self) -> Option<Result<String, BackendError>> {
        loop {
            if self.finished {
                return None;
            }

            while let Some(payload) = self.pending.pop_front() {
                match (self.mapper)(&payload) {
                    Ok(StreamEvent::Fragment(text)) => return Some(Ok(text)),
                    Ok(StreamEvent::Skip) => {}
                    Ok(StreamEvent::Done) => {
                        self.finished = true;
                        return None;
                    }
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
            }

            if self.eof {
                self.finished = true;
                return None;
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.decoder.feed(chunk.as_ref())),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.eof = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::Turn;

    fn creds(provider: Option<ProviderKind>) -> ModelCredentials {
        ModelCredentials {
            api_key: "k".into(),
            api_base: None,
            provider,
        }
    }

    #[test]
    fn detect_by_prefix() {
        assert_eq!(ProviderKind::detect("gpt-4o"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::detect("llama3-70b"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::detect("mixtral-8x7b"), Some(ProviderKind::OpenAi));
        assert_eq!(
            ProviderKind::detect("claude-3-opus-20240229"),
            Some(ProviderKind::Anthropic)
        );
        assert_eq!(ProviderKind::detect("gemini-pro"), None);
    }

    #[test]
    fn explicit_provider_wins() {
        let kind = ProviderKind::resolve("my-local-model", &creds(Some(ProviderKind::OpenAi)));
        assert_eq!(kind.unwrap(), ProviderKind::OpenAi);
        assert!(matches!(
            ProviderKind::resolve("my-local-model", &creds(None)),
            Err(ConfigError::UnknownProvider(_))
        ));
    }

    #[test]
    fn request_maps_speakers_to_roles() {
        let document = DialogDocument {
            model: "gpt-4o".into(),
            behavior_description: "Be brief.".into(),
            temperature: 0.3,
            conversation: vec![
                Turn::new(Speaker::Human, "Hi"),
                Turn::new(Speaker::Ai, "Hello"),
                Turn::new(Speaker::Human, "Bye"),
            ],
        };
        let request = ChatRequest::from_document(&document);
        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(request.behavior_description, "Be brief.");
    }

    #[test]
    fn error_message_prefers_json_field() {
        assert_eq!(
            error_message(r#"{"error": {"message": "bad key", "type": "auth"}}"#).as_deref(),
            Some("bad key")
        );
        assert_eq!(error_message("  gateway down \n").as_deref(), Some("gateway down"));
        assert_eq!(error_message(""), None);
    }

    #[tokio::test]
    async fn sse_fragments_stop_at_done() {
        let chunks: Vec<reqwest::Result<&'static [u8]>> = vec![
            Ok(&b"data: a\n\ndata: b\n"[..]),
            Ok(&b"\ndata: stop\n\ndata: never\n\n"[..]),
        ];
        let mut fragments = SseFragments::new(stream::iter(chunks), |payload: &str| {
            Ok(match payload {
                "stop" => StreamEvent::Done,
                other => StreamEvent::Fragment(other.to_string()),
            })
        });

        assert_eq!(fragments.next_fragment().await.unwrap().unwrap(), "a");
        assert_eq!(fragments.next_fragment().await.unwrap().unwrap(), "b");
        assert!(fragments.next_fragment().await.is_none());
        assert!(fragments.next_fragment().await.is_none());
    }

    #[tokio::test]
    async fn sse_fragments_surface_mapper_errors_once() {
        let chunks: Vec<reqwest::Result<&'static [u8]>> =
            vec![Ok(&b"data: ok\n\ndata: boom\n\ndata: after\n\n"[..])];
        let mut fragments = SseFragments::new(stream::iter(chunks), |payload: &str| {
            if payload == "boom" {
                Err(BackendError::Stream("overloaded".into()))
            } else {
                Ok(StreamEvent::Fragment(payload.to_string()))
            }
        });

        assert_eq!(fragments.next_fragment().await.unwrap().unwrap(), "ok");
        assert!(matches!(
            fragments.next_fragment().await,
            Some(Err(BackendError::Stream(_)))
        ));
        assert!(fragments.next_fragment().await.is_none());
    }
}
