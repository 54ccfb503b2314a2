//! Anthropic Messages API.

use serde_json::{json, Value};

use super::{sse_fragments, ChatBackend, ChatRequest, FragmentStream, StreamEvent};
use crate::error::BackendError;
use crate::registry::ModelCredentials;

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    http: reqwest::Client,
    credentials: ModelCredentials,
    max_tokens: u32,
}

impl AnthropicBackend {
    pub fn new(http: reqwest::Client, credentials: ModelCredentials, max_tokens: u32) -> Self {
        Self {
            http,
            credentials,
            max_tokens,
        }
    }

    pub fn endpoint(&self) -> String {
        let base = self
            .credentials
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE);
        format!("{}/v1/messages", base.trim_end_matches('/'))
    }
}

impl ChatBackend for AnthropicBackend {
    fn stream_reply(&self, request: ChatRequest) -> FragmentStream {
        let endpoint = self.endpoint();
        tracing::info!(model = %request.model, %endpoint, "requesting message stream");
        let builder = self
            .http
            .post(endpoint)
            .header("x-api-key", &self.credentials.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request_body(&request, self.max_tokens));
        sse_fragments(builder, map_event)
    }
}

/// The behavior travels in the top-level `system` field.
pub fn request_body(request: &ChatRequest, max_tokens: u32) -> Value {
    json!({
        "model": request.model,
        "max_tokens": max_tokens,
        "temperature": request.temperature,
        "system": request.behavior_description,
        "messages": request.messages,
        "stream": true,
    })
}

// Only the first content block is the reply text.
fn map_event(payload: &str) -> Result<StreamEvent, BackendError> {
    let value: Value = serde_json::from_str(payload)?;

    match value.get("type").and_then(Value::as_str) {
        Some("content_block_delta") => Ok(value
            .pointer("/delta/text")
            .and_then(Value::as_str)
            .map(|text| StreamEvent::Fragment(text.to_string()))
            .unwrap_or(StreamEvent::Skip)),
        Some("content_block_stop") | Some("message_stop") => Ok(StreamEvent::Done),
        Some("error") => {
            let message = value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            Err(BackendError::Stream(message.to_string()))
        }
        _ => Ok(StreamEvent::Skip),
    }
}
