//! OpenAI chat completions (and compatible servers).

use serde_json::{json, Value};

use super::{sse_fragments, ChatBackend, ChatMessage, ChatRequest, FragmentStream, Role, StreamEvent};
use crate::error::BackendError;
use crate::registry::ModelCredentials;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiBackend {
    http: reqwest::Client,
    credentials: ModelCredentials,
}

impl OpenAiBackend {
    pub fn new(http: reqwest::Client, credentials: ModelCredentials) -> Self {
        Self { http, credentials }
    }

    pub fn endpoint(&self) -> String {
        let base = self
            .credentials
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

impl ChatBackend for OpenAiBackend {
    fn stream_reply(&self, request: ChatRequest) -> FragmentStream {
        let endpoint = self.endpoint();
        tracing::info!(model = %request.model, %endpoint, "requesting chat completion");
        let builder = self
            .http
            .post(endpoint)
            .bearer_auth(&self.credentials.api_key)
            .json(&request_body(&request));
        sse_fragments(builder, map_event)
    }
}

/// The behavior goes first as the `system` message.
pub fn request_body(request: &ChatRequest) -> Value {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(ChatMessage {
        role: Role::System,
        content: request.behavior_description.clone(),
    });
    messages.extend(request.messages.iter().cloned());

    json!({
        "model": request.model,
        "messages": messages,
        "temperature": request.temperature,
        "stream": true,
    })
}

fn map_event(payload: &str) -> Result<StreamEvent, BackendError> {
    if payload == "[DONE]" {
        return Ok(StreamEvent::Done);
    }

    let value: Value = serde_json::from_str(payload)?;
    if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
        return Err(BackendError::Stream(message.to_string()));
    }

    Ok(value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .map(|text| StreamEvent::Fragment(text.to_string()))
        .unwrap_or(StreamEvent::Skip))
}
