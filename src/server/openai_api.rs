//! OpenAI-compatible HTTP API.
//!
//! Implements POST /v1/chat/completions, streaming and non-streaming. Unlike
//! the Ollama endpoints, a backend failure here is a 500 with an OpenAI error
//! envelope.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::backend::adapter::BackendError;
use crate::prompt::{compile_openai, ChatMessage, OpenAiMessage};
use crate::server::error::{parse_json, ApiError};
use crate::server::streaming::{completion_chunks, sse_response};
use crate::server::{word_count, AppState};

// ─── Request/Response Types ────────────────────────────────────────────────

/// Chat completion request (OpenAI-compatible).
///
/// Sampling parameters and tools are accepted for compatibility and not
/// forwarded to the backend.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    #[serde(default)]
    pub tools: Option<serde_json::Value>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub stream_options: Option<StreamOptions>,
    #[serde(default)]
    pub temperature: Option<serde_json::Value>,
    #[serde(default)]
    pub max_tokens: Option<serde_json::Value>,
    #[serde(default)]
    pub top_p: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamOptions {
    #[serde(default)]
    pub include_usage: Option<bool>,
}

impl ChatCompletionRequest {
    /// Absent and `null` both mean a single JSON reply.
    pub fn is_streaming(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    pub fn include_usage(&self) -> bool {
        self.stream_options
            .as_ref()
            .and_then(|o| o.include_usage)
            .unwrap_or(false)
    }
}

/// Chat completion response (non-streaming).
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: usize,
    pub message: ChatMessage,
    pub finish_reason: String,
}

/// Word-count usage; `total_tokens` is always the sum of the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl Usage {
    pub fn from_texts(prompt: &str, completion: &str) -> Self {
        let prompt_tokens = word_count(prompt);
        let completion_tokens = word_count(completion);
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiErrorResponse {
    pub error: OpenAiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
}

impl OpenAiErrorResponse {
    pub fn from_backend(e: &BackendError) -> Self {
        Self {
            error: OpenAiErrorDetail {
                message: format!("I'm sorry, I encountered an error: {e}"),
                kind: "internal_error".to_string(),
                code: "copilot_error".to_string(),
            },
        }
    }
}

impl IntoResponse for OpenAiErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

impl ChatCompletionResponse {
    pub fn new(id: String, created: i64, model: &str, content: String, usage: Usage) -> Self {
        Self {
            id,
            object: "chat.completion".to_string(),
            created,
            model: model.to_string(),
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content,
                },
                finish_reason: "stop".to_string(),
            }],
            usage,
        }
    }
}

// ─── Route Handlers ────────────────────────────────────────────────────────

pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req: ChatCompletionRequest = parse_json(&body)?;
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id,
        model = req.model,
        "OpenAI Chat: {} messages, stream={}",
        req.messages.len(),
        req.is_streaming()
    );

    let prompt = compile_openai(&req.messages);
    let text = match state.backend.generate(&prompt, Some(&req.model)).await {
        Ok(text) => text,
        Err(e) => {
            error!(request_id, "OpenAI Chat error: {e}");
            return Ok(OpenAiErrorResponse::from_backend(&e).into_response());
        }
    };

    let now = Utc::now();
    let id = format!("chatcmpl-{}", now.timestamp_millis());
    let created = now.timestamp();
    let usage = Usage::from_texts(&prompt, &text);

    if req.is_streaming() {
        let usage = req.include_usage().then_some(usage);
        let chunks = completion_chunks(&id, created, &req.model, &text, usage);
        Ok(sse_response(&chunks))
    } else {
        let response = ChatCompletionResponse::new(id, created, &req.model, text, usage);
        Ok(Json(response).into_response())
    }
}
