//! Ollama-compatible HTTP API.
//!
//! - GET  /api/tags
//! - POST /api/generate
//! - POST /api/chat
//!
//! Neither generation endpoint streams. Backend failures are reported inside
//! a normal 200 envelope, the way Ollama clients expect.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::catalog::{now_iso8601, ModelList};
use crate::prompt::{compile_chat, ChatMessage};
use crate::server::error::{parse_json, ApiError};
use crate::server::{word_count, AppState};

/// Reply text used when the backend produced nothing.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "No response generated";

// Synthetic timings in nanoseconds; the backend reports none.
pub const TOTAL_DURATION: u64 = 1_000_000_000;
pub const LOAD_DURATION: u64 = 100_000_000;
pub const PROMPT_EVAL_DURATION: u64 = 500_000_000;
pub const EVAL_DURATION: u64 = 500_000_000;

// ─── Request/Response Types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub stream: Option<bool>,
    /// Sampling options; accepted and ignored.
    #[serde(default)]
    pub options: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub model: String,
    pub created_at: String,
    pub response: String,
    pub done: bool,
    pub total_duration: u64,
    pub load_duration: u64,
    pub prompt_eval_count: usize,
    pub prompt_eval_duration: u64,
    pub eval_count: usize,
    pub eval_duration: u64,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: Option<bool>,
    /// Sampling options; accepted and ignored.
    #[serde(default)]
    pub options: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub created_at: String,
    pub message: ChatMessage,
    pub done: bool,
}

impl GenerateResponse {
    pub fn new(model: &str, prompt: &str, response: String) -> Self {
        Self {
            model: model.to_string(),
            created_at: now_iso8601(),
            prompt_eval_count: word_count(prompt),
            eval_count: word_count(&response),
            response,
            done: true,
            total_duration: TOTAL_DURATION,
            load_duration: LOAD_DURATION,
            prompt_eval_duration: PROMPT_EVAL_DURATION,
            eval_duration: EVAL_DURATION,
        }
    }
}

impl ChatResponse {
    pub fn new(model: &str, content: String) -> Self {
        Self {
            model: model.to_string(),
            created_at: now_iso8601(),
            message: ChatMessage {
                role: "assistant".to_string(),
                content,
            },
            done: true,
        }
    }
}

fn or_placeholder(text: String) -> String {
    if text.is_empty() {
        EMPTY_RESPONSE_PLACEHOLDER.to_string()
    } else {
        text
    }
}

// ─── Route Handlers ────────────────────────────────────────────────────────

pub async fn tags(State(state): State<Arc<AppState>>) -> Json<ModelList> {
    Json(state.catalog.list_models().await)
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, ApiError> {
    let req: GenerateRequest = parse_json(&body)?;
    let request_id = Uuid::new_v4().to_string();

    let preview: String = req.prompt.chars().take(50).collect();
    info!(request_id, model = req.model, "Generate: \"{preview}...\"");

    let response = match state.backend.generate(&req.prompt, Some(&req.model)).await {
        Ok(text) => or_placeholder(text),
        Err(e) => {
            error!(request_id, "Generate error: {e}");
            format!("Error: {e}")
        }
    };

    Ok(Json(GenerateResponse::new(&req.model, &req.prompt, response)))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let req: ChatRequest = parse_json(&body)?;
    let request_id = Uuid::new_v4().to_string();

    info!(request_id, model = req.model, "Chat: {} messages", req.messages.len());

    let prompt = compile_chat(&req.messages);
    let content = match state.backend.generate(&prompt, Some(&req.model)).await {
        Ok(text) => or_placeholder(text),
        Err(e) => {
            error!(request_id, "Chat error: {e}");
            format!("I'm sorry, I encountered an error: {e}")
        }
    };

    Ok(Json(ChatResponse::new(&req.model, content)))
}
