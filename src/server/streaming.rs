//! Synthetic SSE streaming for OpenAI chat completions.
//!
//! The backend reply is already complete when streaming starts, so the chunk
//! sequence is built up front: a role chunk, one content chunk per word, a
//! stop chunk, an optional usage chunk and the `[DONE]` sentinel. Frames are
//! then written to the body one at a time.

use std::convert::Infallible;

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::server::openai_api::Usage;

/// Final frame of every stream.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Streaming chat completion chunk (OpenAI-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: usize,
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Build the chunk sequence for a complete reply.
///
/// Words come from splitting on single spaces; every word after the first
/// carries one leading space so the deltas concatenate back to `text`.
pub fn completion_chunks(
    id: &str,
    created: i64,
    model: &str,
    text: &str,
    usage: Option<Usage>,
) -> Vec<ChatCompletionChunk> {
    let chunk = |delta: ChunkDelta, finish_reason: Option<&str>| ChatCompletionChunk {
        id: id.to_string(),
        object: "chat.completion.chunk".to_string(),
        created,
        model: model.to_string(),
        choices: vec![ChunkChoice {
            index: 0,
            delta,
            finish_reason: finish_reason.map(str::to_string),
        }],
        usage: None,
    };

    let mut chunks = vec![chunk(
        ChunkDelta {
            role: Some("assistant".to_string()),
            content: None,
        },
        None,
    )];

    chunks.extend(text.split(' ').enumerate().map(|(i, word)| {
        let content = if i == 0 {
            word.to_string()
        } else {
            format!(" {word}")
        };
        chunk(
            ChunkDelta {
                role: None,
                content: Some(content),
            },
            None,
        )
    }));

    chunks.push(chunk(ChunkDelta::default(), Some("stop")));

    if let Some(usage) = usage {
        let mut usage_chunk = chunk(ChunkDelta::default(), None);
        usage_chunk.choices.clear();
        usage_chunk.usage = Some(usage);
        chunks.push(usage_chunk);
    }

    chunks
}

/// Encode chunks as `data: <json>\n\n` frames followed by the `[DONE]` frame.
pub fn sse_frames(chunks: &[ChatCompletionChunk]) -> Vec<Bytes> {
    chunks
        .iter()
        .map(|chunk| {
            let data = serde_json::to_string(chunk).unwrap_or_default();
            Bytes::from(format!("data: {data}\n\n"))
        })
        .chain(std::iter::once(Bytes::from_static(DONE_FRAME.as_bytes())))
        .collect()
}

/// Stream the frames as a `text/plain` body, one write per frame.
pub fn sse_response(chunks: &[ChatCompletionChunk]) -> Response {
    let frames = sse_frames(chunks)
        .into_iter()
        .map(Ok::<_, Infallible>);
    let body = Body::from_stream(tokio_stream::iter(frames));

    (
        [
            (CONTENT_TYPE, "text/plain"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}
