//! Provider backed by an OpenAI-compatible HTTP server.
//!
//! Models come from `GET /v1/models`; each model id doubles as its family.
//! Generations use `POST /v1/chat/completions` with `stream: true` and the
//! SSE reply is decoded into text fragments as bytes arrive.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::backend::provider::{ModelHandle, ModelProvider, ProviderError, TextStream};

#[derive(Debug, Deserialize)]
struct ModelListResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

pub struct UpstreamProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl UpstreamProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    ProviderError::new("Unreachable", e.to_string())
}

async fn status_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ProviderError::new(status.as_u16().to_string(), body)
}

#[async_trait]
impl ModelProvider for UpstreamProvider {
    async fn list_models(&self) -> Result<Vec<ModelHandle>, ProviderError> {
        let response = self
            .request(reqwest::Method::GET, "/v1/models")
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let list: ModelListResponse = response.json().await.map_err(transport_error)?;
        Ok(list
            .data
            .into_iter()
            .map(|m| ModelHandle::new(m.id.clone(), m.id.clone(), m.id))
            .collect())
    }

    async fn select_models(&self, family: &str) -> Result<Vec<ModelHandle>, ProviderError> {
        Ok(self
            .list_models()
            .await?
            .into_iter()
            .filter(|m| m.family == family)
            .collect())
    }

    async fn send_request(
        &self,
        model: &ModelHandle,
        prompt: &str,
    ) -> Result<TextStream, ProviderError> {
        let body = json!({
            "model": model.id,
            "messages": [{"role": "user", "content": prompt}],
            "stream": true,
        });

        let response = self
            .request(reqwest::Method::POST, "/v1/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        debug!(model = %model.id, "Upstream stream opened");
        Ok(sse_fragments(response.bytes_stream().boxed()))
    }
}

/// State threaded through the `unfold` stream.
struct SseState {
    stream: BoxStream<'static, Result<Bytes, reqwest::Error>>,
    buf: BytesMut,
    done: bool,
}

/// Decode an OpenAI SSE byte stream into its `delta.content` fragments.
pub(crate) fn sse_fragments(
    byte_stream: BoxStream<'static, Result<Bytes, reqwest::Error>>,
) -> TextStream {
    let state = SseState {
        stream: byte_stream,
        buf: BytesMut::new(),
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }

        loop {
            if let Some(line_end) = st.buf.iter().position(|b| *b == b'\n') {
                let line = st.buf.split_to(line_end + 1);
                match parse_sse_line(&String::from_utf8_lossy(&line)) {
                    SseLine::Content(text) => return Some((Ok(text), st)),
                    SseLine::Done => {
                        st.done = true;
                        return None;
                    }
                    SseLine::Skip => continue,
                }
            }

            match st.stream.next().await {
                Some(Ok(chunk)) => st.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    warn!("Upstream stream error: {e}");
                    st.done = true;
                    return Some((Err(transport_error(e)), st));
                }
                None => {
                    // Stream ended without [DONE]; flush a trailing unterminated line.
                    st.done = true;
                    let rest = st.buf.split();
                    return match parse_sse_line(&String::from_utf8_lossy(&rest)) {
                        SseLine::Content(text) => Some((Ok(text), st)),
                        _ => None,
                    };
                }
            }
        }
    })
    .boxed()
}

#[derive(Debug, PartialEq)]
enum SseLine {
    Content(String),
    Done,
    Skip,
}

fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }

    let Ok(chunk) = serde_json::from_str::<serde_json::Value>(data) else {
        return SseLine::Skip;
    };
    match chunk["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => SseLine::Content(content.to_string()),
        _ => SseLine::Skip,
    }
}
