//! HTTP server speaking the Ollama and OpenAI chat protocols.
//!
//! - [`ollama_api`]: `/api/tags`, `/api/generate`, `/api/chat`
//! - [`openai_api`]: `/v1/chat/completions`
//! - [`streaming`]: SSE chunk synthesis for streamed completions
//! - [`error`]: request-level faults
//! - [`home`]: informational landing page

pub mod error;
pub mod home;
pub mod ollama_api;
pub mod openai_api;
pub mod streaming;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::Level;

use crate::backend::adapter::BackendAdapter;
use crate::backend::provider::ModelProvider;
use crate::catalog::ModelCatalog;
use crate::config::Config;

/// Application state shared across handlers.
pub struct AppState {
    pub backend: BackendAdapter,
    pub catalog: ModelCatalog,
    /// Configured listen port, shown on the landing page.
    pub port: u16,
}

impl AppState {
    pub fn new(provider: Arc<dyn ModelProvider>, config: &Config) -> Self {
        Self {
            backend: BackendAdapter::with_default_family(
                provider.clone(),
                &config.backend.default_family,
            ),
            catalog: ModelCatalog::new(provider, config.catalog.clone()),
            port: config.server.port,
        }
    }
}

/// Number of words in `text` when split on single spaces.
///
/// Stands in for token counts. An empty string counts as one word and
/// consecutive spaces produce empty words; clients may rely on both.
pub fn word_count(text: &str) -> usize {
    text.split(' ').count()
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", any(home::index))
        .route("/api/tags", any(ollama_api::tags))
        .route(
            "/api/generate",
            post(ollama_api::generate).fallback(error::method_not_allowed),
        )
        .route(
            "/api/chat",
            post(ollama_api::chat).fallback(error::method_not_allowed),
        )
        .route(
            "/v1/chat/completions",
            post(openai_api::chat_completions).fallback(error::method_not_allowed),
        )
        .fallback(error::not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO)),
                )
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static("*"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static("GET, POST, OPTIONS"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static("Content-Type, Authorization, X-Requested-With"),
                ))
                .layer(CatchPanicLayer::custom(error::handle_panic))
                .layer(middleware::from_fn(preflight)),
        )
        .with_state(state)
}

/// Answer every OPTIONS request with an empty 200, whatever the path.
async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_split_rule() {
        assert_eq!(word_count("hello"), 1);
        assert_eq!(word_count("hello world"), 2);
        assert_eq!(word_count(""), 1);
        assert_eq!(word_count("a  b"), 3);
        assert_eq!(word_count("line\nbreak"), 1);
    }
}
