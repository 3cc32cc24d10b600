//! Shared fixtures: a scripted provider and router helpers.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use futures::stream;
use http_body_util::BodyExt;
use tower::ServiceExt;

use ollama_bridge::backend::provider::{ModelHandle, ModelProvider, ProviderError, TextStream};
use ollama_bridge::config::Config;
use ollama_bridge::server::{build_router, AppState};

/// Provider with scripted model lists and reply fragments.
#[derive(Default)]
pub struct ScriptedProvider {
    pub models: Vec<ModelHandle>,
    pub list_error: Option<ProviderError>,
    pub request_error: Option<ProviderError>,
    pub fragments: Vec<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn replying(families: &[&str], fragments: &[&str]) -> Self {
        Self {
            models: families
                .iter()
                .map(|f| ModelHandle::new(format!("{f}-1"), format!("{f} model"), *f))
                .collect(),
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn list_models(&self) -> Result<Vec<ModelHandle>, ProviderError> {
        match &self.list_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.models.clone()),
        }
    }

    async fn select_models(&self, family: &str) -> Result<Vec<ModelHandle>, ProviderError> {
        Ok(self
            .models
            .iter()
            .filter(|m| m.family == family)
            .cloned()
            .collect())
    }

    async fn send_request(
        &self,
        _model: &ModelHandle,
        prompt: &str,
    ) -> Result<TextStream, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(e) = &self.request_error {
            return Err(e.clone());
        }
        let fragments: Vec<Result<String, ProviderError>> =
            self.fragments.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}

pub fn router_with(provider: Arc<ScriptedProvider>) -> Router {
    router_with_config(provider, &Config::default())
}

pub fn router_with_config(provider: Arc<ScriptedProvider>, config: &Config) -> Router {
    build_router(Arc::new(AppState::new(provider, config)))
}

pub async fn send(app: Router, method: Method, uri: &str, body: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
