//! Backend adapter: picks a model for a request and collects its reply.

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::provider::{ModelHandle, ModelProvider, ProviderError};
use crate::config::DEFAULT_FAMILY;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("No models available. Please ensure the model backend is reachable and authenticated.")]
    NoModelsAvailable,

    #[error("Backend error ({code}): {message}")]
    Provider { code: String, message: String },
}

impl From<ProviderError> for BackendError {
    fn from(e: ProviderError) -> Self {
        BackendError::Provider {
            code: e.code,
            message: e.message,
        }
    }
}

/// Extract the family from a `"<namespace>:<family>"` model name.
///
/// Returns `None` when the name has no family segment or asks for `latest`.
pub fn requested_family(requested_model: &str) -> Option<&str> {
    if !requested_model.contains(':') {
        return None;
    }
    match requested_model.split(':').nth(1) {
        Some("latest") | None => None,
        Some(family) => Some(family),
    }
}

/// Wraps a [`ModelProvider`] with model selection and fragment collection.
#[derive(Clone)]
pub struct BackendAdapter {
    provider: Arc<dyn ModelProvider>,
    default_family: String,
}

impl BackendAdapter {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self::with_default_family(provider, DEFAULT_FAMILY)
    }

    pub fn with_default_family(provider: Arc<dyn ModelProvider>, default_family: &str) -> Self {
        Self {
            provider,
            default_family: default_family.to_string(),
        }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Generate a reply to `prompt` with the model named by `requested_model`.
    ///
    /// An empty reply is returned as-is; callers decide how to present it.
    pub async fn generate(
        &self,
        prompt: &str,
        requested_model: Option<&str>,
    ) -> Result<String, BackendError> {
        let target_family = requested_model
            .and_then(requested_family)
            .unwrap_or(self.default_family.as_str());

        let model = self.select(target_family).await?;
        info!(model = %model.name, family = %model.family, "Using model");

        let mut fragments = self.provider.send_request(&model, prompt).await?;
        let mut response = String::new();
        while let Some(fragment) = fragments.next().await {
            response.push_str(&fragment?);
        }

        Ok(response)
    }

    /// Family-scoped lookup first, then any model at all.
    async fn select(&self, target_family: &str) -> Result<ModelHandle, BackendError> {
        let scoped = self.provider.select_models(target_family).await?;
        if let Some(model) = scoped.into_iter().next() {
            return Ok(model);
        }

        let model = self
            .provider
            .list_models()
            .await?
            .into_iter()
            .next()
            .ok_or(BackendError::NoModelsAvailable)?;

        warn!(
            requested = target_family,
            using = %model.family,
            "Requested model family not found, substituting"
        );
        Ok(model)
    }
}
