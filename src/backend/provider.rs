//! The model provider interface the bridge consumes.
//!
//! A provider can enumerate its models, narrow them to a family, and run a
//! prompt against one model, yielding the reply as a lazy sequence of text
//! fragments.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lazy, finite, non-restartable sequence of generated text fragments.
pub type TextStream = BoxStream<'static, Result<String, ProviderError>>;

/// Failure reported by a provider, carrying its own error code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A concrete model offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelHandle {
    /// Provider-specific identifier.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Family the model belongs to (e.g. "gpt-4o").
    pub family: String,
}

impl ModelHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            family: family.into(),
        }
    }
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Every model the provider currently offers.
    async fn list_models(&self) -> Result<Vec<ModelHandle>, ProviderError>;

    /// Models belonging to `family`; empty when the family is unknown.
    async fn select_models(&self, family: &str) -> Result<Vec<ModelHandle>, ProviderError>;

    /// Run `prompt` as a single user message against `model`.
    async fn send_request(
        &self,
        model: &ModelHandle,
        prompt: &str,
    ) -> Result<TextStream, ProviderError>;
}
