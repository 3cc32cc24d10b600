//! Model catalog: backend families rendered as an Ollama `/api/tags` listing.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::backend::provider::{ModelProvider, ProviderError};
use crate::config::{CatalogConfig, DEFAULT_FAMILY};

/// Advertised size of every model; the backend does not report one.
pub const MODEL_SIZE: u64 = 1_000_000_000;

/// `/api/tags` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub models: Vec<ModelListEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelListEntry {
    pub name: String,
    pub size: u64,
    pub digest: String,
    pub modified_at: String,
    pub details: ModelDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDetails {
    pub format: String,
    pub family: String,
    pub families: Vec<String>,
    pub parameter_size: String,
    pub quantization_level: String,
}

/// Current time in the ISO-8601 form Ollama clients parse (`...T12:00:00.000Z`).
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Clone)]
pub struct ModelCatalog {
    provider: Arc<dyn ModelProvider>,
    config: CatalogConfig,
}

impl ModelCatalog {
    pub fn new(provider: Arc<dyn ModelProvider>, config: CatalogConfig) -> Self {
        Self { provider, config }
    }

    /// Distinct families the backend offers, in first-seen order.
    pub async fn families(&self) -> Result<Vec<String>, ProviderError> {
        let models = self.provider.list_models().await?;
        let mut seen = HashSet::new();
        Ok(models
            .into_iter()
            .map(|m| m.family)
            .filter(|family| seen.insert(family.clone()))
            .collect())
    }

    /// Build the model listing. Never fails.
    pub async fn list_models(&self) -> ModelList {
        let families = match self.families().await {
            Ok(families) => families,
            Err(e) => {
                warn!(error = %e, "Error getting models, using fallback families");
                self.config.fallback_families.clone()
            }
        };

        let models = self.entries_for(&families);
        if models.is_empty() {
            return ModelList {
                models: vec![self.entry("latest", DEFAULT_FAMILY)],
            };
        }
        ModelList { models }
    }

    /// One entry per family, preceded by a `latest` alias of the first.
    fn entries_for(&self, families: &[String]) -> Vec<ModelListEntry> {
        let Some(first) = families.first() else {
            return Vec::new();
        };

        std::iter::once(self.entry("latest", first))
            .chain(families.iter().map(|family| self.entry(family, family)))
            .collect()
    }

    fn entry(&self, tag: &str, family: &str) -> ModelListEntry {
        let namespace = &self.config.namespace;
        ModelListEntry {
            name: format!("{namespace}:{tag}"),
            size: MODEL_SIZE,
            digest: format!("sha256:{namespace}-{tag}"),
            modified_at: now_iso8601(),
            details: ModelDetails {
                format: namespace.clone(),
                family: family.to_string(),
                families: vec!["github".to_string()],
                parameter_size: "Unknown".to_string(),
                quantization_level: "None".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::provider::{ModelHandle, TextStream};
    use async_trait::async_trait;

    struct ListingProvider(Result<Vec<ModelHandle>, ProviderError>);

    #[async_trait]
    impl ModelProvider for ListingProvider {
        async fn list_models(&self) -> Result<Vec<ModelHandle>, ProviderError> {
            self.0.clone()
        }

        async fn select_models(&self, _family: &str) -> Result<Vec<ModelHandle>, ProviderError> {
            unreachable!("catalog never selects")
        }

        async fn send_request(
            &self,
            _model: &ModelHandle,
            _prompt: &str,
        ) -> Result<TextStream, ProviderError> {
            unreachable!("catalog never generates")
        }
    }

    fn catalog(listing: Result<Vec<ModelHandle>, ProviderError>) -> ModelCatalog {
        ModelCatalog::new(Arc::new(ListingProvider(listing)), CatalogConfig::default())
    }

    fn handle(family: &str) -> ModelHandle {
        ModelHandle::new(format!("{family}-id"), family, family)
    }

    fn names(list: &ModelList) -> Vec<&str> {
        list.models.iter().map(|m| m.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_latest_alias_precedes_families() {
        let list = catalog(Ok(vec![handle("A"), handle("B")])).list_models().await;

        assert_eq!(names(&list), vec!["copilot:latest", "copilot:A", "copilot:B"]);
        assert_eq!(list.models[0].details.family, "A");
        assert_eq!(list.models[0].digest, "sha256:copilot-latest");
        assert_eq!(list.models[2].digest, "sha256:copilot-B");
    }

    #[tokio::test]
    async fn test_duplicate_families_collapse() {
        let list = catalog(Ok(vec![handle("A"), handle("B"), handle("A")]))
            .list_models()
            .await;
        assert_eq!(list.models.len(), 3);
    }

    #[tokio::test]
    async fn test_enumeration_error_uses_fallback_families() {
        let list = catalog(Err(ProviderError::new("NoPermissions", "denied")))
            .list_models()
            .await;

        assert_eq!(
            names(&list),
            vec!["copilot:latest", "copilot:gpt-4o", "copilot:gpt-4", "copilot:gpt-3.5-turbo"]
        );
    }

    #[tokio::test]
    async fn test_enumeration_error_without_fallback_families() {
        let config = CatalogConfig {
            fallback_families: Vec::new(),
            ..CatalogConfig::default()
        };
        let provider = ListingProvider(Err(ProviderError::new("NoPermissions", "denied")));
        let list = ModelCatalog::new(Arc::new(provider), config).list_models().await;

        assert_eq!(list.models.len(), 1);
        assert_eq!(list.models[0].name, "copilot:latest");
        assert_eq!(list.models[0].details.family, "gpt-4o");
    }

    #[tokio::test]
    async fn test_empty_backend_still_lists_one_model() {
        let list = catalog(Ok(Vec::new())).list_models().await;
        assert_eq!(names(&list), vec!["copilot:latest"]);
    }

    #[tokio::test]
    async fn test_entry_metadata() {
        let list = catalog(Ok(vec![handle("gpt-4o")])).list_models().await;
        let entry = &list.models[1];

        assert_eq!(entry.size, 1_000_000_000);
        assert_eq!(entry.details.format, "copilot");
        assert_eq!(entry.details.families, vec!["github"]);
        assert_eq!(entry.details.parameter_size, "Unknown");
        assert_eq!(entry.details.quantization_level, "None");
        assert!(entry.modified_at.ends_with('Z'));
    }
}
