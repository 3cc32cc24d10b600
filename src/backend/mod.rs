//! Model backend.
//!
//! - [`provider`]: The provider interface and its value types
//! - [`adapter`]: Model selection and reply collection
//! - [`echo`]: Offline echo provider
//! - [`upstream`]: OpenAI-compatible HTTP provider

pub mod adapter;
pub mod echo;
pub mod provider;
pub mod upstream;

use std::sync::Arc;

use crate::config::{BackendConfig, ConfigError, ProviderKind};
use echo::EchoProvider;
use provider::ModelProvider;
use upstream::UpstreamProvider;

/// Construct the provider selected by the configuration.
pub fn provider_from_config(config: &BackendConfig) -> Result<Arc<dyn ModelProvider>, ConfigError> {
    match config.provider {
        ProviderKind::Echo => Ok(Arc::new(EchoProvider::new(&config.echo_families))),
        ProviderKind::Upstream => {
            let url = config
                .upstream_url
                .clone()
                .ok_or(ConfigError::MissingUpstreamUrl)?;
            Ok(Arc::new(UpstreamProvider::new(url, config.api_key.clone())))
        }
    }
}
