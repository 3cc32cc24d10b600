//! Offline provider that echoes the last prompt line back.
//!
//! Useful for wiring up clients without a real model: the reply is
//! deterministic and arrives as one fragment per word, like a streamed
//! generation would.

use async_trait::async_trait;
use futures::stream;

use crate::backend::provider::{ModelHandle, ModelProvider, ProviderError, TextStream};

pub struct EchoProvider {
    models: Vec<ModelHandle>,
}

impl EchoProvider {
    /// Create a provider offering one model per family.
    pub fn new(families: &[String]) -> Self {
        let models = families
            .iter()
            .map(|family| ModelHandle::new(format!("echo-{family}"), format!("Echo {family}"), family))
            .collect();
        Self { models }
    }
}

/// The text the echo provider replies with for `prompt`.
///
/// Compiled chat prompts end with an empty assistant turn; the reply is the
/// content of the last turn before it.
pub fn echo_reply(prompt: &str) -> String {
    let body = prompt.strip_suffix("\nassistant: ").unwrap_or(prompt);
    let last = body.lines().last().unwrap_or_default();
    match last.split_once(": ") {
        Some((role, content)) if !role.contains(' ') => content.to_string(),
        _ => last.to_string(),
    }
}

#[async_trait]
impl ModelProvider for EchoProvider {
    async fn list_models(&self) -> Result<Vec<ModelHandle>, ProviderError> {
        Ok(self.models.clone())
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
        let fragments: Vec<Result<String, ProviderError>> = echo_reply(prompt)
            .split_inclusive(' ')
            .map(|word| Ok(word.to_string()))
            .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_echo_reply_of_chat_prompt() {
        let prompt = "system: be brief\nuser: hello there\nassistant: ";
        assert_eq!(echo_reply(prompt), "hello there");
    }

    #[test]
    fn test_echo_reply_of_plain_prompt() {
        assert_eq!(echo_reply("def fibonacci(n):"), "def fibonacci(n):");
        assert_eq!(echo_reply(""), "");
    }

    #[tokio::test]
    async fn test_reply_arrives_word_by_word() {
        let provider = EchoProvider::new(&["gpt-4o".to_string()]);
        let model = provider.select_models("gpt-4o").await.unwrap().remove(0);
        let fragments: Vec<String> = provider
            .send_request(&model, "user: one two three\nassistant: ")
            .await
            .unwrap()
            .map(|f| f.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["one ", "two ", "three"]);
    }

    #[tokio::test]
    async fn test_unknown_family_selects_nothing() {
        let provider = EchoProvider::new(&["gpt-4o".to_string()]);
        assert!(provider.select_models("gpt-4").await.unwrap().is_empty());
        assert_eq!(provider.list_models().await.unwrap().len(), 1);
    }
}
