//! Flattens protocol chat messages into the single prompt string the backend takes.
//!
//! Each message becomes a `"<role>: <content>"` line and the prompt ends with
//! an open assistant turn, `"\nassistant: "`.

use serde::{Deserialize, Serialize};

const ASSISTANT_TURN: &str = "\nassistant: ";

/// Ollama chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI chat message; content is either a string or a list of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<MessageContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One segment of segmented content. Only `type == "text"` parts carry prompt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageContent {
    /// Reduce to plain text: text parts joined by a single space, other parts dropped.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|p| p.kind == "text")
                .map(|p| p.text.as_deref().unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn compile<'a>(turns: impl Iterator<Item = (&'a str, String)>) -> String {
    let mut prompt = turns
        .map(|(role, content)| format!("{role}: {content}"))
        .collect::<Vec<_>>()
        .join("\n");
    prompt.push_str(ASSISTANT_TURN);
    prompt
}

/// Compile Ollama chat messages into a prompt.
pub fn compile_chat(messages: &[ChatMessage]) -> String {
    compile(messages.iter().map(|m| (m.role.as_str(), m.content.clone())))
}

/// Compile OpenAI messages into a prompt.
pub fn compile_openai(messages: &[OpenAiMessage]) -> String {
    compile(messages.iter().map(|m| {
        let content = m.content.as_ref().map(MessageContent::to_text).unwrap_or_default();
        (m.role.as_str(), content)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(role: &str, content: &str) -> ChatMessage {
        ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_chat_prompt_layout() {
        let prompt = compile_chat(&[chat("system", "be brief"), chat("user", "hi")]);
        assert_eq!(prompt, "system: be brief\nuser: hi\nassistant: ");
    }

    #[test]
    fn test_empty_conversation() {
        assert_eq!(compile_chat(&[]), "\nassistant: ");
        assert_eq!(compile_openai(&[]), "\nassistant: ");
    }

    #[test]
    fn test_one_line_per_message_in_order() {
        let messages: Vec<ChatMessage> = (0..5).map(|i| chat("user", &format!("m{i}"))).collect();
        let prompt = compile_chat(&messages);

        assert!(prompt.ends_with("\nassistant: "));
        let body = prompt.strip_suffix("\nassistant: ").unwrap();
        let lines: Vec<&str> = body.split('\n').collect();
        assert_eq!(lines, vec!["user: m0", "user: m1", "user: m2", "user: m3", "user: m4"]);
    }

    #[test]
    fn test_segmented_content_keeps_only_text() {
        let messages: Vec<OpenAiMessage> = serde_json::from_str(
            r#"[
                {"role": "system", "content": "rules"},
                {"role": "user", "content": [
                    {"type": "text", "text": "look at"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}},
                    {"type": "text", "text": "this"}
                ]}
            ]"#,
        )
        .unwrap();

        let prompt = compile_openai(&messages);
        assert_eq!(prompt, "system: rules\nuser: look at this\nassistant: ");
        assert!(!prompt.contains("image"));
    }

    #[test]
    fn test_null_content_compiles_empty() {
        let messages: Vec<OpenAiMessage> =
            serde_json::from_str(r#"[{"role": "assistant", "content": null}]"#).unwrap();
        assert_eq!(compile_openai(&messages), "assistant: \nassistant: ");
    }
}
