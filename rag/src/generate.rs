use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::build_prompt::{build_prompt, Message};
use crate::error::{RagError, Result};
use crate::http::{join_url, JsonClient};
use crate::retrieve_chunks::Section;

pub const NO_RELEVANT_SECTIONS: &str = "No relevant sections found.";

pub trait ChatCompleter: Send + Sync {
    /// Returns the first choice's message content, untouched.
    fn complete(&self, model: &str, messages: &[Message]) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI-compatible `chat/completions` client.
#[derive(Clone, Debug)]
pub struct OpenAiChat {
    http: JsonClient,
    base_url: String,
}

impl OpenAiChat {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let bearer = format!("Bearer {}", api_key);
        let http = JsonClient::new(&[("Authorization", bearer.as_str())]).map_err(RagError::generation)?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }
}

impl ChatCompleter for OpenAiChat {
    fn complete(&self, model: &str, messages: &[Message]) -> Result<String> {
        let url = join_url(&self.base_url, "chat/completions");
        let req = ChatRequest { model, messages };
        let res: ChatResponse = self.http.post_json(&url, &req).map_err(RagError::generation)?;
        first_choice(res)
    }
}

fn first_choice(res: ChatResponse) -> Result<String> {
    res.choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| RagError::Generation("completion response has no message content".to_string()))
}

#[derive(Clone, Debug)]
pub struct AnswerSettings {
    pub topic: String,
    pub model: String,
}

/// Answers from the retrieved sections. With no sections the completer is
/// never called and [`NO_RELEVANT_SECTIONS`] is returned.
pub fn answer(
    query: &str,
    sections: &[Section],
    completer: &dyn ChatCompleter,
    settings: &AnswerSettings,
) -> Result<String> {
    if sections.is_empty() {
        return Ok(NO_RELEVANT_SECTIONS.to_string());
    }
    let (messages, _) = build_prompt(&settings.topic, query, sections);
    debug!(model = %settings.model, sections = sections.len(), "requesting completion");
    completer.complete(&settings.model, &messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn takes_first_choice_verbatim() {
        let res: ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  38.4% survived.\n"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "other"}}
            ]
        }))
        .unwrap();
        assert_eq!(first_choice(res).unwrap(), "  38.4% survived.\n");
    }

    #[test]
    fn missing_content_is_a_generation_error() {
        let res: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(first_choice(res), Err(RagError::Generation(_))));

        let res: ChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"role": "assistant", "content": null}}]})).unwrap();
        assert!(matches!(first_choice(res), Err(RagError::Generation(_))));
    }

    #[test]
    fn request_body_is_model_plus_messages() {
        let messages = vec![Message {
            role: "user".to_string(),
            content: "hi".to_string(),
        }];
        let req = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"model": "gpt-4o-mini", "messages": [{"role": "user", "content": "hi"}]})
        );
    }
}
