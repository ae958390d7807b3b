//! Language-model reformatting of slide text.
//!
//! Slide text comes out in shape order, which rarely matches reading
//! order. A chat-completion model is asked to restructure it.

use std::time::Duration;

use extract_core::{Error, LlmConfig, Result};
use serde::Serialize;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that formats messy text into clean, readable content.";

/// Something that can rewrite slide text for readability.
pub trait TextFormatter {
    fn format_text(&self, text: &str) -> Result<String>;
}

/// Settings for [`ChatCompletionFormatter`].
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl ChatSettings {
    /// Defaults overridden by whatever the `[llm]` config section sets.
    pub fn from_config(config: &LlmConfig) -> Self {
        let defaults = Self::default();
        Self {
            endpoint: config.endpoint.clone().unwrap_or(defaults.endpoint),
            model: config.model.clone().unwrap_or(defaults.model),
            max_tokens: config.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: config.temperature.unwrap_or(defaults.temperature),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

/// Formatter backed by an OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionFormatter {
    client: reqwest::blocking::Client,
    api_key: String,
    settings: ChatSettings,
}

impl ChatCompletionFormatter {
    pub fn new(api_key: impl Into<String>, settings: ChatSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::LlmError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            settings,
        })
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    fn request_body(&self, text: &str) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: formatting_prompt(text),
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }
}

impl TextFormatter for ChatCompletionFormatter {
    fn format_text(&self, text: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text))
            .send()
            .map_err(|e| Error::LlmError(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(Error::LlmError("Rate limited (429)".into()));
        }
        if !status.is_success() {
            return Err(Error::LlmError(format!("HTTP {}", status)));
        }

        let data: serde_json::Value = resp.json().map_err(|e| Error::LlmError(e.to_string()))?;
        completion_content(&data)
    }
}

/// The user prompt wrapping the extracted text.
pub fn formatting_prompt(text: &str) -> String {
    format!(
        "You are a text formatting assistant. The following text was extracted from a \
PowerPoint slide where text elements can be positioned anywhere on the slide. Please format \
this text into a clean, readable structure with proper paragraphs, headings, and organization.

Extracted text:
{}

Please format this text to be easy to read, with:
- Clear paragraphs
- Proper spacing
- Headings/sections where appropriate
- Bullet points or lists preserved
- Logical flow and organization

Formatted text:",
        text
    )
}

/// `choices[0].message.content`, trimmed. Missing or blank content is an error.
pub fn completion_content(data: &serde_json::Value) -> Result<String> {
    let content = data["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .unwrap_or("");

    if content.is_empty() {
        return Err(Error::LlmError("response contained no content".into()));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completion_content_trimmed() {
        let data = json!({
            "choices": [{"message": {"role": "assistant", "content": "  # Agenda\n\n- Budget \n"}}]
        });
        assert_eq!(completion_content(&data).unwrap(), "# Agenda\n\n- Budget");
    }

    #[test]
    fn test_completion_content_missing() {
        assert!(completion_content(&json!({"choices": []})).is_err());
        assert!(completion_content(&json!({"error": {"message": "bad key"}})).is_err());
        let blank = json!({"choices": [{"message": {"content": "   "}}]});
        assert!(matches!(completion_content(&blank), Err(Error::LlmError(_))));
    }

    #[test]
    fn test_prompt_embeds_text() {
        let prompt = formatting_prompt("Q3 results\nRevenue up");
        assert!(prompt.contains("Extracted text:\nQ3 results\nRevenue up\n\n"));
        assert!(prompt.ends_with("Formatted text:"));
    }

    #[test]
    fn test_settings_from_config() {
        let config = LlmConfig {
            model: Some("gpt-4o-mini".into()),
            temperature: Some(0.0),
            ..LlmConfig::default()
        };
        let settings = ChatSettings::from_config(&config);
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.temperature, 0.0);
        assert_eq!(settings.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_request_body_shape() {
        let formatter = ChatCompletionFormatter::new("sk-test", ChatSettings::default()).unwrap();
        let body = serde_json::to_value(formatter.request_body("Hello")).unwrap();

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("Hello"));
    }

    #[test]
    fn test_unreachable_endpoint_is_llm_error() {
        let settings = ChatSettings {
            endpoint: "http://127.0.0.1:9/v1/chat/completions".into(),
            ..ChatSettings::default()
        };
        let formatter = ChatCompletionFormatter::new("sk-test", settings).unwrap();
        assert!(matches!(formatter.format_text("Hello"), Err(Error::LlmError(_))));
    }
}
