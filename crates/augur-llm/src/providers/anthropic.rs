//! Anthropic messages API

use super::{non_empty, send_json};
use crate::backend::{GenerationRequest, ModelBackend};
use crate::error::ModelError;
use reqwest::blocking::Client;
use serde_json::{json, Value};

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    client: Client,
    api_key: String,
    model: String,
    name: String,
}

impl AnthropicBackend {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        let name = format!("anthropic/{}", model);
        Self {
            client,
            api_key,
            model,
            name,
        }
    }

    // No constrained decoding here; the prompt carries the format
    fn request_body(&self, request: &GenerationRequest<'_>) -> Value {
        json!({
            "model": self.model,
            "max_tokens": request.max_output_tokens,
            "messages": [{"role": "user", "content": request.prompt}]
        })
    }
}

/// Concatenated text blocks of a messages response
fn extract_text(body: &Value) -> Option<String> {
    let blocks = body["content"].as_array()?;
    let text: String = blocks
        .iter()
        .filter(|b| b["type"].as_str().map_or(true, |t| t == "text"))
        .filter_map(|b| b["text"].as_str())
        .collect();
    Some(text)
}

impl ModelBackend for AnthropicBackend {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ModelError> {
        let body = send_json(
            self.client
                .post(ANTHROPIC_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&self.request_body(request)),
        )?;
        non_empty(extract_text(&body).as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let b = AnthropicBackend::new(Client::new(), "k".into(), "claude-3-5-sonnet-20241022".into());
        let body = b.request_body(&GenerationRequest::new("prompt", 4000));
        assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(b.model_name(), "anthropic/claude-3-5-sonnet-20241022");
    }

    #[test]
    fn test_extract_text_joins_text_blocks() {
        let body = json!({"content": [
            {"type": "text", "text": "{\"a\":"},
            {"type": "text", "text": " 1}"}
        ]});
        assert_eq!(extract_text(&body).as_deref(), Some("{\"a\": 1}"));
    }
}
