//! OpenAI chat completions, also used for Groq's compatible endpoint

use super::{non_empty, send_json};
use crate::backend::{GenerationRequest, ModelBackend};
use crate::error::ModelError;
use reqwest::blocking::Client;
use serde_json::{json, Value};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: String,
    endpoint: &'static str,
    name: String,
}

impl OpenAiBackend {
    pub fn openai(client: Client, api_key: String, model: String) -> Self {
        Self::with_endpoint(client, api_key, model, "openai", OPENAI_URL)
    }

    pub fn groq(client: Client, api_key: String, model: String) -> Self {
        Self::with_endpoint(client, api_key, model, "groq", GROQ_URL)
    }

    fn with_endpoint(
        client: Client,
        api_key: String,
        model: String,
        provider: &str,
        endpoint: &'static str,
    ) -> Self {
        let name = format!("{}/{}", provider, model);
        Self {
            client,
            api_key,
            model,
            endpoint,
            name,
        }
    }

    fn request_body(&self, request: &GenerationRequest<'_>) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": request.max_output_tokens,
            "messages": [{"role": "user", "content": request.prompt}]
        });
        if request.json_schema.is_some() {
            body["response_format"] = json!({"type": "json_object"});
        }
        body
    }
}

fn extract_text(body: &Value) -> Option<&str> {
    body["choices"][0]["message"]["content"].as_str()
}

impl ModelBackend for OpenAiBackend {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ModelError> {
        let body = send_json(
            self.client
                .post(self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&self.request_body(request)),
        )?;
        non_empty(extract_text(&body))
    }
}
