//! Local Ollama chat API

use super::{non_empty, send_json};
use crate::backend::{GenerationRequest, ModelBackend};
use crate::error::ModelError;
use reqwest::blocking::Client;
use serde_json::{json, Value};

const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

pub struct OllamaBackend {
    client: Client,
    host: String,
    model: String,
    name: String,
}

impl OllamaBackend {
    pub fn new(client: Client, host: impl Into<String>, model: String) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        let name = format!("ollama/{}", model);
        Self {
            client,
            host,
            model,
            name,
        }
    }

    /// Host from `$OLLAMA_HOST`, else localhost
    pub fn from_env(client: Client, model: String) -> Self {
        let host = std::env::var("OLLAMA_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
        Self::new(client, host, model)
    }

    fn request_body(&self, request: &GenerationRequest<'_>) -> Value {
        let mut body = json!({
            "model": self.model,
            "stream": false,
            "messages": [{"role": "user", "content": request.prompt}],
            "options": {"num_predict": request.max_output_tokens}
        });
        if let Some(schema) = request.json_schema {
            body["format"] = schema.clone();
        }
        body
    }
}

impl ModelBackend for OllamaBackend {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ModelError> {
        let body = send_json(
            self.client
                .post(format!("{}/api/chat", self.host))
                .json(&self.request_body(request)),
        )?;
        non_empty(body["message"]["content"].as_str())
    }
}
