//! Google Gemini generateContent

use super::{non_empty, send_json};
use crate::backend::{GenerationRequest, ModelBackend};
use crate::error::ModelError;
use reqwest::blocking::Client;
use serde_json::{json, Value};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    name: String,
}

impl GeminiBackend {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        let name = format!("gemini/{}", model);
        Self {
            client,
            api_key,
            model,
            name,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model)
    }

    fn request_body(&self, request: &GenerationRequest<'_>) -> Value {
        let mut generation_config = json!({"maxOutputTokens": request.max_output_tokens});
        if request.json_schema.is_some() {
            generation_config["responseMimeType"] = json!("application/json");
        }
        json!({
            "contents": [{"role": "user", "parts": [{"text": request.prompt}]}],
            "generationConfig": generation_config
        })
    }
}

fn extract_text(body: &Value) -> Option<String> {
    let parts = body["candidates"][0]["content"]["parts"].as_array()?;
    Some(parts.iter().filter_map(|p| p["text"].as_str()).collect())
}

impl ModelBackend for GeminiBackend {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ModelError> {
        let body = send_json(
            self.client
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .json(&self.request_body(request)),
        )?;
        non_empty(extract_text(&body).as_deref())
    }
}
