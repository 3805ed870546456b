//! Provider backends and selection

mod anthropic;
mod gemini;
mod ollama;
mod openai;

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use crate::backend::ModelBackend;
use crate::error::ModelError;
use crate::retry::MAX_RETRY_DELAY;
use augur_core::{Config, ConfigError};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Groq,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    pub fn all() -> [ProviderKind; 5] {
        [
            ProviderKind::Gemini,
            ProviderKind::OpenAi,
            ProviderKind::Groq,
            ProviderKind::Anthropic,
            ProviderKind::Ollama,
        ]
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let lowered = name.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|kind| kind.name() == lowered)
            .ok_or_else(|| ConfigError::UnknownProvider {
                name: name.to_string(),
                available: Self::all()
                    .iter()
                    .map(|k| k.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-pro",
            ProviderKind::OpenAi => "gpt-4-turbo-preview",
            ProviderKind::Groq => "llama3-70b-8192",
            ProviderKind::Anthropic => "claude-3-5-sonnet-20241022",
            ProviderKind::Ollama => "llama2:13b",
        }
    }

    /// Environment variable holding the API key, if the provider needs one
    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn credential(kind: ProviderKind) -> Result<String, ConfigError> {
    let Some(var) = kind.credential_env() else {
        return Ok(String::new());
    };
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ConfigError::MissingCredential(var.to_string())),
    }
}

fn http_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::Invalid {
            field: "request_timeout_secs",
            reason: e.to_string(),
        })
}

/// Build the backend for a provider. Credentials are read from the
/// environment here so a missing key fails once, at startup.
pub fn build_backend(
    kind: ProviderKind,
    model: Option<&str>,
    config: &Config,
) -> Result<Box<dyn ModelBackend>, ConfigError> {
    let model = model.unwrap_or(kind.default_model()).to_string();
    let api_key = credential(kind)?;
    let client = http_client(config.request_timeout())?;

    let backend: Box<dyn ModelBackend> = match kind {
        ProviderKind::Gemini => Box::new(GeminiBackend::new(client, api_key, model)),
        ProviderKind::OpenAi => Box::new(OpenAiBackend::openai(client, api_key, model)),
        ProviderKind::Groq => Box::new(OpenAiBackend::groq(client, api_key, model)),
        ProviderKind::Anthropic => Box::new(AnthropicBackend::new(client, api_key, model)),
        ProviderKind::Ollama => Box::new(OllamaBackend::from_env(client, model)),
    };
    tracing::info!(model = backend.model_name(), "model backend ready");
    Ok(backend)
}

fn retry_after(response: &reqwest::blocking::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .map(|wait| wait.min(MAX_RETRY_DELAY))
}

/// Send a JSON request and map the HTTP outcome onto [`ModelError`]
pub(crate) fn send_json(request: RequestBuilder) -> Result<Value, ModelError> {
    let response = request
        .send()
        .map_err(|e| ModelError::Transport(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ModelError::RateLimited {
            retry_after: retry_after(&response),
        });
    }
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        if status.is_server_error() {
            return Err(ModelError::Transport(format!("{}: {}", status, body)));
        }
        return Err(ModelError::Api {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Value>()
        .map_err(|e| ModelError::Transport(format!("invalid response body: {}", e)))
}

/// Non-empty text or [`ModelError::EmptyResponse`]
pub(crate) fn non_empty(text: Option<&str>) -> Result<String, ModelError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(ModelError::EmptyResponse),
    }
}
