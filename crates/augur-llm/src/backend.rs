//! Backend trait implemented by every model provider

use crate::error::ModelError;
use serde_json::Value;

/// One generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub max_output_tokens: u32,
    /// JSON schema for providers that support constrained decoding
    pub json_schema: Option<&'a Value>,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(prompt: &'a str, max_output_tokens: u32) -> Self {
        Self {
            prompt,
            max_output_tokens,
            json_schema: None,
        }
    }

    pub fn with_schema(mut self, schema: &'a Value) -> Self {
        self.json_schema = Some(schema);
        self
    }
}

/// A text-generation provider
pub trait ModelBackend {
    /// Fully qualified `provider/model` name
    fn model_name(&self) -> &str;

    /// Raw response text for a prompt
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ModelError>;
}
