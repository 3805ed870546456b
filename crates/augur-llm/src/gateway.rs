//! Single entry point for model calls

use crate::backend::{GenerationRequest, ModelBackend};
use crate::parser;
use crate::retry::{retry, AttemptError};
use crate::schema::ResponseSchema;
use augur_core::RetryPolicy;

/// Wraps a backend with retry, response repair and schema validation
pub struct ModelGateway {
    backend: Box<dyn ModelBackend>,
    policy: RetryPolicy,
    max_output_tokens: u32,
}

impl ModelGateway {
    pub fn new(backend: Box<dyn ModelBackend>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            max_output_tokens: 4000,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Validated output, or None once retries are exhausted or the provider
    /// rejects the request outright
    pub fn invoke<S: ResponseSchema>(&self, prompt: &str, schema: &S) -> Option<S::Output> {
        let json_schema = schema.json_schema();
        let request =
            GenerationRequest::new(prompt, self.max_output_tokens).with_schema(&json_schema);

        retry(&self.policy, schema.name(), |attempt| {
            tracing::debug!(model = self.model_name(), schema = schema.name(), attempt, "invoking model");
            let raw = self.backend.generate(&request)?;
            parser::parse(&raw, schema).ok_or_else(|| {
                AttemptError::Transient(format!(
                    "response did not match the {} schema",
                    schema.name()
                ))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::schema::{NoiseSchema, PredictionSchema};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    struct Scripted {
        replies: RefCell<VecDeque<Result<String, ModelError>>>,
        calls: Rc<RefCell<usize>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, ModelError>>) -> (Self, Rc<RefCell<usize>>) {
            let calls = Rc::new(RefCell::new(0));
            let backend = Self {
                replies: RefCell::new(replies.into()),
                calls: calls.clone(),
            };
            (backend, calls)
        }
    }

    impl ModelBackend for Scripted {
        fn model_name(&self) -> &str {
            "test/scripted"
        }

        fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String, ModelError> {
            *self.calls.borrow_mut() += 1;
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(ModelError::EmptyResponse))
        }
    }

    fn gateway(replies: Vec<Result<String, ModelError>>) -> (ModelGateway, Rc<RefCell<usize>>) {
        let (backend, calls) = Scripted::new(replies);
        (
            ModelGateway::new(Box::new(backend), RetryPolicy::immediate(3)),
            calls,
        )
    }

    #[test]
    fn test_invoke_returns_validated_output() {
        let (gw, calls) = gateway(vec![Ok(r#"{"is_noisy": [true, false]}"#.into())]);
        assert_eq!(gw.invoke("p", &NoiseSchema::new(2)), Some(vec![true, false]));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_schema_violation_is_retried() {
        let (gw, calls) = gateway(vec![
            Ok(r#"{"is_noisy": [true]}"#.into()),
            Ok("total garbage".into()),
            Ok(r#"{"is_noisy": [false, false]}"#.into()),
        ]);
        assert_eq!(gw.invoke("p", &NoiseSchema::new(2)), Some(vec![false, false]));
        assert_eq!(*calls.borrow(), 3);
    }

    #[test]
    fn test_transport_errors_retried_then_none() {
        let (gw, calls) = gateway(vec![
            Err(ModelError::Transport("reset".into())),
            Err(ModelError::RateLimited { retry_after: None }),
            Err(ModelError::Transport("503".into())),
        ]);
        assert!(gw.invoke("p", &PredictionSchema).is_none());
        assert_eq!(*calls.borrow(), 3);
    }

    #[test]
    fn test_api_error_is_not_retried() {
        let (gw, calls) = gateway(vec![
            Err(ModelError::Api {
                status: 401,
                body: "bad key".into(),
            }),
            Ok(r#"{"predictions": []}"#.into()),
        ]);
        assert!(gw.invoke("p", &PredictionSchema).is_none());
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_model_name_passthrough() {
        let (gw, _) = gateway(vec![]);
        assert_eq!(gw.model_name(), "test/scripted");
    }
}
