//! Shared fixtures for stage tests

use augur_cache::CacheStore;
use augur_core::RetryPolicy;
use augur_llm::{GenerationRequest, ModelBackend, ModelError, ModelGateway};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Replays canned replies in order and records every prompt
pub struct Scripted {
    replies: RefCell<VecDeque<String>>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl Scripted {
    /// Backend with nothing to say
    pub fn empty() -> Self {
        Self {
            replies: RefCell::new(VecDeque::new()),
            prompts: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl ModelBackend for Scripted {
    fn model_name(&self) -> &str {
        "test/scripted-model"
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ModelError> {
        self.prompts.borrow_mut().push(request.prompt.to_string());
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or(ModelError::EmptyResponse)
    }
}

pub fn gateway(replies: &[&str]) -> (ModelGateway, Rc<RefCell<Vec<String>>>) {
    let prompts = Rc::new(RefCell::new(Vec::new()));
    let backend = Scripted {
        replies: RefCell::new(replies.iter().map(|r| r.to_string()).collect()),
        prompts: prompts.clone(),
    };
    (
        ModelGateway::new(Box::new(backend), RetryPolicy::immediate(1)),
        prompts,
    )
}

pub fn cache() -> (tempfile::TempDir, CacheStore) {
    let temp = tempfile::TempDir::new().unwrap();
    let store = CacheStore::open(temp.path().join("cache")).unwrap();
    (temp, store)
}
