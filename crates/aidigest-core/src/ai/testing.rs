use std::sync::Mutex;

use super::providers::{GenerationRequest, ModelBackend};
use crate::{Error, Result};

enum Reply {
    Text(String),
    Fail(Box<dyn Fn() -> Error + Send + Sync>),
}

/// In-memory backend that records every request and answers with a scripted reply
pub struct FakeBackend {
    reply: Reply,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeBackend {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Reply::Text(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        Self {
            reply: Reply::Fail(Box::new(make_error)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ModelBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(make_error) => Err(make_error()),
        }
    }
}
