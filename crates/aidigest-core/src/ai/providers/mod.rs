mod gemini_api;

pub use gemini_api::GeminiApiProvider;

use crate::Result;

/// One generation call as sent to a model service
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Backend model identifier, e.g. "gemini-2.5-flash"
    pub model: String,
    /// Persona/behaviour text, sent separately from the prompt
    pub system_instruction: String,
    /// Full user prompt, schema description included
    pub prompt: String,
    pub temperature: f32,
}

/// A service that turns a [`GenerationRequest`] into raw response text.
///
/// Implementations must ask the service for JSON output and make exactly one attempt.
#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Issue the request and return the model's text
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
