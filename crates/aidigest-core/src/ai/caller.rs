use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use super::providers::{GenerationRequest, ModelBackend};
use super::schema;
use crate::config::AiConfig;
use crate::Result;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Model selection and sampling settings for one call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    /// Passed through as is; the service owns range checking
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl GenerationOptions {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            model: config.gemini_model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Calls a model once and validates its JSON answer against a Rust type
#[derive(Clone)]
pub struct SchemaCaller {
    backend: Arc<dyn ModelBackend>,
}

impl SchemaCaller {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    /// Run one schema-constrained generation.
    ///
    /// Returns `None` on any failure (transport, API, unparseable or non-conforming output).
    /// The cause is logged, never propagated; use [`Self::try_call_with_schema`] to inspect it.
    pub async fn call_with_schema<T>(
        &self,
        prompt: &str,
        system_instruction: &str,
        options: &GenerationOptions,
    ) -> Option<T>
    where
        T: JsonSchema + DeserializeOwned,
    {
        match self
            .try_call_with_schema(prompt, system_instruction, options)
            .await
        {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(
                    backend = self.backend.name(),
                    model = %options.model,
                    transient = e.is_transient(),
                    "Error calling model with schema: {}",
                    e
                );
                None
            }
        }
    }

    /// Same call as [`Self::call_with_schema`], keeping the typed error
    pub async fn try_call_with_schema<T>(
        &self,
        prompt: &str,
        system_instruction: &str,
        options: &GenerationOptions,
    ) -> Result<T>
    where
        T: JsonSchema + DeserializeOwned,
    {
        let request = GenerationRequest {
            model: options.model.clone(),
            system_instruction: system_instruction.to_string(),
            prompt: schema_prompt::<T>(prompt)?,
            temperature: options.temperature,
        };

        let text = self.backend.generate(&request).await?;
        schema::validate(&text)
    }
}

/// The user prompt followed by the JSON Schema the answer must match
fn schema_prompt<T: JsonSchema>(prompt: &str) -> Result<String> {
    Ok(format!(
        "{}\n\nRespond with JSON matching this schema: {}",
        prompt,
        schema::schema_text::<T>()?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::FakeBackend;
    use crate::Error;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Verdict {
        label: String,
        confidence: f64,
    }

    #[tokio::test]
    async fn test_request_carries_options_and_schema() {
        let backend = Arc::new(FakeBackend::replying(r#"{"label":"ai","confidence":0.9}"#));
        let caller = SchemaCaller::new(backend.clone());
        let options = GenerationOptions::default()
            .with_model("gemini-2.0-pro")
            .with_temperature(1.3);

        let verdict: Verdict = caller
            .call_with_schema("Classify this.", "You classify.", &options)
            .await
            .unwrap();
        assert_eq!(verdict.label, "ai");
        assert_eq!(verdict.confidence, 0.9);

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.model, "gemini-2.0-pro");
        assert_eq!(sent.temperature, 1.3);
        assert_eq!(sent.system_instruction, "You classify.");
        assert!(sent
            .prompt
            .starts_with("Classify this.\n\nRespond with JSON matching this schema: {"));
        assert!(sent.prompt.contains("\"confidence\""));
    }

    #[tokio::test]
    async fn test_defaults() {
        let backend = Arc::new(FakeBackend::replying(r#"{"label":"x","confidence":1}"#));
        let caller = SchemaCaller::new(backend.clone());

        let _: Option<Verdict> = caller
            .call_with_schema("p", "s", &GenerationOptions::default())
            .await;

        let sent = &backend.requests()[0];
        assert_eq!(sent.model, "gemini-2.5-flash");
        assert_eq!(sent.temperature, 0.7);
    }

    #[tokio::test]
    async fn test_failures_collapse_to_none() {
        let cases = vec![
            FakeBackend::failing(|| Error::AiProvider {
                status: Some(503),
                message: "unavailable".to_string(),
            }),
            FakeBackend::replying("not json at all"),
            FakeBackend::replying(r#"{"label":"x"}"#),
            FakeBackend::replying(r#"{"label":7,"confidence":0.1}"#),
        ];

        for backend in cases {
            let backend = Arc::new(backend);
            let caller = SchemaCaller::new(backend.clone());
            let result: Option<Verdict> = caller
                .call_with_schema("p", "s", &GenerationOptions::default())
                .await;
            assert!(result.is_none());
            assert_eq!(backend.requests().len(), 1, "exactly one attempt");
        }
    }

    #[tokio::test]
    async fn test_typed_errors_distinguish_causes() {
        let caller = SchemaCaller::new(Arc::new(FakeBackend::replying("<html>")));
        let err = caller
            .try_call_with_schema::<Verdict>("p", "s", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));

        let caller = SchemaCaller::new(Arc::new(FakeBackend::replying(r#"{"label":"x"}"#)));
        let err = caller
            .try_call_with_schema::<Verdict>("p", "s", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = AiConfig::default();
        config.gemini_model = "gemini-2.0-flash".to_string();
        config.temperature = 0.1;

        let options = GenerationOptions::from_config(&config);
        assert_eq!(options.model, "gemini-2.0-flash");
        assert_eq!(options.temperature, 0.1);
    }
}
