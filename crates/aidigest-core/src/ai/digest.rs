use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::caller::{GenerationOptions, SchemaCaller};
use super::providers::{GeminiApiProvider, ModelBackend};
use crate::config::AppConfig;
use crate::Result;

/// Content beyond this many characters is dropped before prompting
pub const MAX_CONTENT_CHARS: usize = 8000;

pub const DIGEST_SYSTEM_PROMPT: &str = "\
You are an expert AI news analyst specializing in summarizing technical articles, research papers, and video content about artificial intelligence.

Your role is to create concise, informative digests that help readers quickly understand the key points and significance of AI-related content.

Guidelines:
- Create a compelling title (5-10 words) that captures the essence of the content
- Write a 2-3 sentence summary that highlights the main points and why they matter
- Focus on actionable insights and implications
- Use clear, accessible language while maintaining technical accuracy
- Avoid marketing fluff - focus on substance";

/// Title and summary produced for one piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DigestOutput {
    /// Short headline for the content
    pub title: String,
    /// Two to three sentence summary
    pub summary: String,
}

fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Produces [`DigestOutput`]s with a fixed analyst persona
pub struct DigestAgent {
    caller: SchemaCaller,
    options: GenerationOptions,
    max_content_chars: usize,
}

impl DigestAgent {
    /// Agent over any backend, using the default model and temperature
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            caller: SchemaCaller::new(backend),
            options: GenerationOptions::default(),
            max_content_chars: MAX_CONTENT_CHARS,
        }
    }

    /// Gemini-backed agent using `[ai]` settings
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let backend = Arc::new(GeminiApiProvider::from_config(config)?);
        Ok(Self::new(backend)
            .with_options(GenerationOptions::from_config(&config.ai))
            .with_max_content_chars(config.ai.max_content_chars))
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_content_chars(mut self, max_chars: usize) -> Self {
        self.max_content_chars = max_chars;
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// User prompt for one article, with content cut to the character limit
    pub fn build_prompt(&self, title: &str, content: &str, article_type: &str) -> String {
        let content = truncate_chars(content, self.max_content_chars);
        format!(
            "Create a digest for this {}: \n Title: {} \n Content: {}",
            article_type, title, content
        )
    }

    /// Generate a digest, or `None` if anything along the way fails.
    ///
    /// Failures are logged; no error reaches the caller.
    pub async fn generate_digest(
        &self,
        title: &str,
        content: &str,
        article_type: &str,
    ) -> Option<DigestOutput> {
        match self.try_generate_digest(title, content, article_type).await {
            Ok(digest) => Some(digest),
            Err(e) => {
                tracing::error!(
                    title = %title,
                    article_type = %article_type,
                    transient = e.is_transient(),
                    "Error generating digest: {}",
                    e
                );
                None
            }
        }
    }

    /// Generate a digest, keeping the typed failure cause
    pub async fn try_generate_digest(
        &self,
        title: &str,
        content: &str,
        article_type: &str,
    ) -> Result<DigestOutput> {
        let prompt = self.build_prompt(title, content, article_type);

        tracing::debug!(
            title = %title,
            article_type = %article_type,
            content_chars = content.chars().count(),
            model = %self.options.model,
            "Generating digest"
        );

        self.caller
            .try_call_with_schema(&prompt, DIGEST_SYSTEM_PROMPT, &self.options)
            .await
    }
}
