use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{GenerationRequest, ModelBackend};
use crate::config::AppConfig;
use crate::{Error, Result};

const JSON_MIME_TYPE: &str = "application/json";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Serialize)]
struct GeminiRequest<'a> {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
}

/// Gemini `generateContent` REST backend
pub struct GeminiApiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiApiProvider {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build from `[ai]` settings; fails when no API key is configured
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.gemini_api_key()?,
            &config.ai.api_base_url,
            Duration::from_secs(config.ai.request_timeout_secs),
        )
    }

    /// The key travels in a header, never in the URL
    fn endpoint(&self, model: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/models/{}:generateContent", self.base_url, model))?)
    }
}

fn build_body(request: &GenerationRequest) -> GeminiRequest<'_> {
    let system_instruction = (!request.system_instruction.is_empty()).then(|| GeminiContent {
        role: None,
        parts: vec![GeminiPart {
            text: &request.system_instruction,
        }],
    });

    GeminiRequest {
        system_instruction,
        contents: vec![GeminiContent {
            role: Some("user"),
            parts: vec![GeminiPart {
                text: &request.prompt,
            }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            response_mime_type: JSON_MIME_TYPE,
        },
    }
}

/// Extract the candidate text from a response body
fn parse_response(status: StatusCode, body: &str) -> Result<String> {
    let parsed: std::result::Result<GeminiResponse, _> = serde_json::from_str(body);

    if !status.is_success() {
        let message = parsed
            .ok()
            .and_then(|r| r.error)
            .map(|e| e.message)
            .unwrap_or_else(|| body.trim().to_string());
        return Err(Error::AiProvider {
            status: Some(status.as_u16()),
            message,
        });
    }

    let response = parsed.map_err(|e| Error::AiProvider {
        status: Some(status.as_u16()),
        message: format!("unexpected response body: {}", e),
    })?;

    if let Some(error) = response.error {
        return Err(Error::AiProvider {
            status: Some(status.as_u16()),
            message: error.message,
        });
    }

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content);

    match candidate {
        Some(content) => Ok(content.parts.into_iter().map(|p| p.text).collect()),
        None => {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("prompt blocked: {}", r))
                .unwrap_or_else(|| "response contained no candidates".to_string());
            Err(Error::MalformedResponse(reason))
        }
    }
}

#[async_trait::async_trait]
impl ModelBackend for GeminiApiProvider {
    fn name(&self) -> &str {
        "gemini_api"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.endpoint(&request.model)?;

        tracing::debug!(
            model = %request.model,
            temperature = request.temperature,
            prompt_chars = request.prompt.chars().count(),
            "Sending Gemini generateContent request"
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;
        tracing::trace!(%status, "Gemini response received");

        parse_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "gemini-2.0-pro".to_string(),
            system_instruction: "You are terse.".to_string(),
            prompt: "Summarize this".to_string(),
            temperature: 0.2,
        }
    }

    #[test]
    fn test_endpoint_contains_model_but_no_key() {
        let provider =
            GeminiApiProvider::new("k&y", "https://example.test/v1beta/", Duration::from_secs(5))
                .unwrap();
        let url = provider.endpoint("gemini-2.0-pro").unwrap();

        assert_eq!(url.path(), "/v1beta/models/gemini-2.0-pro:generateContent");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_request_body_shape() {
        let req = request();
        let body = serde_json::to_value(build_body(&req)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are terse.");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Summarize this");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_empty_system_instruction_omitted() {
        let mut req = request();
        req.system_instruction.clear();
        let body = serde_json::to_value(build_body(&req)).unwrap();

        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_parse_joins_candidate_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"title\":"},{"text":"\"x\"}"}]}}]}"#;
        let text = parse_response(StatusCode::OK, body).unwrap();
        assert_eq!(text, r#"{"title":"x"}"#);
    }

    #[test]
    fn test_parse_error_status() {
        let body = r#"{"error":{"code":429,"message":"Resource exhausted"}}"#;
        let err = parse_response(StatusCode::TOO_MANY_REQUESTS, body).unwrap_err();

        match &err {
            Error::AiProvider { status, message } => {
                assert_eq!(*status, Some(429));
                assert_eq!(message, "Resource exhausted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_transient());
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = parse_response(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(ref m) if m.contains("SAFETY")));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_http_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = GeminiApiProvider::new(
            "TOPSECRETKEY",
            &format!("http://{}/v1beta", addr),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(err.is_transient());

        let text = err.to_string();
        assert!(!text.contains("TOPSECRETKEY"), "key leaked: {text}");
        assert!(!format!("{err:?}").contains("TOPSECRETKEY"));
    }
}
