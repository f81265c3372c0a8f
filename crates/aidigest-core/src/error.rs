use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The model service answered with an error status or error body.
    #[error("AI provider error (status {status:?}): {message}")]
    AiProvider { status: Option<u16>, message: String },

    /// Response text was not a JSON document.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// Response JSON did not fit the requested schema.
    #[error("Response does not match schema: {0}")]
    SchemaViolation(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether repeating the same request could plausibly succeed.
    ///
    /// Connection failures, timeouts, rate limiting and server-side errors are transient.
    /// Malformed output, schema mismatches and configuration problems are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.as_u16() == 429 || s.is_server_error())
            }
            Error::AiProvider { status, .. } => {
                matches!(status, Some(429) | Some(500..=599))
            }
            Error::Database(e) => crate::storage::is_transient_error(e),
            Error::Io(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_and_parse_failures_are_permanent() {
        assert!(!Error::MalformedResponse("not json".into()).is_transient());
        assert!(!Error::SchemaViolation("missing field `summary`".into()).is_transient());
        assert!(!Error::Config("no key".into()).is_transient());
    }

    #[test]
    fn test_provider_status_classification() {
        let rate_limited = Error::AiProvider {
            status: Some(429),
            message: "quota".into(),
        };
        let unavailable = Error::AiProvider {
            status: Some(503),
            message: "overloaded".into(),
        };
        let bad_request = Error::AiProvider {
            status: Some(400),
            message: "invalid argument".into(),
        };
        assert!(rate_limited.is_transient());
        assert!(unavailable.is_transient());
        assert!(!bad_request.is_transient());
    }
}
