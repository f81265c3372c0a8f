//! Response schemas: one Rust type both describes the JSON the model must produce and
//! validates what comes back.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// JSON Schema of `T`, rendered as compact JSON text for embedding in a prompt
pub fn schema_text<T: JsonSchema>() -> Result<String> {
    let schema = schemars::schema_for!(T);
    Ok(serde_json::to_string(&schema)?)
}

/// Parse `text` as JSON and coerce it into `T`.
///
/// Text that is not JSON is a [`Error::MalformedResponse`]; JSON that lacks required fields
/// or carries the wrong types is a [`Error::SchemaViolation`].
pub fn validate<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value: serde_json::Value =
        serde_json::from_str(text.trim()).map_err(|e| Error::MalformedResponse(e.to_string()))?;

    serde_json::from_value(value).map_err(|e| Error::SchemaViolation(e.to_string()))
}
