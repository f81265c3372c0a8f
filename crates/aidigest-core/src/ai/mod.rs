pub mod providers;
mod caller;
mod digest;
pub mod schema;
#[cfg(test)]
mod testing;

pub use caller::{GenerationOptions, SchemaCaller, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
pub use digest::{DigestAgent, DigestOutput, DIGEST_SYSTEM_PROMPT, MAX_CONTENT_CHARS};
