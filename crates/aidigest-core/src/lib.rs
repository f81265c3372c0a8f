//! Schema-validated article digests from Gemini, plus configuration-driven database setup.

pub mod ai;
pub mod config;
pub mod error;
pub mod storage;

pub use ai::{DigestAgent, DigestOutput, GenerationOptions, SchemaCaller};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use storage::Database;
