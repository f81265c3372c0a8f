mod database;
mod transient;

pub use database::{redact_url, resolve_database_url, Database, DatabaseKind, Session};
pub use transient::is_transient_error;
