use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Any, Pool};
use std::time::Duration;
use url::Url;

use crate::config::AppConfig;
use crate::Result;

const DEPRECATED_POSTGRES_SCHEME: &str = "postgres://";
const POSTGRES_SCHEME: &str = "postgresql://";
const SQLITE_SCHEME: &str = "sqlite://";

/// A pooled connection owned by the caller; dropping it returns it to the pool
pub type Session = PoolConnection<Any>;

/// Backend selected by a connection URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    Sqlite,
    Other,
}

impl DatabaseKind {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with(POSTGRES_SCHEME) || url.starts_with(DEPRECATED_POSTGRES_SCHEME) {
            DatabaseKind::Postgres
        } else if url.starts_with("sqlite:") {
            DatabaseKind::Sqlite
        } else {
            DatabaseKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Postgres => "postgresql",
            DatabaseKind::Sqlite => "sqlite",
            DatabaseKind::Other => "other",
        }
    }
}

/// Resolve the connection URL from configuration.
///
/// A configured URL wins; its legacy `postgres://` prefix is rewritten to `postgresql://`.
/// Without one, fall back to a local SQLite file.
pub fn resolve_database_url(config: &AppConfig) -> String {
    match config.database.url.as_deref() {
        Some(url) => match url.strip_prefix(DEPRECATED_POSTGRES_SCHEME) {
            Some(rest) => format!("{}{}", POSTGRES_SCHEME, rest),
            None => url.to_string(),
        },
        None => format!("{}{}", SQLITE_SCHEME, config.sqlite_path().display()),
    }
}

/// Replace any password in `url` so it can be logged
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// SQLite URLs get `mode=rwc` so the file is created on first use
fn connect_url(url: &str) -> String {
    if DatabaseKind::from_url(url) == DatabaseKind::Sqlite && !is_in_memory(url) && !url.contains('?') {
        format!("{}?mode=rwc", url)
    } else {
        url.to_string()
    }
}

/// Connection pool wrapper handing out independent sessions
#[derive(Clone)]
pub struct Database {
    pool: Pool<Any>,
    kind: DatabaseKind,
}

impl Database {
    /// Connect using the resolved URL from configuration
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let url = resolve_database_url(config);

        if DatabaseKind::from_url(&url) == DatabaseKind::Sqlite {
            // Ensure the directory holding the database file exists
            if let Some(parent) = config.sqlite_path().parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        Self::connect_url(&url, config.database.max_connections).await
    }

    /// Connect to an explicit URL
    pub async fn connect_url(url: &str, max_connections: u32) -> Result<Self> {
        install_default_drivers();

        let kind = DatabaseKind::from_url(url);
        // Every in-memory SQLite connection is a separate database
        let max_connections = if is_in_memory(url) {
            1
        } else {
            max_connections.max(1)
        };

        tracing::info!(
            backend = kind.as_str(),
            "Connecting to database: {}",
            redact_url(url)
        );

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&connect_url(url))
            .await?;

        Ok(Self { pool, kind })
    }

    /// Create an in-memory database for testing
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self> {
        Self::connect_url("sqlite::memory:", 1).await
    }

    /// Get a new session; the caller releases it by dropping it
    pub async fn session(&self) -> Result<Session> {
        Ok(self.pool.acquire().await?)
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> Result<()> {
        let mut session = self.session().await?;
        sqlx::query("SELECT 1").execute(&mut *session).await?;
        Ok(())
    }

    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }

    /// Get the connection pool
    pub fn pool(&self) -> &Pool<Any> {
        &self.pool
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
