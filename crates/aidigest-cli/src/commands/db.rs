use anyhow::Result;

use aidigest_core::storage::{redact_url, resolve_database_url, Database};
use aidigest_core::AppConfig;

pub fn url(config: &AppConfig) -> Result<()> {
    println!("{}", redact_url(&resolve_database_url(config)));
    Ok(())
}

pub async fn check(config: &AppConfig) -> Result<()> {
    let url = resolve_database_url(config);
    println!("Connecting to {}...", redact_url(&url));

    let db = Database::connect(config).await?;
    db.ping().await?;
    db.close().await;

    println!("OK ({})", db.kind().as_str());
    Ok(())
}
