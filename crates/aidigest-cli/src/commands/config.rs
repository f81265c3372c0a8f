use std::path::Path;

use anyhow::{bail, Result};

use aidigest_core::AppConfig;

pub fn path() -> Result<()> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

/// Write defaults; secrets come from the environment, not this file
pub fn init(force: bool) -> Result<()> {
    let path = AppConfig::config_path();
    init_at(&path, force)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn init_at(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    AppConfig::default().save_to(path)?;
    Ok(())
}
