use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncReadExt;

use aidigest_core::{AppConfig, DigestAgent};

pub struct DigestArgs {
    pub title: String,
    pub article_type: String,
    pub file: Option<PathBuf>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub json: bool,
}

async fn read_content(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut content = String::new();
            tokio::io::stdin()
                .read_to_string(&mut content)
                .await
                .context("failed to read content from stdin")?;
            Ok(content)
        }
    }
}

pub async fn run(config: &AppConfig, args: DigestArgs) -> Result<()> {
    let content = read_content(args.file.as_ref()).await?;
    if content.trim().is_empty() {
        bail!("no content to digest");
    }
    tracing::debug!(chars = content.chars().count(), "Read content");

    let mut agent = DigestAgent::from_config(config)?;
    if args.model.is_some() || args.temperature.is_some() {
        let mut options = agent.options().clone();
        if let Some(model) = args.model {
            options = options.with_model(model);
        }
        if let Some(temperature) = args.temperature {
            options = options.with_temperature(temperature);
        }
        agent = agent.with_options(options);
    }

    let Some(digest) = agent
        .generate_digest(&args.title, &content, &args.article_type)
        .await
    else {
        bail!("no digest produced for \"{}\"", args.title);
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&digest)?);
    } else {
        println!("{}\n", digest.title);
        println!("{}", digest.summary);
    }

    Ok(())
}
