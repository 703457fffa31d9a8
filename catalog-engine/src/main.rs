use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use catalog_engine::config::Config;
use catalog_engine::gateway::HttpCatalogGateway;
use catalog_engine::session::{CatalogSessionArguments, CatalogSessionHandle};

fn load_env_file() {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "Could not determine current directory for .env lookup");
            return;
        }
    };

    let mut current = cwd.clone();
    loop {
        let candidate = current.join(".env");
        if candidate.exists() {
            if let Err(e) = dotenvy::from_path(&candidate) {
                tracing::warn!(path = %candidate.display(), error = %e, "Failed to load .env file");
            } else {
                tracing::info!(path = %candidate.display(), "Loaded environment from .env");
            }
            return;
        }
        if !current.pop() {
            break;
        }
    }

    tracing::debug!(cwd = %cwd.display(), "No .env file found; using process environment only");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    load_env_file();

    let config = Config::from_env()?;
    tracing::info!(
        base_url = %config.api_base_url,
        provider_id = %config.provider_id,
        timeout_secs = config.request_timeout.as_secs(),
        "Starting catalog session"
    );

    let gateway = HttpCatalogGateway::from_config(&config).context("building HTTP client")?;
    let (session, join) = CatalogSessionHandle::spawn(CatalogSessionArguments {
        gateway: Arc::new(gateway),
        label: config.session_label.clone(),
    })
    .await
    .context("spawning catalog session")?;

    let (catalog, procedures) = tokio::join!(session.refresh(), session.refresh_procedures());
    match &catalog {
        Ok(outcome) => tracing::info!(outcome = ?outcome, "Catalog loaded"),
        Err(e) => tracing::error!(error = %e, "Catalog load failed"),
    }
    match &procedures {
        Ok(count) => tracing::info!(procedures = count, "Master procedures loaded"),
        Err(e) => tracing::error!(error = %e, "Master procedure load failed"),
    }

    let view = session.view().await?;
    println!("{}", serde_json::to_string_pretty(&view)?);

    session.stop();
    join.await.context("catalog session task panicked")?;

    catalog?;
    Ok(())
}
