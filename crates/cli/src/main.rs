//! ferry entry point.
//!
//! Loads configuration, asks for any destination credentials that are not
//! configured, and runs the pipeline once. Logging goes to stderr so the
//! prompts stay readable.

use anyhow::Result;
use ferry_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod credentials;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load()?;
    let creds = credentials::resolve(&config.database)?;
    let destination = config.database.uri(&creds.username, &creds.password)?;

    let summary = ferry_client::run_with_config(&config, &destination).await?;

    tracing::info!(documents = summary.documents, tables = ?summary.tables, "done");

    Ok(())
}
