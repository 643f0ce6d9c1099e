// Entry point for the interactive job tracker

use std::process::ExitCode;

use anyhow::{Context, Result};
use job_tracker::{
    Config, FieldExtractor, HttpFetcher, JobStore, OpenAiExtractor, TerminalPrompter, Tracker,
    UnavailableExtractor,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_tracker=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        tracing::error!("{:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let store = JobStore::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    let fetcher =
        HttpFetcher::new(config.fetch_timeout).context("Failed to build HTTP client")?;

    let extractor: Box<dyn FieldExtractor> = match OpenAiExtractor::from_config(&config) {
        Ok(extractor) => Box::new(extractor),
        Err(e) => {
            tracing::error!(error = %e, "Extraction disabled; listings will need manual entry");
            Box::new(UnavailableExtractor::missing_credential("OPENAI_API_KEY"))
        }
    };

    let mut tracker = Tracker::new(store, Box::new(fetcher), extractor, TerminalPrompter::new());
    tracker
        .run()
        .await
        .context("Failed to close the database connection")
}
