//! Decision Genie terminal entry point.

use std::sync::Arc;

use decision_genie::adapters::storage::FileLocalStorage;
use decision_genie::adapters::terminal::TerminalSession;
use decision_genie::application::{DecisionAiClient, DecisionWizard, HistoryStore};
use decision_genie::config::AppConfig;
use decision_genie::ports::LocalStorage;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DECISION_GENIE_LOG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the screen on stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .try_init()
        .ok();

    let config = AppConfig::load()?;
    config.validate()?;

    let storage_path = config.storage.local_storage_path();
    tracing::info!(path = %storage_path.display(), model = %config.ai.model, "starting decision genie");

    let storage: Arc<dyn LocalStorage> = Arc::new(FileLocalStorage::at_path(&storage_path));
    let client = Arc::new(DecisionAiClient::new(
        Arc::new(config.ai.connector()),
        Arc::clone(&storage),
        config.ai.env_api_key(),
    ));
    if !client.is_initialized() {
        tracing::warn!(key_source = %client.api_key_source(), "AI client not initialized");
    }

    let wizard = Arc::new(DecisionWizard::new(
        client,
        HistoryStore::new(storage),
        config.limits.session_limits(),
    ));

    let export_dir = std::env::current_dir()?;
    let session = TerminalSession::new(wizard, export_dir);
    session
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    Ok(())
}
