//! Homework Watcher entry point
//!
//! Loads `.env`, opens the log file, checks credentials and runs the loop
//! until the process is killed.

use anyhow::{Context, Result};
use chrono::Utc;
use homework_watcher::config::{PRACTICUM_TOKEN_VAR, TELEGRAM_CHAT_ID_VAR, TELEGRAM_TOKEN_VAR};
use homework_watcher::logging::{self, LOG_FILE};
use homework_watcher::{Config, Credentials, PracticumClient, TelegramNotifier, Watcher};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Ok if .env does not exist
    dotenvy::dotenv().ok();

    logging::init(LOG_FILE);

    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!(
                severity = "critical",
                "Program failure: {}. Check {}, {}, {}. Program stopped.",
                e,
                PRACTICUM_TOKEN_VAR,
                TELEGRAM_TOKEN_VAR,
                TELEGRAM_CHAT_ID_VAR
            );
            std::process::exit(1);
        }
    };

    let config = Config::new(credentials);
    let source = PracticumClient::new(&config).context("Failed to build homework API client")?;
    let notifier = TelegramNotifier::new(&config).context("Failed to build Telegram client")?;

    info!("Homework watcher starting...");
    Watcher::new(source, notifier, &config, Utc::now().timestamp())
        .run()
        .await;

    Ok(())
}
