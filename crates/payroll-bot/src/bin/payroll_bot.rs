use std::sync::Arc;

use database::Database;
use payroll_bot::console::{console_events, ConsoleSender};
use payroll_bot::{BotConfig, BotOptions, EventRunner, EventSender, PayrollBot};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;
use worker_pool::WorkerPool;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = BotConfig::from_env()?;

    if let Some(dir) = config.database_dir() {
        std::fs::create_dir_all(&dir)?;
    }
    info!("Opening database at {}", config.sqlite_url);
    let db = Arc::new(Database::connect(&config.sqlite_url).await?);
    db.migrate().await?;

    let bot = Arc::new(PayrollBot::with_options(
        db.clone(),
        db.clone(),
        Arc::new(ConsoleSender::new()),
        BotOptions::default().with_max_conversations(config.max_conversations),
    ));
    let pool = Arc::new(WorkerPool::new(config.worker_count, config.queue_size));
    let runner = EventRunner::new(bot, pool);

    info!(
        "Serving console user {} ({}); type /help for commands",
        config.user_id, config.user_name
    );
    let user = EventSender::new(config.user_id, config.user_name.clone());
    let events = console_events(BufReader::new(tokio::io::stdin()), config.user_id, user);

    let handled = runner
        .run_with_shutdown(events, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Handled {} events, shutting down", handled);
    db.close().await;
    Ok(())
}
