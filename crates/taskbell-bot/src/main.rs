use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use taskbell_bot::bot::BotLoop;
use taskbell_bot::commands::CommandHandler;
use taskbell_bot::config::BotConfig;
use taskbell_bot::scheduler::ReminderScheduler;
use taskbell_bot::telegram::TelegramClient;
use taskbell_core::clock::{Clock, SystemClock};
use taskbell_db::{Database, SqliteDatabase};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = BotConfig::parse()
        .into_settings()
        .context("invalid configuration")?;
    info!("taskbell starting");
    info!(
        "time zone: {}, reminder lead: {}min, admin chat: {}",
        settings.zone.name(),
        settings.scheduler.lead.num_minutes(),
        settings
            .scheduler
            .admin_chat
            .map_or_else(|| "none".to_string(), |c| c.to_string())
    );

    let db: Arc<dyn Database> =
        Arc::new(SqliteDatabase::open(&settings.db).context("failed to open task database")?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let client = Arc::new(TelegramClient::new(
        &settings.api_url,
        &settings.token,
        settings.scheduler.send_timeout + Duration::from_secs(5),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Arc::new(ReminderScheduler::new(
        db.clone(),
        client.clone(),
        clock.clone(),
        settings.scheduler.clone(),
    ));
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    let handler = CommandHandler::new(db, clock, settings.zone);
    let bot = BotLoop::new(client, handler, settings.poll_timeout_secs);
    let bot_handle = tokio::spawn(bot.run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);

    for (name, handle) in [("scheduler", scheduler_handle), ("bot", bot_handle)] {
        if let Err(e) = handle.await {
            error!("{name} task panicked: {e}");
        }
    }
    info!("taskbell stopped");
    Ok(())
}
