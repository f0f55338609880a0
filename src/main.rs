use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};

use medbuddy::application::services::{DueTaskScanner, NotificationService, ReminderDispatcher};
use medbuddy::infrastructure::config::{AppConfig, startup_log_level};
use medbuddy::infrastructure::database::DatabaseManager;
use medbuddy::infrastructure::notifications::MailgunSender;
use medbuddy::infrastructure::repositories::{SqliteRegimenRepository, SqliteTaskRepository};
use medbuddy::infrastructure::scheduler::{ReminderScheduler, SchedulerConfig};
use medbuddy::utils;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = AppConfig::from_env();
    utils::setup_logging(startup_log_level(&config));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        error!("Error running reminder service: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<()> {
    let db = DatabaseManager::new(&config.database_path)?;
    db.initialize_database().await?;

    let task_repo = Arc::new(SqliteTaskRepository::new(db.clone()));
    let regimen_repo = Arc::new(SqliteRegimenRepository::new(db.clone()));

    let sender = MailgunSender::new(
        &config.mailgun.api_base,
        &config.mailgun.domain,
        &config.mailgun.api_key,
        config.mailgun.timeout_secs,
    )?;
    let notifications = NotificationService::new(Arc::new(sender), config.timezone);

    let dispatcher = Arc::new(ReminderDispatcher::new(task_repo.clone(), regimen_repo, notifications));
    let scanner = DueTaskScanner::new(task_repo, config.lookahead);
    let scheduler = ReminderScheduler::new(
        scanner,
        dispatcher,
        SchedulerConfig {
            scan_interval: config.scan_interval,
        },
    );

    info!("Reminder service running in timezone {}", config.timezone);
    let handle = scheduler.start();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown requested");
    handle.stop().await;
    Ok(())
}
