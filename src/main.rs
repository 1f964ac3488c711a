//! Webhook Command Bot - Main Entry Point
//!
//! Runs the Telegram webhook receiver and provides webhook management
//! helpers for the configured bot.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use webhook_command_bot::bot::{MemoryUpdatesStore, Robot};
use webhook_command_bot::commands::{
    PingCommand, RecentUpdatesCommand, StartCommand, WebhookCommand,
};
use webhook_command_bot::config::BotConfig;
use webhook_command_bot::server::WebhookServer;

/// Telegram webhook bot with admin-gated commands.
#[derive(Parser, Debug)]
#[command(name = "command_bot")]
#[command(about = "Dispatch Telegram bot commands received via webhook")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run the webhook receiver.
    Serve,

    /// Register the webhook URL with Telegram.
    SetWebhook {
        /// Public HTTPS URL Telegram should post updates to.
        #[arg(long)]
        url: String,

        /// Self-signed certificate to upload.
        #[arg(long)]
        certificate: Option<PathBuf>,
    },

    /// Show the current webhook status.
    WebhookInfo,

    /// Remove the webhook.
    DeleteWebhook,

    /// Send a text message (to the admin unless a chat is given).
    Send {
        text: String,

        #[arg(long, allow_hyphen_values = true)]
        chat_id: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let config =
        BotConfig::from_env().context("Failed to load bot configuration from environment")?;
    debug!("Loaded {:?}", config);

    let robot = Robot::new(&config.token, config.admin_id).context("Failed to create robot")?;

    match args.command {
        Cmd::Serve => serve(robot, &config).await?,
        Cmd::SetWebhook { url, certificate } => {
            robot
                .set_webhook(&url, certificate.as_deref())
                .await
                .context("Failed to set webhook")?;
            println!("✓ Webhook set to {url}");
        }
        Cmd::WebhookInfo => {
            let info = robot
                .get_webhook_info()
                .await
                .context("Failed to get webhook info")?;
            let url = if info.url.is_empty() {
                "(not set)"
            } else {
                info.url.as_str()
            };
            println!("URL: {url}");
            println!("Custom certificate: {}", info.has_custom_certificate);
            println!("Pending updates: {}", info.pending_update_count);
            if let Some(error) = info.last_error_message {
                println!("Last error: {error}");
            }
        }
        Cmd::DeleteWebhook => {
            robot.delete_webhook().await.context("Failed to delete webhook")?;
            println!("✓ Webhook deleted");
        }
        Cmd::Send { text, chat_id } => {
            let message_id = robot
                .send_message(&text, chat_id)
                .await
                .context("Failed to send message")?;
            println!("✓ Sent message {message_id}");
        }
    }

    Ok(())
}

/// Registers the stock commands and runs the webhook receiver.
async fn serve(mut robot: Robot, config: &BotConfig) -> Result<()> {
    let store = Arc::new(MemoryUpdatesStore::new(config.audit_capacity));
    robot.set_updates_store(store.clone());

    robot.add_command(StartCommand);
    robot.add_command(PingCommand::new());
    robot.add_command(WebhookCommand);
    robot.add_command(RecentUpdatesCommand::new(store));

    info!(
        "Registered commands: {}",
        robot.dispatcher().command_names().join(", ")
    );

    let server = WebhookServer::new(
        config.listen_addr,
        config.webhook_path.clone(),
        config.webhook_secret.clone(),
    );

    info!("Starting command bot (admin: {})...", config.admin_id);
    server
        .run(robot, shutdown_signal())
        .await
        .context("Webhook server failed")?;

    info!("Shut down cleanly");
    Ok(())
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down...");
    }
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
