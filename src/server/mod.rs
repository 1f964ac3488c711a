//! HTTP side of the bot: receives webhook updates from Telegram.

mod webhook;

pub use webhook::{WebhookServer, process_updates, router};
