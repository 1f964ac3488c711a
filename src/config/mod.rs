//! Configuration module for the bot.
//!
//! Loads the Bot API credentials, the admin identity, and webhook
//! receiver settings from the environment.

mod settings;

pub use settings::{BotConfig, ConfigError, validate_token};
