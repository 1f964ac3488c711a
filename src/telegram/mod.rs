//! Telegram Bot API module.
//!
//! Provides the serde model of inbound updates and the outbound transport
//! used to send replies and manage the webhook.

mod client;
mod types;

pub use client::{BotApi, DEFAULT_API_URL, Transport, TelegramError};
pub use types::{
    ApiResponse, BOT_COMMAND_ENTITY, Chat, Message, MessageEntity, OutgoingMessage, ParseMode,
    SentMessage, Update, User, WebhookInfo,
};
