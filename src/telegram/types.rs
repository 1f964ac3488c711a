//! Serde types for the Telegram Bot API.
//!
//! Only the fields the bot reads are modelled. Unknown fields in inbound
//! payloads are ignored, and everything the webhook may omit is an `Option`
//! or defaults to empty.

use serde::{Deserialize, Serialize};

/// Entity type tag marking a bot command span.
pub const BOT_COMMAND_ENTITY: &str = "bot_command";

/// Generic Bot API response wrapper.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub description: Option<String>,
    pub result: Option<T>,
}

/// A single inbound event delivered to the webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// A Telegram message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Option<Chat>,
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

impl Message {
    /// Message text, or an empty string for non-text messages.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Identity of the sender, if the message has one.
    pub fn sender_id(&self) -> Option<i64> {
        self.from.as_ref().map(|u| u.id)
    }

    /// Identity of the chat the message was posted in.
    pub fn chat_id(&self) -> Option<i64> {
        self.chat.as_ref().map(|c| c.id)
    }

    /// Entities tagged as bot commands, in message order.
    pub fn bot_commands(&self) -> impl Iterator<Item = &MessageEntity> {
        self.entities.iter().filter(|e| e.is_bot_command())
    }
}

/// A Telegram user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

/// A Telegram chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: Option<String>,
}

/// An annotated span within message text.
///
/// `offset` and `length` are counted in UTF-16 code units, as reported by
/// the Bot API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
}

impl MessageEntity {
    pub fn is_bot_command(&self) -> bool {
        self.kind == BOT_COMMAND_ENTITY
    }

    /// Extracts the command name covered by this entity from `text`.
    ///
    /// The leading `/` marker is skipped, so the name starts at
    /// `offset + 1` and spans `length - 1` units. Spans running past the end
    /// of the text are clipped, even when they overflow `usize`.
    pub fn command_name(&self, text: &str) -> String {
        let units: Vec<u16> = text.encode_utf16().collect();
        let start = self.offset.saturating_add(1).min(units.len());
        let end = start
            .saturating_add(self.length.saturating_sub(1))
            .min(units.len());
        String::from_utf16_lossy(&units[start..end])
    }
}

/// Text formatting mode of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
}

/// Outbound `sendMessage` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

impl OutgoingMessage {
    /// Plain text message.
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
        }
    }

    /// Message using the HTML subset markup.
    pub fn html(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: Some(ParseMode::Html),
        }
    }
}

/// Sent message result (only `message_id` is needed).
#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

/// Current webhook status as reported by `getWebhookInfo`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub has_custom_certificate: bool,
    #[serde(default)]
    pub pending_update_count: u64,
    pub last_error_date: Option<i64>,
    pub last_error_message: Option<String>,
}
