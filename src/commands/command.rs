//! The command capability and its error type.

use async_trait::async_trait;
use thiserror::Error;

use crate::telegram::{Message, OutgoingMessage, TelegramError, Transport};

/// Failure of a command invocation.
///
/// The robot answers `AccessDenied` with a fixed reply and only logs
/// `Failed`, so the two are kept apart at the type level.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The sender is absent or is not the configured admin.
    #[error(
        "Access Denied for user ID:{}",
        .user_id.map_or_else(|| "null".to_owned(), |id| id.to_string())
    )]
    AccessDenied { user_id: Option<i64> },

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl From<TelegramError> for CommandError {
    fn from(err: TelegramError) -> Self {
        Self::Failed(err.into())
    }
}

/// A named unit of behavior invoked with a message.
#[async_trait]
pub trait Command: Send + Sync {
    /// Registry key, without the leading `/`.
    fn name(&self) -> &str;

    /// Whether the dispatcher must wrap this command in the admin gate.
    fn needs_admin_gate(&self) -> bool {
        false
    }

    async fn execute(&self, message: &Message, transport: &dyn Transport)
    -> Result<(), CommandError>;
}

/// Sends an HTML reply to the chat `message` came from.
pub async fn reply(
    transport: &dyn Transport,
    message: &Message,
    text: impl Into<String> + Send,
) -> Result<(), CommandError> {
    let chat_id = message
        .chat_id()
        .ok_or_else(|| anyhow::anyhow!("cannot reply to a message without chat"))?;

    transport
        .send_message(&OutgoingMessage::html(chat_id, text))
        .await?;
    Ok(())
}
