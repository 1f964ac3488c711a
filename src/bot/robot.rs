//! The robot: root object tying the transport, commands and update handling.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::store::UpdatesStore;
use crate::commands::{Command, CommandError, Dispatched, Dispatcher};
use crate::config::{ConfigError, validate_token};
use crate::telegram::{
    BotApi, Message, OutgoingMessage, TelegramError, Transport, Update, WebhookInfo,
};

/// Robot face, as an HTML entity.
pub const EMOJI_ROBOT: &str = "&#x1F916;";

/// Thinking face, as an HTML entity.
pub const EMOJI_THINKING_FACE: &str = "&#x1F914;";

/// Errors surfaced by [`Robot::handle`].
///
/// Everything that happens after the payload is parsed is contained and
/// logged instead.
#[derive(Debug, Error)]
pub enum HandleError {
    #[error("Failed to deserialize update: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Webhook bot that dispatches bot commands to registered handlers.
pub struct Robot {
    /// The single user allowed to run admin commands.
    admin_id: i64,

    /// Outbound Bot API transport.
    transport: Arc<dyn Transport>,

    /// Registered commands.
    dispatcher: Dispatcher,

    /// Optional audit sink for inbound updates.
    store: Option<Arc<dyn UpdatesStore>>,
}

impl Robot {
    /// Creates a robot talking to the public Bot API.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or malformed.
    pub fn new(token: &str, admin_id: i64) -> Result<Self, ConfigError> {
        validate_token(token)?;

        Ok(Self::with_transport(admin_id, Arc::new(BotApi::new(token))))
    }

    /// Creates a robot over an arbitrary transport.
    #[must_use]
    pub fn with_transport(admin_id: i64, transport: Arc<dyn Transport>) -> Self {
        Self {
            admin_id,
            dispatcher: Dispatcher::new(admin_id, Arc::clone(&transport)),
            transport,
            store: None,
        }
    }

    pub const fn admin_id(&self) -> i64 {
        self.admin_id
    }

    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Registers a command, replacing any previous one with the same name.
    pub fn add_command<C: Command + 'static>(&mut self, command: C) {
        if self.dispatcher.register(command).is_some() {
            debug!("Replaced a previously registered command");
        }
    }

    pub fn set_updates_store(&mut self, store: Arc<dyn UpdatesStore>) {
        self.store = Some(store);
    }

    /// Sends a plain text message, to the admin chat unless `chat_id` is given.
    pub async fn send_message(
        &self,
        text: &str,
        chat_id: Option<i64>,
    ) -> Result<i64, TelegramError> {
        let chat_id = chat_id.unwrap_or(self.admin_id);
        self.transport
            .send_message(&OutgoingMessage::text(chat_id, text))
            .await
    }

    pub async fn set_webhook(
        &self,
        url: &str,
        certificate: Option<&Path>,
    ) -> Result<(), TelegramError> {
        self.transport.set_webhook(url, certificate).await
    }

    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, TelegramError> {
        self.transport.get_webhook_info().await
    }

    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        self.transport.delete_webhook().await
    }

    /// Handles one raw webhook payload.
    ///
    /// Every bot-command entity of the message is dispatched in order. Only
    /// a payload that does not parse as an update is reported to the
    /// caller; command failures are answered or logged here.
    pub async fn handle(&self, raw: Value) -> Result<(), HandleError> {
        info!(payload = %raw, "Webhook update received");

        let update: Update = serde_json::from_value(raw.clone())?;

        if let Some(store) = &self.store
            && let Err(e) = store.save_update(&update, &raw).await
        {
            warn!(update_id = update.update_id, "Failed to store update: {e:#}");
        }

        let Some(message) = &update.message else {
            error!(update_id = update.update_id, "Telegram update without message");
            return Ok(());
        };

        let Some(chat_id) = message.chat_id() else {
            let snapshot = serde_json::to_string(message).unwrap_or_default();
            error!(message = %snapshot, "Message without chat");
            return Ok(());
        };

        for entity in message.bot_commands() {
            let name = entity.command_name(message.text());
            self.execute_command(message, chat_id, &name).await;
        }

        Ok(())
    }

    async fn execute_command(&self, message: &Message, chat_id: i64, name: &str) {
        match self.dispatcher.dispatch(message, name).await {
            Ok(Dispatched::Executed) => debug!("Command '{}' executed", name),
            Ok(Dispatched::UnknownCommand) => {
                let text = self.unknown_command_text(message.sender_id());
                self.reply(OutgoingMessage::html(chat_id, text)).await;
            }
            Err(denied @ CommandError::AccessDenied { .. }) => {
                let text = format!("Who are you? {EMOJI_THINKING_FACE}");
                self.reply(OutgoingMessage::html(chat_id, text)).await;

                let snapshot = serde_json::to_string(message).unwrap_or_default();
                warn!(command = name, message = %snapshot, "{denied}");
            }
            Err(CommandError::Failed(e)) => {
                error!(command = name, "Command failed: {e:#}");
            }
        }
    }

    fn unknown_command_text(&self, sender_id: Option<i64>) -> String {
        let appeal = if sender_id == Some(self.admin_id) {
            ", master"
        } else {
            ""
        };
        format!("I don't know that command{appeal} {EMOJI_ROBOT}")
    }

    async fn reply(&self, message: OutgoingMessage) {
        if let Err(e) = self.transport.send_message(&message).await {
            error!(chat_id = message.chat_id, "Failed to send reply: {e}");
        }
    }
}

impl std::fmt::Debug for Robot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Robot")
            .field("admin_id", &self.admin_id)
            .field("dispatcher", &self.dispatcher)
            .field("store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
