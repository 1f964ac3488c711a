//! Test doubles shared by unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, Layer, Layered, SubscriberExt};

use crate::commands::{Command, CommandError, reply};
use crate::telegram::{
    BOT_COMMAND_ENTITY, Chat, Message, MessageEntity, OutgoingMessage, TelegramError, Transport,
    User, WebhookInfo,
};

/// Transport that records outbound messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingMessage>>,
    webhook: Mutex<Option<String>>,
    webhook_info: WebhookInfo,
}

impl RecordingTransport {
    pub fn with_webhook_info(webhook_info: WebhookInfo) -> Self {
        Self {
            webhook_info,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn webhook(&self) -> Option<String> {
        self.webhook.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<i64, TelegramError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(i64::try_from(sent.len()).unwrap())
    }

    async fn set_webhook(
        &self,
        url: &str,
        _certificate: Option<&Path>,
    ) -> Result<(), TelegramError> {
        *self.webhook.lock().unwrap() = Some(url.to_owned());
        Ok(())
    }

    async fn get_webhook_info(&self) -> Result<WebhookInfo, TelegramError> {
        Ok(self.webhook_info.clone())
    }

    async fn delete_webhook(&self) -> Result<(), TelegramError> {
        *self.webhook.lock().unwrap() = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Succeed,
    Reply,
    Fail,
    Panic,
}

/// Command that counts its invocations.
pub struct CountingCommand {
    name: String,
    gated: bool,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl CountingCommand {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            gated: false,
            behavior: Behavior::Succeed,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn admin_only(name: &str) -> Self {
        Self {
            gated: true,
            ..Self::new(name)
        }
    }

    pub fn replying(name: &str) -> Self {
        Self {
            behavior: Behavior::Reply,
            ..Self::new(name)
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            behavior: Behavior::Fail,
            ..Self::new(name)
        }
    }

    pub fn panicking(name: &str) -> Self {
        Self {
            behavior: Behavior::Panic,
            ..Self::new(name)
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Command for CountingCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn needs_admin_gate(&self) -> bool {
        self.gated
    }

    async fn execute(
        &self,
        message: &Message,
        transport: &dyn Transport,
    ) -> Result<(), CommandError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Reply => reply(transport, message, format!("ran {}", self.name)).await,
            Behavior::Fail => Err(anyhow::anyhow!("{} exploded", self.name).into()),
            Behavior::Panic => panic!("{} blew up", self.name),
        }
    }
}

/// Builds a message whose text is `text`, with a bot-command entity for
/// every whitespace-separated word starting with `/`.
pub fn message_from(sender: Option<i64>, chat: Option<i64>, text: &str) -> Message {
    let mut entities = Vec::new();
    let mut offset = 0;
    for word in text.split(' ') {
        let length = word.encode_utf16().count();
        if word.starts_with('/') {
            entities.push(MessageEntity {
                kind: BOT_COMMAND_ENTITY.to_owned(),
                offset,
                length,
            });
        }
        offset += length + 1;
    }

    Message {
        message_id: 1,
        from: sender.map(|id| User {
            id,
            first_name: "Test".to_owned(),
            ..User::default()
        }),
        chat: chat.map(|id| Chat {
            id,
            chat_type: Some("private".to_owned()),
        }),
        text: Some(text.to_owned()),
        entities,
    }
}

/// Counts emitted tracing events per level.
#[derive(Debug, Clone, Default)]
pub struct LevelCounter {
    counts: Arc<Mutex<HashMap<Level, usize>>>,
}

impl LevelCounter {
    pub fn count(&self, level: Level) -> usize {
        self.counts.lock().unwrap().get(&level).copied().unwrap_or(0)
    }

    /// Subscriber feeding this counter, for `tracing::subscriber::set_default`.
    pub fn subscriber(&self) -> Layered<Self, Registry> {
        Registry::default().with(self.clone())
    }
}

impl<S: Subscriber> Layer<S> for LevelCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(*event.metadata().level())
            .or_insert(0) += 1;
    }
}
