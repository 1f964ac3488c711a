//! Stock commands registered by the binary.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::command::{Command, CommandError, reply};
use crate::bot::MemoryUpdatesStore;
use crate::telegram::{Message, Transport};

/// `/start`: public greeting.
#[derive(Debug, Default)]
pub struct StartCommand;

#[async_trait]
impl Command for StartCommand {
    fn name(&self) -> &str {
        "start"
    }

    async fn execute(
        &self,
        message: &Message,
        transport: &dyn Transport,
    ) -> Result<(), CommandError> {
        let name = message
            .from
            .as_ref()
            .map(|u| escape_html(&u.first_name))
            .filter(|n| !n.is_empty());

        let text = match name {
            Some(name) => format!("Hello, <b>{name}</b>! {}", crate::bot::EMOJI_ROBOT),
            None => format!("Hello! {}", crate::bot::EMOJI_ROBOT),
        };
        reply(transport, message, text).await
    }
}

/// `/ping`: admin only, reports uptime.
#[derive(Debug)]
pub struct PingCommand {
    started_at: DateTime<Utc>,
}

impl PingCommand {
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    pub const fn started_at(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }
}

impl Default for PingCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for PingCommand {
    fn name(&self) -> &str {
        "ping"
    }

    fn needs_admin_gate(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        message: &Message,
        transport: &dyn Transport,
    ) -> Result<(), CommandError> {
        let uptime = (Utc::now() - self.started_at).num_seconds().max(0).unsigned_abs();
        reply(transport, message, format!("pong (up {})", format_duration(uptime))).await
    }
}

/// `/webhook`: admin only, reports the webhook status.
#[derive(Debug, Default)]
pub struct WebhookCommand;

#[async_trait]
impl Command for WebhookCommand {
    fn name(&self) -> &str {
        "webhook"
    }

    fn needs_admin_gate(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        message: &Message,
        transport: &dyn Transport,
    ) -> Result<(), CommandError> {
        let info = transport.get_webhook_info().await?;

        let url = if info.url.is_empty() {
            "not set".to_owned()
        } else {
            escape_html(&info.url)
        };
        let mut lines = vec![
            format!("Webhook: {url}"),
            format!("Pending updates: {}", info.pending_update_count),
        ];
        if let Some(error) = &info.last_error_message {
            lines.push(format!("Last error: {}", escape_html(&truncate(error, 80))));
        }

        reply(transport, message, lines.join("\n")).await
    }
}

/// `/updates`: admin only, summarizes the in-memory update audit trail.
#[derive(Debug)]
pub struct RecentUpdatesCommand {
    store: Arc<MemoryUpdatesStore>,
}

impl RecentUpdatesCommand {
    pub const fn new(store: Arc<MemoryUpdatesStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Command for RecentUpdatesCommand {
    fn name(&self) -> &str {
        "updates"
    }

    fn needs_admin_gate(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        message: &Message,
        transport: &dyn Transport,
    ) -> Result<(), CommandError> {
        let text = match self.store.latest().await {
            Some(last) => format!(
                "Stored updates: {}\nLast: #{} at {}",
                self.store.len().await,
                last.update_id,
                last.received_at.format("%Y-%m-%d %H:%M:%S UTC"),
            ),
            None => "No updates stored.".to_owned(),
        };
        reply(transport, message, text).await
    }
}

/// Escapes text for the HTML parse mode.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Truncates a string to a maximum length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

/// Formats a duration in seconds to a human-readable string.
fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 {
            format!("{hours}h")
        } else {
            format!("{hours}h {mins}m")
        }
    } else {
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3600;
        format!("{days}d {hours}h")
    }
}
