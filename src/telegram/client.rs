//! Bot API transport.
//!
//! [`Transport`] is the narrow interface commands and the robot use to talk
//! to Telegram; [`BotApi`] implements it over HTTPS with reqwest.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, multipart};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{ApiResponse, OutgoingMessage, SentMessage, WebhookInfo};

/// Default Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Errors that can occur during Bot API calls.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bot API error: {0}")]
    Api(String),

    #[error("Cannot open {path}: {source}")]
    Certificate {
        path: String,
        source: std::io::Error,
    },
}

/// Outbound side of the Bot API used by the robot and its commands.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a message, returning the new message's ID.
    async fn send_message(&self, message: &OutgoingMessage) -> Result<i64, TelegramError>;

    /// Points the bot's webhook at `url`, optionally uploading a
    /// self-signed certificate.
    async fn set_webhook(&self, url: &str, certificate: Option<&Path>)
    -> Result<(), TelegramError>;

    async fn get_webhook_info(&self) -> Result<WebhookInfo, TelegramError>;

    async fn delete_webhook(&self) -> Result<(), TelegramError>;
}

/// Telegram Bot API client.
pub struct BotApi {
    client: Client,
    base_url: String,
}

impl BotApi {
    /// Creates a client for the given bot token.
    pub fn new(token: &str) -> Self {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    /// Creates a client against a custom base URL (local Bot API server, tests).
    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/bot{}", base_url.trim_end_matches('/'), token),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TelegramError> {
        let api_resp: ApiResponse<T> = request.send().await?.json().await?;
        if !api_resp.ok {
            let desc = api_resp.description.unwrap_or_default();
            warn!("{method} failed: {desc}");
            return Err(TelegramError::Api(desc));
        }

        api_resp
            .result
            .ok_or_else(|| TelegramError::Api(format!("{method} returned no result")))
    }
}

#[async_trait]
impl Transport for BotApi {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<i64, TelegramError> {
        debug!("sendMessage to chat_id={}", message.chat_id);

        let request = self.client.post(self.method_url("sendMessage")).json(message);
        let sent: SentMessage = self.call("sendMessage", request).await?;

        Ok(sent.message_id)
    }

    async fn set_webhook(
        &self,
        url: &str,
        certificate: Option<&Path>,
    ) -> Result<(), TelegramError> {
        debug!("setWebhook url={url}");

        let request = self.client.post(self.method_url("setWebhook"));
        let request = match certificate {
            Some(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| TelegramError::Certificate {
                        path: path.display().to_string(),
                        source,
                    })?;
                let file_name = path.file_name().map_or_else(
                    || "certificate.pem".to_owned(),
                    |n| n.to_string_lossy().into_owned(),
                );
                let form = multipart::Form::new()
                    .text("url", url.to_owned())
                    .part("certificate", multipart::Part::bytes(bytes).file_name(file_name));
                request.multipart(form)
            }
            None => request.json(&json!({ "url": url })),
        };

        let _: bool = self.call("setWebhook", request).await?;
        Ok(())
    }

    async fn get_webhook_info(&self) -> Result<WebhookInfo, TelegramError> {
        let request = self.client.get(self.method_url("getWebhookInfo"));
        self.call("getWebhookInfo", request).await
    }

    async fn delete_webhook(&self) -> Result<(), TelegramError> {
        let request = self.client.post(self.method_url("deleteWebhook"));
        let _: bool = self.call("deleteWebhook", request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for BotApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // base_url embeds the token
        f.debug_struct("BotApi").finish_non_exhaustive()
    }
}
