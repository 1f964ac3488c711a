//! Bot settings and credential validation.

use std::net::SocketAddr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shape of a Bot API token: `<bot id>:<secret>`.
#[allow(clippy::expect_used)]
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:[\w-]+$").expect("token regex"));

/// Bot configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API token issued by `@BotFather`.
    pub token: String,

    /// User ID allowed to run admin commands.
    pub admin_id: i64,

    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value, if any.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Address the webhook receiver binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// HTTP path the webhook receiver serves.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Number of recent updates kept for auditing.
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8443))
}

fn default_webhook_path() -> String {
    "/webhook".to_owned()
}

fn default_audit_capacity() -> usize {
    100
}

impl BotConfig {
    /// Creates a configuration with default server settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or malformed.
    pub fn new(token: String, admin_id: i64) -> Result<Self, ConfigError> {
        validate_token(&token)?;

        Ok(Self {
            token,
            admin_id,
            webhook_secret: None,
            listen_addr: default_listen_addr(),
            webhook_path: default_webhook_path(),
            audit_capacity: default_audit_capacity(),
        })
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN` and `BOT_ADMIN_ID` to be set. `WEBHOOK_SECRET`,
    /// `LISTEN_ADDR`, `WEBHOOK_PATH` and `AUDIT_CAPACITY` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("BOT_TOKEN").ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        let admin_id: i64 = lookup("BOT_ADMIN_ID")
            .ok_or(ConfigError::MissingEnvVar("BOT_ADMIN_ID"))?
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAdminId)?;

        let mut config = Self::new(token, admin_id)?;

        config.webhook_secret = lookup("WEBHOOK_SECRET").filter(|s| !s.is_empty());

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr
                .parse()
                .map_err(|_| ConfigError::InvalidListenAddr(addr))?;
        }

        if let Some(path) = lookup("WEBHOOK_PATH") {
            config.webhook_path = if path.starts_with('/') {
                path
            } else {
                format!("/{path}")
            };
        }

        if let Some(capacity) = lookup("AUDIT_CAPACITY") {
            config.audit_capacity = capacity
                .trim()
                .parse()
                .ok()
                .filter(|&n: &usize| n > 0)
                .ok_or(ConfigError::InvalidAuditCapacity(capacity))?;
        }

        Ok(config)
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("admin_id", &self.admin_id)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("listen_addr", &self.listen_addr)
            .field("webhook_path", &self.webhook_path)
            .field("audit_capacity", &self.audit_capacity)
            .finish()
    }
}

/// Checks that `token` looks like a Bot API token.
pub fn validate_token(token: &str) -> Result<(), ConfigError> {
    if token.is_empty() {
        return Err(ConfigError::MissingToken);
    }

    if !TOKEN_RE.is_match(token) {
        return Err(ConfigError::InvalidToken);
    }

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("API key not defined")]
    MissingToken,

    #[error("Invalid API key")]
    InvalidToken,

    #[error("Invalid admin ID (must be an integer user ID)")]
    InvalidAdminId,

    #[error("Invalid listen address: {0}")]
    InvalidListenAddr(String),

    #[error("Invalid audit capacity (must be a positive integer): {0}")]
    InvalidAuditCapacity(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const TOKEN: &str = "123456:ABC-def_ghi";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_validate_token() {
        assert!(validate_token(TOKEN).is_ok());
        assert!(matches!(validate_token(""), Err(ConfigError::MissingToken)));
        assert!(matches!(validate_token("abc"), Err(ConfigError::InvalidToken)));
        assert!(matches!(validate_token("abc:def"), Err(ConfigError::InvalidToken)));
        assert!(matches!(validate_token("123:"), Err(ConfigError::InvalidToken)));
        assert!(matches!(validate_token("123:abc def"), Err(ConfigError::InvalidToken)));
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", TOKEN), ("BOT_ADMIN_ID", "42")]))
            .unwrap();
        assert_eq!(config.admin_id, 42);
        assert_eq!(config.webhook_secret, None);
        assert_eq!(config.listen_addr, default_listen_addr());
        assert_eq!(config.webhook_path, "/webhook");
        assert_eq!(config.audit_capacity, 100);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = BotConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", TOKEN),
            ("BOT_ADMIN_ID", " -7 "),
            ("WEBHOOK_SECRET", "s3cret"),
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("WEBHOOK_PATH", "hook"),
            ("AUDIT_CAPACITY", "5"),
        ]))
        .unwrap();
        assert_eq!(config.admin_id, -7);
        assert_eq!(config.webhook_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.webhook_path, "/hook");
        assert_eq!(config.audit_capacity, 5);
    }

    #[test]
    fn test_from_lookup_errors() {
        assert!(matches!(
            BotConfig::from_lookup(lookup(&[("BOT_ADMIN_ID", "1")])),
            Err(ConfigError::MissingEnvVar("BOT_TOKEN"))
        ));
        assert!(matches!(
            BotConfig::from_lookup(lookup(&[("BOT_TOKEN", TOKEN)])),
            Err(ConfigError::MissingEnvVar("BOT_ADMIN_ID"))
        ));
        assert!(matches!(
            BotConfig::from_lookup(lookup(&[("BOT_TOKEN", TOKEN), ("BOT_ADMIN_ID", "x")])),
            Err(ConfigError::InvalidAdminId)
        ));
        assert!(matches!(
            BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "bad"), ("BOT_ADMIN_ID", "1")])),
            Err(ConfigError::InvalidToken)
        ));
        assert!(matches!(
            BotConfig::from_lookup(lookup(&[
                ("BOT_TOKEN", TOKEN),
                ("BOT_ADMIN_ID", "1"),
                ("LISTEN_ADDR", "nowhere"),
            ])),
            Err(ConfigError::InvalidListenAddr(_))
        ));
    }

    #[test]
    fn test_from_lookup_rejects_bad_audit_capacity() {
        for bad in ["lots", "-3", "0", ""] {
            let result = BotConfig::from_lookup(lookup(&[
                ("BOT_TOKEN", TOKEN),
                ("BOT_ADMIN_ID", "1"),
                ("AUDIT_CAPACITY", bad),
            ]));
            assert!(
                matches!(&result, Err(ConfigError::InvalidAuditCapacity(v)) if v == bad),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = BotConfig::new(TOKEN.to_owned(), 1).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("ABC-def"));
    }
}
