//! Webhook Command Bot Library
//!
//! A minimal Telegram Bot API framework driven by webhooks.
//!
//! This crate provides the core functionality for:
//! - Registering named commands and dispatching bot-command entities to them
//! - Restricting privileged commands to a single admin user
//! - Receiving webhook updates and replying through the Bot API

pub mod bot;
pub mod commands;
pub mod config;
pub mod server;
pub mod telegram;

#[cfg(test)]
mod testing;
