//! Command handling module.
//!
//! Commands are registered into a [`Dispatcher`] by name and invoked with
//! the message that carried them. Privileged commands are wrapped in a
//! [`RestrictedCommand`] so that only the configured admin can run them.

mod admin;
mod builtin;
mod command;
mod dispatcher;

pub use admin::RestrictedCommand;
pub use builtin::{PingCommand, RecentUpdatesCommand, StartCommand, WebhookCommand};
pub use command::{Command, CommandError, reply};
pub use dispatcher::{Dispatched, Dispatcher};
