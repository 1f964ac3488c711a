//! Command registry and routing.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::debug;

use super::admin::RestrictedCommand;
use super::command::{Command, CommandError};
use crate::telegram::{Message, Transport};

/// Outcome of a dispatch that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// A registered command ran to completion.
    Executed,

    /// No command is registered under the requested name.
    UnknownCommand,
}

/// Owns the command registry and routes messages to commands.
///
/// Built once at startup; lookups afterwards are read-only.
pub struct Dispatcher {
    /// Identity injected into admin-gated commands.
    admin_id: i64,

    /// Outbound transport handed to every command.
    transport: Arc<dyn Transport>,

    /// Commands by exact, case-sensitive name.
    commands: HashMap<String, Arc<dyn Command>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(admin_id: i64, transport: Arc<dyn Transport>) -> Self {
        Self {
            admin_id,
            transport,
            commands: HashMap::new(),
        }
    }

    pub const fn admin_id(&self) -> i64 {
        self.admin_id
    }

    /// Registers `command` under its name, replacing any previous entry.
    ///
    /// Commands asking for the admin gate are wrapped in a
    /// [`RestrictedCommand`] bound to this dispatcher's admin identity.
    /// Returns the replaced command, if any.
    pub fn register<C: Command + 'static>(&mut self, command: C) -> Option<Arc<dyn Command>> {
        let name = command.name().to_owned();
        let command: Arc<dyn Command> = if command.needs_admin_gate() {
            Arc::new(RestrictedCommand::new(self.admin_id, command))
        } else {
            Arc::new(command)
        };

        debug!("Registering command '{}'", name);
        self.commands.insert(name, command)
    }

    /// Looks up a command by exact name.
    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(name)
    }

    /// Runs the command registered as `name` with `message`.
    ///
    /// An unregistered name is a normal outcome, not an error. The command
    /// runs on its own task, so a panic inside it comes back as
    /// [`CommandError::Failed`].
    pub async fn dispatch(
        &self,
        message: &Message,
        name: &str,
    ) -> Result<Dispatched, CommandError> {
        let Some(command) = self.resolve(name) else {
            debug!("No command registered as '{}'", name);
            return Ok(Dispatched::UnknownCommand);
        };

        debug!("Dispatching command '{}'", name);
        let command = Arc::clone(command);
        let transport = Arc::clone(&self.transport);
        let message = message.clone();
        tokio::spawn(async move { command.execute(&message, transport.as_ref()).await })
            .await
            .map_err(|e| anyhow!("Command '{name}' aborted: {e}"))??;
        Ok(Dispatched::Executed)
    }

    /// Registered names, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("admin_id", &self.admin_id)
            .field("commands", &self.command_names())
            .finish_non_exhaustive()
    }
}
