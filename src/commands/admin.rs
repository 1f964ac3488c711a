//! Admin access gate.

use async_trait::async_trait;
use tracing::debug;

use super::command::{Command, CommandError};
use crate::telegram::{Message, Transport};

/// Restricts a command to a single admin identity.
///
/// The check is fail-closed: a message without a sender is denied.
/// The inner command never runs for anyone else.
#[derive(Debug)]
pub struct RestrictedCommand<C> {
    admin_id: i64,
    inner: C,
}

impl<C: Command> RestrictedCommand<C> {
    pub const fn new(admin_id: i64, inner: C) -> Self {
        Self { admin_id, inner }
    }

    pub const fn admin_id(&self) -> i64 {
        self.admin_id
    }

    /// Returns `Ok(())` if `message` was sent by the admin.
    pub fn check(&self, message: &Message) -> Result<(), CommandError> {
        match message.sender_id() {
            Some(id) if id == self.admin_id => Ok(()),
            user_id => Err(CommandError::AccessDenied { user_id }),
        }
    }
}

#[async_trait]
impl<C: Command> Command for RestrictedCommand<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    // Already gated.
    fn needs_admin_gate(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        message: &Message,
        transport: &dyn Transport,
    ) -> Result<(), CommandError> {
        self.check(message)?;

        debug!("Admin command '{}' authorized", self.inner.name());
        self.inner.execute(message, transport).await
    }
}
