//! Update handling module.
//!
//! The [`Robot`] receives raw webhook payloads, finds bot-command entities
//! in the message and routes them through its command dispatcher.

mod robot;
mod store;

pub use robot::{EMOJI_ROBOT, EMOJI_THINKING_FACE, HandleError, Robot};
pub use store::{MemoryUpdatesStore, StoredUpdate, UpdatesStore};
