//! Handler types and dependencies

use teloxide::types::Message;

use crate::core::session::UserKey;
use crate::download::pipeline::FlowDeps;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub flow: FlowDeps,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(flow: FlowDeps) -> Self {
        Self { flow }
    }
}

/// Session key for the sender of a message.
///
/// Channel posts carry no sender; the chat id stands in for it.
pub fn sender_key(msg: &Message) -> UserKey {
    msg.from
        .as_ref()
        .map(|user| user.id.0)
        .unwrap_or(msg.chat.id.0.unsigned_abs())
}
