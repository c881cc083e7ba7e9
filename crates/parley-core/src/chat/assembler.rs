//! Conversation assembly for the external model.
//!
//! The entire stored history is resent on every turn. There is no context
//! window, so very long sessions grow the request without bound.

use parley_types::chat::ChatMessage;
use parley_types::llm::Message;

/// Convert stored messages into model turns, preserving order.
pub fn assemble_conversation(history: &[ChatMessage]) -> Vec<Message> {
    history
        .iter()
        .map(|m| Message {
            role: m.role,
            content: m.content.clone(),
        })
        .collect()
}
