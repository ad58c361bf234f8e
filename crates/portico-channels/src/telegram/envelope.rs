//! Envelope validation — raw Telegram update → normalized pipeline event.

use portico_core::event::{Inbound, Sender};

use super::types::{TgUpdate, TgUser};

/// Outcome of normalizing a structurally valid update.
#[derive(Debug)]
pub enum Normalized {
    /// Something the pipeline should handle.
    Event(Inbound),
    /// Structurally valid but nothing to process — no text, no callback
    /// data, or falsy ids. The reason is for logs only.
    Ignored(&'static str),
}

/// The update matches neither the message nor the callback shape.
#[derive(Debug, PartialEq, Eq)]
pub struct MalformedPayload;

impl std::fmt::Display for MalformedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "envelope matches neither message nor callback shape")
    }
}

fn sender_of(user: &TgUser) -> Sender {
    Sender {
        id: user.id,
        handle: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
    }
}

/// Validate an update and reduce it to what the pipeline needs.
///
/// Permissive about unknown fields (serde already dropped them); strict
/// about the two supported shapes. Zero ids are treated as absent — the
/// platform never assigns them to real users or chats.
pub fn normalize(update: TgUpdate) -> Result<Normalized, MalformedPayload> {
    if let Some(msg) = update.message {
        let Some(text) = msg.text else {
            return Ok(Normalized::Ignored("message without text"));
        };
        let Some(from) = msg.from else {
            return Ok(Normalized::Ignored("message without sender"));
        };
        if from.id == 0 || msg.chat.id == 0 {
            return Ok(Normalized::Ignored("zero sender or chat id"));
        }
        return Ok(Normalized::Event(Inbound::Message {
            prompt: text,
            sender: sender_of(&from),
            chat_id: msg.chat.id.to_string(),
        }));
    }

    if let Some(cb) = update.callback_query {
        let Some(data) = cb.data else {
            return Ok(Normalized::Ignored("callback without data"));
        };
        let Some(chat_id) = cb.message.as_ref().map(|m| m.chat.id) else {
            return Ok(Normalized::Ignored("callback without originating chat"));
        };
        if cb.from.id == 0 || chat_id == 0 {
            return Ok(Normalized::Ignored("zero sender or chat id"));
        }
        return Ok(Normalized::Event(Inbound::Callback {
            callback_id: cb.id,
            prompt: data,
            sender: sender_of(&cb.from),
            chat_id: chat_id.to_string(),
        }));
    }

    Err(MalformedPayload)
}
