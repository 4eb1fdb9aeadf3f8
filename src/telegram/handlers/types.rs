//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::{CallbackQuery, ChatId, Message, MessageId};

use crate::core::types::Sender;
use crate::telegram::router::Router;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub router: Arc<Router>,
}

impl HandlerDeps {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

/// Where a trigger came from, and therefore how its reply is delivered
#[derive(Debug, Clone)]
pub enum Origin {
    /// Plain message; replies are sent as new messages
    Chat(ChatId),
    /// Inline button press; screens are edited in place
    Callback {
        query: CallbackQuery,
        chat_id: ChatId,
        message_id: MessageId,
    },
}

impl Origin {
    pub fn from_message(msg: &Message) -> Self {
        Origin::Chat(msg.chat.id)
    }

    /// `None` when the button's message is no longer accessible
    pub fn from_callback(query: &CallbackQuery) -> Option<Self> {
        let message = query.message.as_ref()?;
        Some(Origin::Callback {
            chat_id: message.chat().id,
            message_id: message.id(),
            query: query.clone(),
        })
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            Origin::Chat(chat_id) => *chat_id,
            Origin::Callback { chat_id, .. } => *chat_id,
        }
    }
}

/// Sender identity of a message, if it has one
pub fn message_sender(msg: &Message) -> Option<Sender> {
    msg.from.as_ref().map(Sender::from)
}
