use std::sync::{PoisonError, RwLock};

use chrono::Local;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::types::ChatEvent;
use crate::models::{Message, Sender};

/// Append-only, ordered log of the messages in one conversation.
///
/// The id of a new message is `count + 1`, computed under the same write
/// lock as the push so concurrent appends never share an id.
pub struct ConversationStore {
    conversation_id: Uuid,
    messages: RwLock<Vec<Message>>,
    events: broadcast::Sender<ChatEvent>,
}

impl ConversationStore {
    /// Create a store seeded with the bot greeting (id 1).
    pub fn new(greeting: &str, events: broadcast::Sender<ChatEvent>) -> Self {
        let store = Self {
            conversation_id: Uuid::new_v4(),
            messages: RwLock::new(Vec::new()),
            events,
        };
        store.append(Sender::Bot, greeting);
        store
    }

    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    /// Append a message. Text is stored verbatim.
    pub fn append(&self, sender: Sender, text: &str) -> Message {
        let message = {
            // The log is only ever pushed to, so a poisoned lock still holds
            // a valid prefix.
            let mut messages = self
                .messages
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let message = Message {
                id: messages.len() as u64 + 1,
                conversation_id: self.conversation_id,
                sender,
                text: text.to_string(),
                timestamp: Local::now().naive_local(),
            };
            messages.push(message.clone());
            message
        };

        tracing::debug!(
            conversation_id = %self.conversation_id,
            message_id = message.id,
            sender = %sender,
            "Message appended"
        );
        // No subscribers is fine: nobody is rendering.
        let _ = self.events.send(ChatEvent::MessageAppended {
            message: message.clone(),
        });

        message
    }

    /// Ordered copy of every message appended so far.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<Message> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}
