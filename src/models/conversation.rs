use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Sender;

/// A single chat message. Immutable once appended to a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sequence number within the conversation, starting at 1.
    pub id: u64,
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub text: String,
    /// Display only. Ordering is by `id`.
    pub timestamp: NaiveDateTime,
}
