//! Conversational assistant core.
//!
//! Four pieces connected leaf first:
//! ```text
//! classify (rules) ← scheduler (typing delay) ← router (free text / quick reply)
//!                          ↓                          ↓
//!                        store (append-only conversation log)
//! ```
//! Everything is client-local. The only suspension points are the typing
//! delay and the quick-reply settle delay.

pub mod types;
pub mod classify;
pub mod store;
pub mod scheduler;
pub mod router;

use thiserror::Error;

pub use classify::{classify, classify_intent};
pub use router::Assistant;
pub use scheduler::{FixedTypingDelay, PendingReply, RandomTypingDelay, TypingDelay};
pub use store::ConversationStore;
pub use types::{ChatEvent, Intent};

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parsing error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown quick reply: {0}")]
    UnknownQuickReply(u32),

    #[error("Reply was cancelled before it resolved")]
    ReplyCancelled,

    #[error("Reply task failed: {0}")]
    ReplyTask(String),
}
