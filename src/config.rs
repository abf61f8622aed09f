use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assistant::AssistantError;

/// Application-level constants
pub const APP_NAME: &str = "Career Assistant";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "warn,career_assistant_lib=info,career_assistant=info"
}

// ═══════════════════════════════════════════
// Assistant configuration
// ═══════════════════════════════════════════

/// How overlapping replies are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOrdering {
    /// Every reply runs its own timer; bot replies land in completion order.
    #[default]
    Concurrent,
    /// Replies queue behind each other and land in submission order.
    Serialized,
}

/// A predefined shortcut shown under the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReply {
    pub id: u32,
    pub text: String,
    pub icon: String,
}

impl QuickReply {
    fn new(id: u32, text: &str, icon: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Default quick-reply menu: job search, CV upload, career advice, support.
pub fn default_quick_replies() -> Vec<QuickReply> {
    vec![
        QuickReply::new(1, "Find jobs", "🔍"),
        QuickReply::new(2, "Upload CV", "📄"),
        QuickReply::new(3, "Career advice", "💡"),
        QuickReply::new(4, "Contact support", "💬"),
    ]
}

/// Configuration for one assistant instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Bot message seeded into every new conversation.
    pub greeting: String,
    /// Lower bound (inclusive) of the free-text typing delay.
    pub free_text_delay_min_ms: u64,
    /// Upper bound (exclusive) of the free-text typing delay.
    pub free_text_delay_max_ms: u64,
    /// Fixed typing delay for quick replies.
    pub quick_reply_delay_ms: u64,
    /// Pause between a quick-reply click and its user message.
    pub quick_reply_settle_ms: u64,
    pub reply_ordering: ReplyOrdering,
    pub quick_replies: Vec<QuickReply>,
    /// Buffered events per subscriber before it starts lagging.
    pub event_capacity: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello! I'm your career assistant. How can I help you today?".to_string(),
            free_text_delay_min_ms: 1000,
            free_text_delay_max_ms: 2000,
            quick_reply_delay_ms: 1000,
            quick_reply_settle_ms: 100,
            reply_ordering: ReplyOrdering::Concurrent,
            quick_replies: default_quick_replies(),
            event_capacity: 256,
        }
    }
}

impl AssistantConfig {
    /// Parse a JSON config. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, AssistantError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self, AssistantError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), "Assistant config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AssistantError> {
        if self.greeting.trim().is_empty() {
            return Err(AssistantError::Config("greeting must not be empty".into()));
        }
        if self.free_text_delay_min_ms >= self.free_text_delay_max_ms {
            return Err(AssistantError::Config(format!(
                "free text delay range is empty ({}..{} ms)",
                self.free_text_delay_min_ms, self.free_text_delay_max_ms
            )));
        }
        if self.event_capacity == 0 {
            return Err(AssistantError::Config("event_capacity must be positive".into()));
        }
        for (i, reply) in self.quick_replies.iter().enumerate() {
            if reply.text.trim().is_empty() {
                return Err(AssistantError::Config(format!(
                    "quick reply {} has empty text",
                    reply.id
                )));
            }
            if self.quick_replies[..i].iter().any(|r| r.id == reply.id) {
                return Err(AssistantError::Config(format!(
                    "duplicate quick reply id {}",
                    reply.id
                )));
            }
        }
        Ok(())
    }

    pub fn quick_reply_delay(&self) -> Duration {
        Duration::from_millis(self.quick_reply_delay_ms)
    }

    pub fn quick_reply_settle(&self) -> Duration {
        Duration::from_millis(self.quick_reply_settle_ms)
    }

    pub fn quick_reply(&self, id: u32) -> Option<&QuickReply> {
        self.quick_replies.iter().find(|r| r.id == id)
    }
}
