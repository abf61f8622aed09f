use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use super::scheduler::{PendingReply, RandomTypingDelay, ReplyScheduler, TypingDelay};
use super::store::ConversationStore;
use super::types::ChatEvent;
use super::AssistantError;
use crate::config::{AssistantConfig, QuickReply};
use crate::models::{Message, ReplySource, Sender};

/// The assistant core: one conversation, its reply scheduler, and the two
/// input entry points. Cheap to clone; clones share the same conversation.
///
/// Submission spawns Tokio tasks, so it must happen inside a Tokio runtime.
#[derive(Clone)]
pub struct Assistant {
    inner: Arc<Inner>,
}

struct Inner {
    config: AssistantConfig,
    store: Arc<ConversationStore>,
    scheduler: ReplyScheduler,
    events: broadcast::Sender<ChatEvent>,
}

impl Assistant {
    /// Build an assistant with the random typing delay from `config`.
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let delay = Arc::new(RandomTypingDelay::from_config(&config));
        Self::with_delay(config, delay)
    }

    /// Build an assistant with a caller-supplied typing delay.
    pub fn with_delay(
        config: AssistantConfig,
        delay: Arc<dyn TypingDelay>,
    ) -> Result<Self, AssistantError> {
        config.validate()?;

        let (events, _) = broadcast::channel(config.event_capacity);
        let store = Arc::new(ConversationStore::new(&config.greeting, events.clone()));
        let scheduler = ReplyScheduler::new(
            Arc::clone(&store),
            delay,
            config.reply_ordering,
            events.clone(),
        );

        tracing::info!(
            conversation_id = %store.conversation_id(),
            ordering = ?config.reply_ordering,
            "Assistant conversation started"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                store,
                scheduler,
                events,
            }),
        })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.inner.config
    }

    pub fn conversation_id(&self) -> Uuid {
        self.inner.store.conversation_id()
    }

    /// Every message so far, in display order.
    pub fn conversation(&self) -> Vec<Message> {
        self.inner.store.snapshot()
    }

    /// True while any scheduled reply has not landed yet.
    pub fn is_composing(&self) -> bool {
        self.inner.scheduler.is_composing()
    }

    pub fn quick_replies(&self) -> &[QuickReply] {
        &self.inner.config.quick_replies
    }

    /// Receive message and composing-indicator changes.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }

    /// Submit typed text. Whitespace-only input is ignored and returns `None`.
    ///
    /// The user message (verbatim, untrimmed) is appended before this returns.
    pub fn submit_free_text(&self, raw: &str) -> Option<PendingReply> {
        if raw.trim().is_empty() {
            tracing::debug!("Ignoring blank free text submission");
            return None;
        }

        let reply = self.dispatch(raw, ReplySource::FreeText);
        Some(PendingReply::spawn(raw, ReplySource::FreeText, reply))
    }

    /// Submit a quick-reply option as if its text had been typed.
    ///
    /// The user message is appended after the settle delay, on the same task
    /// as the reply.
    pub fn submit_quick_reply(&self, option_text: &str) -> PendingReply {
        let this = self.clone();
        let text = option_text.to_string();
        let settle = self.inner.config.quick_reply_settle();

        PendingReply::spawn(option_text, ReplySource::QuickReply, async move {
            tokio::time::sleep(settle).await;
            this.dispatch(&text, ReplySource::QuickReply).await
        })
    }

    /// Submit a configured quick-reply option by id.
    pub fn submit_quick_reply_id(&self, id: u32) -> Result<PendingReply, AssistantError> {
        let text = self
            .inner
            .config
            .quick_reply(id)
            .map(|r| r.text.clone())
            .ok_or(AssistantError::UnknownQuickReply(id))?;
        Ok(self.submit_quick_reply(&text))
    }

    /// Shared path for both entry points: append the user message, then
    /// hand the same text to the scheduler.
    fn dispatch(
        &self,
        text: &str,
        source: ReplySource,
    ) -> impl Future<Output = Message> + Send + 'static {
        let message = self.inner.store.append(Sender::User, text);
        tracing::info!(
            conversation_id = %message.conversation_id,
            message_id = message.id,
            source = %source,
            "User message submitted"
        );
        self.inner.scheduler.prepare_reply(text, source)
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("conversation_id", &self.conversation_id())
            .field("messages", &self.inner.store.len())
            .field("composing", &self.is_composing())
            .finish()
    }
}
