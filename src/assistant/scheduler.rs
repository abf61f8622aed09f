//! Response scheduler: simulated typing latency before a bot reply.
//!
//! Each reply is a Tokio task that sleeps, classifies its trigger text and
//! appends the canned response. The composing indicator counts in-flight
//! replies and is released by a drop guard, so it is cleared whether the
//! task completes or is aborted.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::classify::classify_intent;
use super::store::ConversationStore;
use super::types::ChatEvent;
use super::AssistantError;
use crate::config::{AssistantConfig, ReplyOrdering};
use crate::models::{Message, ReplySource, Sender};

// ═══════════════════════════════════════════════════════════
// Typing delay
// ═══════════════════════════════════════════════════════════

/// Source of the "typing" latency before a reply is appended.
pub trait TypingDelay: Send + Sync {
    fn delay_for(&self, source: ReplySource) -> Duration;
}

/// Uniform random delay for free text, fixed delay for quick replies.
#[derive(Debug, Clone)]
pub struct RandomTypingDelay {
    free_text_min_ms: u64,
    free_text_max_ms: u64,
    quick_reply: Duration,
}

impl RandomTypingDelay {
    pub fn new(free_text_min_ms: u64, free_text_max_ms: u64, quick_reply: Duration) -> Self {
        Self {
            free_text_min_ms,
            free_text_max_ms,
            quick_reply,
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(
            config.free_text_delay_min_ms,
            config.free_text_delay_max_ms,
            config.quick_reply_delay(),
        )
    }
}

impl TypingDelay for RandomTypingDelay {
    fn delay_for(&self, source: ReplySource) -> Duration {
        match source {
            ReplySource::QuickReply => self.quick_reply,
            ReplySource::FreeText if self.free_text_min_ms >= self.free_text_max_ms => {
                Duration::from_millis(self.free_text_min_ms)
            }
            ReplySource::FreeText => Duration::from_millis(
                rand::thread_rng().gen_range(self.free_text_min_ms..self.free_text_max_ms),
            ),
        }
    }
}

/// Same delay for every reply.
#[derive(Debug, Clone, Copy)]
pub struct FixedTypingDelay(pub Duration);

impl TypingDelay for FixedTypingDelay {
    fn delay_for(&self, _source: ReplySource) -> Duration {
        self.0
    }
}

// ═══════════════════════════════════════════════════════════
// Pending reply handle
// ═══════════════════════════════════════════════════════════

/// Handle to a bot reply that has been scheduled but may not have landed.
///
/// Dropping the handle does not cancel the reply.
pub struct PendingReply {
    trigger: String,
    source: ReplySource,
    handle: JoinHandle<Message>,
}

impl PendingReply {
    pub(crate) fn spawn<F>(trigger: &str, source: ReplySource, reply: F) -> Self
    where
        F: Future<Output = Message> + Send + 'static,
    {
        Self {
            trigger: trigger.to_string(),
            source,
            handle: tokio::spawn(reply),
        }
    }

    /// The user text this reply answers.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn source(&self) -> ReplySource {
        self.source
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the reply. Nothing is appended if it had not resolved yet.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the reply and return the bot message it appended.
    pub async fn wait(self) -> Result<Message, AssistantError> {
        self.handle.await.map_err(|e| {
            if e.is_cancelled() {
                AssistantError::ReplyCancelled
            } else {
                AssistantError::ReplyTask(e.to_string())
            }
        })
    }
}

impl std::fmt::Debug for PendingReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReply")
            .field("trigger", &self.trigger)
            .field("source", &self.source)
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════
// Composing indicator
// ═══════════════════════════════════════════════════════════

/// Holds one unit of the in-flight count until dropped.
struct ComposingGuard {
    in_flight: Arc<AtomicUsize>,
    conversation_id: Uuid,
    events: broadcast::Sender<ChatEvent>,
}

impl ComposingGuard {
    fn acquire(
        in_flight: &Arc<AtomicUsize>,
        conversation_id: Uuid,
        events: &broadcast::Sender<ChatEvent>,
    ) -> Self {
        if in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            let _ = events.send(ChatEvent::ComposingChanged {
                conversation_id,
                composing: true,
            });
        }
        Self {
            in_flight: Arc::clone(in_flight),
            conversation_id,
            events: events.clone(),
        }
    }
}

impl Drop for ComposingGuard {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.events.send(ChatEvent::ComposingChanged {
                conversation_id: self.conversation_id,
                composing: false,
            });
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Scheduler
// ═══════════════════════════════════════════════════════════

/// A reply's place in the serialized lane: wait on the previous reply,
/// release the next one when dropped.
struct LaneTurn {
    previous: Option<oneshot::Receiver<()>>,
    _release: oneshot::Sender<()>,
}

pub struct ReplyScheduler {
    store: Arc<ConversationStore>,
    delay: Arc<dyn TypingDelay>,
    ordering: ReplyOrdering,
    in_flight: Arc<AtomicUsize>,
    lane_tail: Mutex<Option<oneshot::Receiver<()>>>,
    events: broadcast::Sender<ChatEvent>,
}

impl ReplyScheduler {
    pub fn new(
        store: Arc<ConversationStore>,
        delay: Arc<dyn TypingDelay>,
        ordering: ReplyOrdering,
        events: broadcast::Sender<ChatEvent>,
    ) -> Self {
        Self {
            store,
            delay,
            ordering,
            in_flight: Arc::new(AtomicUsize::new(0)),
            lane_tail: Mutex::new(None),
            events,
        }
    }

    /// True while at least one reply is in flight.
    pub fn is_composing(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Schedule a bot reply to `trigger` on its own task.
    pub fn schedule_reply(&self, trigger: &str, source: ReplySource) -> PendingReply {
        PendingReply::spawn(trigger, source, self.prepare_reply(trigger, source))
    }

    /// Build the reply future. The composing indicator is raised and the lane
    /// position taken now, before the future is first polled.
    pub(crate) fn prepare_reply(
        &self,
        trigger: &str,
        source: ReplySource,
    ) -> impl Future<Output = Message> + Send + 'static {
        let guard = ComposingGuard::acquire(
            &self.in_flight,
            self.store.conversation_id(),
            &self.events,
        );
        let turn = self.take_turn();
        let delay = self.delay.delay_for(source);
        let store = Arc::clone(&self.store);
        let trigger = trigger.to_string();

        tracing::debug!(
            source = %source,
            delay_ms = delay.as_millis() as u64,
            "Reply scheduled"
        );

        async move {
            let _guard = guard;
            let _turn = match turn {
                Some(mut turn) => {
                    if let Some(previous) = turn.previous.take() {
                        // Err means the previous reply finished or was aborted.
                        let _ = previous.await;
                    }
                    Some(turn)
                }
                None => None,
            };

            tokio::time::sleep(delay).await;

            let intent = classify_intent(&trigger);
            let message = store.append(Sender::Bot, intent.response());
            tracing::info!(
                conversation_id = %message.conversation_id,
                message_id = message.id,
                intent = ?intent,
                source = %source,
                "Bot reply appended"
            );
            message
        }
    }

    fn take_turn(&self) -> Option<LaneTurn> {
        match self.ordering {
            ReplyOrdering::Concurrent => None,
            ReplyOrdering::Serialized => {
                let (release, next) = oneshot::channel();
                let mut tail = self
                    .lane_tail
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                Some(LaneTurn {
                    previous: tail.replace(next),
                    _release: release,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::types::Intent;
    use std::collections::VecDeque;

    const GREETING: &str = "Hello! I'm your career assistant. How can I help you today?";

    /// Hands out delays in the order they were queued.
    struct ScriptedDelay(Mutex<VecDeque<Duration>>);

    impl ScriptedDelay {
        fn new(delays_ms: &[u64]) -> Self {
            Self(Mutex::new(
                delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
            ))
        }
    }

    impl TypingDelay for ScriptedDelay {
        fn delay_for(&self, _source: ReplySource) -> Duration {
            self.0.lock().unwrap().pop_front().unwrap_or_default()
        }
    }

    fn scheduler_with(
        delay: Arc<dyn TypingDelay>,
        ordering: ReplyOrdering,
    ) -> (Arc<ConversationStore>, ReplyScheduler, broadcast::Receiver<ChatEvent>) {
        let (tx, rx) = broadcast::channel(64);
        let store = Arc::new(ConversationStore::new(GREETING, tx.clone()));
        let scheduler = ReplyScheduler::new(Arc::clone(&store), delay, ordering, tx);
        (store, scheduler, rx)
    }

    #[test]
    fn random_delay_stays_in_range() {
        let delay = RandomTypingDelay::new(1000, 2000, Duration::from_millis(1000));
        for _ in 0..500 {
            let d = delay.delay_for(ReplySource::FreeText);
            assert!(d >= Duration::from_millis(1000));
            assert!(d < Duration::from_millis(2000));
        }
    }

    #[test]
    fn quick_reply_delay_is_fixed() {
        let delay = RandomTypingDelay::from_config(&AssistantConfig::default());
        for _ in 0..20 {
            assert_eq!(
                delay.delay_for(ReplySource::QuickReply),
                Duration::from_millis(1000)
            );
        }
    }

    #[test]
    fn degenerate_range_uses_lower_bound() {
        let delay = RandomTypingDelay::new(1500, 1500, Duration::ZERO);
        assert_eq!(
            delay.delay_for(ReplySource::FreeText),
            Duration::from_millis(1500)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reply_lands_after_delay() {
        let (store, scheduler, _rx) = scheduler_with(
            Arc::new(FixedTypingDelay(Duration::from_millis(1500))),
            ReplyOrdering::Concurrent,
        );

        let pending = scheduler.schedule_reply("find jobs", ReplySource::FreeText);
        assert!(scheduler.is_composing());
        assert_eq!(pending.trigger(), "find jobs");

        tokio::time::sleep(Duration::from_millis(1499)).await;
        assert_eq!(store.len(), 1);
        assert!(scheduler.is_composing());

        let message = pending.wait().await.unwrap();
        assert_eq!(message.sender, Sender::Bot);
        assert_eq!(message.text, Intent::JobSearch.response());
        assert_eq!(store.len(), 2);
        assert!(!scheduler.is_composing());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_replies_both_land() {
        let (store, scheduler, _rx) = scheduler_with(
            Arc::new(ScriptedDelay::new(&[1800, 1100])),
            ReplyOrdering::Concurrent,
        );

        let first = scheduler.schedule_reply("hello", ReplySource::FreeText);
        let second = scheduler.schedule_reply("thanks", ReplySource::FreeText);
        assert_eq!(scheduler.in_flight(), 2);

        let second_msg = second.wait().await.unwrap();
        // The earlier reply is still typing.
        assert!(scheduler.is_composing());
        let first_msg = first.wait().await.unwrap();

        // Completion order, not submission order.
        assert!(second_msg.id < first_msg.id);
        assert_eq!(second_msg.text, Intent::Thanks.response());
        assert_eq!(first_msg.text, Intent::Greeting.response());
        assert_eq!(store.len(), 3);
        assert!(!scheduler.is_composing());
    }

    #[tokio::test(start_paused = true)]
    async fn serialized_replies_keep_submission_order() {
        let (_store, scheduler, _rx) = scheduler_with(
            Arc::new(ScriptedDelay::new(&[1800, 1100])),
            ReplyOrdering::Serialized,
        );

        let first = scheduler.schedule_reply("hello", ReplySource::FreeText);
        let second = scheduler.schedule_reply("thanks", ReplySource::FreeText);

        let first_msg = first.wait().await.unwrap();
        let second_msg = second.wait().await.unwrap();
        assert!(first_msg.id < second_msg.id);
        assert_eq!(first_msg.text, Intent::Greeting.response());
        assert_eq!(second_msg.text, Intent::Thanks.response());
    }

    #[tokio::test(start_paused = true)]
    async fn serialized_lane_survives_aborted_reply() {
        let (store, scheduler, _rx) = scheduler_with(
            Arc::new(FixedTypingDelay(Duration::from_millis(1000))),
            ReplyOrdering::Serialized,
        );

        let first = scheduler.schedule_reply("hello", ReplySource::FreeText);
        let second = scheduler.schedule_reply("xyz", ReplySource::FreeText);
        first.abort();

        let second_msg = second.wait().await.unwrap();
        assert_eq!(second_msg.text, Intent::Fallback.response());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_clears_composing_and_appends_nothing() {
        let (store, scheduler, _rx) = scheduler_with(
            Arc::new(FixedTypingDelay(Duration::from_millis(1000))),
            ReplyOrdering::Concurrent,
        );

        let pending = scheduler.schedule_reply("find jobs", ReplySource::FreeText);
        assert!(scheduler.is_composing());
        pending.abort();

        assert!(matches!(
            pending.wait().await,
            Err(AssistantError::ReplyCancelled)
        ));
        assert!(!scheduler.is_composing());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_does_not_cancel() {
        let (store, scheduler, _rx) = scheduler_with(
            Arc::new(FixedTypingDelay(Duration::from_millis(1000))),
            ReplyOrdering::Concurrent,
        );

        drop(scheduler.schedule_reply("Upload CV", ReplySource::QuickReply));
        tokio::time::sleep(Duration::from_millis(1001)).await;

        assert_eq!(store.len(), 2);
        assert_eq!(store.last().unwrap().text, Intent::CvUpload.response());
    }

    #[tokio::test(start_paused = true)]
    async fn composing_events_bracket_the_reply() {
        let (_store, scheduler, mut rx) = scheduler_with(
            Arc::new(FixedTypingDelay(Duration::from_millis(1000))),
            ReplyOrdering::Concurrent,
        );
        // Skip the greeting.
        rx.recv().await.unwrap();

        scheduler
            .schedule_reply("hi", ReplySource::FreeText)
            .wait()
            .await
            .unwrap();

        let events: Vec<ChatEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ChatEvent::ComposingChanged { composing: true, .. }));
        assert!(matches!(events[1], ChatEvent::MessageAppended { .. }));
        assert!(matches!(events[2], ChatEvent::ComposingChanged { composing: false, .. }));
    }
}
