//! Chat widget view state and frontend-facing types.
//!
//! The assistant core knows nothing about the widget. `ChatWidget` adds the
//! state a rendering surface needs on top of it:
//! - open/closed flag of the floating chat window
//! - the text input buffer
//! - display-ready message views (`HH:MM` times)

use serde::{Deserialize, Serialize};

use crate::assistant::{Assistant, AssistantError, PendingReply};
use crate::config::QuickReply;
use crate::models::Message;

// ═══════════════════════════════════════════
// Frontend-facing types
// ═══════════════════════════════════════════

/// Frontend-friendly message representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: u64,
    pub conversation_id: String,
    pub sender: String,
    pub text: String,
    /// Hours and minutes, as shown under the bubble.
    pub time: String,
    pub timestamp: String,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        MessageView {
            id: m.id,
            conversation_id: m.conversation_id.to_string(),
            sender: m.sender.as_str().to_string(),
            time: m.timestamp.format("%H:%M").to_string(),
            timestamp: m.timestamp.to_string(),
            text: m.text,
        }
    }
}

// ═══════════════════════════════════════════
// Widget
// ═══════════════════════════════════════════

/// The floating chat widget: view state only, conversation lives in the
/// wrapped `Assistant`.
#[derive(Debug)]
pub struct ChatWidget {
    assistant: Assistant,
    open: bool,
    input: String,
}

impl ChatWidget {
    /// A closed widget with an empty input.
    pub fn new(assistant: Assistant) -> Self {
        Self {
            assistant,
            open: false,
            input: String::new(),
        }
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closing hides the window only; replies already scheduled still land.
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    /// Send the input buffer as free text. The buffer is cleared right away,
    /// whether or not the text was accepted.
    pub fn send(&mut self) -> Option<PendingReply> {
        let text = std::mem::take(&mut self.input);
        self.assistant.submit_free_text(&text)
    }

    /// Click a quick-reply button.
    pub fn select_quick_reply(&mut self, id: u32) -> Result<PendingReply, AssistantError> {
        let pending = self.assistant.submit_quick_reply_id(id)?;
        self.input.clear();
        Ok(pending)
    }

    pub fn quick_replies(&self) -> &[QuickReply] {
        self.assistant.quick_replies()
    }

    pub fn messages(&self) -> Vec<MessageView> {
        self.assistant
            .conversation()
            .into_iter()
            .map(MessageView::from)
            .collect()
    }

    /// Whether to show the typing dots.
    pub fn show_typing_indicator(&self) -> bool {
        self.assistant.is_composing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{FixedTypingDelay, Intent};
    use crate::config::AssistantConfig;
    use crate::models::Sender;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    fn test_widget() -> ChatWidget {
        let assistant = Assistant::with_delay(
            AssistantConfig::default(),
            Arc::new(FixedTypingDelay(Duration::from_millis(1000))),
        )
        .unwrap();
        ChatWidget::new(assistant)
    }

    #[test]
    fn message_view_formats_time() {
        let timestamp = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 5, 42)
            .unwrap();
        let view = MessageView::from(Message {
            id: 7,
            conversation_id: Uuid::nil(),
            sender: Sender::User,
            text: "Upload CV".into(),
            timestamp,
        });
        assert_eq!(view.id, 7);
        assert_eq!(view.sender, "user");
        assert_eq!(view.time, "09:05");
        assert_eq!(view.timestamp, "2026-03-14 09:05:42");
    }

    #[test]
    fn widget_starts_closed() {
        let mut widget = test_widget();
        assert!(!widget.is_open());
        widget.toggle();
        assert!(widget.is_open());
        widget.toggle();
        assert!(!widget.is_open());
        widget.open();
        widget.close();
        assert!(!widget.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn send_clears_input_before_reply() {
        let mut widget = test_widget();
        widget.set_input("find jobs");

        let pending = widget.send().unwrap();
        assert_eq!(widget.input(), "");
        assert!(widget.show_typing_indicator());
        assert_eq!(widget.messages().last().unwrap().text, "find jobs");

        pending.wait().await.unwrap();
        assert!(!widget.show_typing_indicator());
        assert_eq!(
            widget.messages().last().unwrap().text,
            Intent::JobSearch.response()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn blank_send_clears_input_and_does_nothing() {
        let mut widget = test_widget();
        widget.set_input("    ");
        assert!(widget.send().is_none());
        assert_eq!(widget.input(), "");
        assert_eq!(widget.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quick_reply_clears_input() {
        let mut widget = test_widget();
        widget.set_input("half typed");
        let pending = widget.select_quick_reply(3).unwrap();
        assert_eq!(widget.input(), "");

        let bot = pending.wait().await.unwrap();
        assert_eq!(bot.text, Intent::CareerAdvice.response());
        assert_eq!(widget.messages()[1].text, "Career advice");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_quick_reply_keeps_input() {
        let mut widget = test_widget();
        widget.set_input("draft");
        assert!(widget.select_quick_reply(0).is_err());
        assert_eq!(widget.input(), "draft");
    }

    #[tokio::test(start_paused = true)]
    async fn closing_does_not_cancel_reply() {
        let mut widget = test_widget();
        widget.open();
        widget.set_input("thank you");
        let pending = widget.send().unwrap();
        widget.close();

        let bot = pending.wait().await.unwrap();
        assert_eq!(bot.text, Intent::Thanks.response());
        assert_eq!(widget.messages().len(), 3);
    }

    #[test]
    fn widget_exposes_quick_reply_menu() {
        let widget = test_widget();
        let ids: Vec<u32> = widget.quick_replies().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
