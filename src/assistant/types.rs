use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

/// Intent recognised by the keyword rules, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    JobSearch,
    CvUpload,
    CareerAdvice,
    Support,
    Greeting,
    Thanks,
    Fallback,
}

impl Intent {
    /// Canned reply for this intent.
    pub fn response(&self) -> &'static str {
        match self {
            Self::JobSearch => "I can help you find jobs! What type of position are you looking for? You can browse our job listings or tell me your preferred industry.",
            Self::CvUpload => "Great! You can upload your CV on our platform. Would you like me to guide you through the process?",
            Self::CareerAdvice => "I'd be happy to provide career advice! What specific area would you like guidance on? Interview tips, career development, or salary negotiation?",
            Self::Support => "You can reach our support team at support@jobportal.com or call us at +1-234-567-8900. We're here Monday-Friday, 9AM-6PM.",
            Self::Greeting => "Hello! 👋 How can I assist you with your job search today?",
            Self::Thanks => "You're welcome! Is there anything else I can help you with?",
            Self::Fallback => "I'm here to help! You can ask me about finding jobs, uploading your CV, career advice, or contact our support team.",
        }
    }
}

/// Change notification for a rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    MessageAppended { message: Message },
    ComposingChanged { conversation_id: Uuid, composing: bool },
}
