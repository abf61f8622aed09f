pub mod conversation;
pub mod enums;

pub use conversation::Message;
pub use enums::{ReplySource, Sender};
