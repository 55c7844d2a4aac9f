//! Update payloads delivered to subscribers

mod updates;

pub use updates::{PresenceUpdate, TypingUpdate};
