//! Typing tracker - ephemeral, TTL-expiring typing indicators

mod tracker;

pub use tracker::TypingTracker;
