//! Presence registry - who is online, with disconnect detection

mod registry;

pub use registry::PresenceRegistry;
