//! Port traits - interfaces the core consumes from the persistence/transport layer

mod ports;

pub use ports::{AccountRecord, AccountStore, MessageLog, PortResult, Transport};
