//! Channel store - durable per-channel ordered message logs

mod channel_store;

pub use channel_store::ChannelStore;
