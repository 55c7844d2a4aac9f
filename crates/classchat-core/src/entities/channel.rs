//! Channel entity - a fixed chat topic and the catalog of all topics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel identifier (a short stable slug such as `general` or `math`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a channel ID from an existing slug
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner slug
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Channel entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub display_name: String,
}

impl Channel {
    /// Create a new Channel
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: ChannelId::new(id),
            display_name: display_name.into(),
        }
    }
}

/// The fixed set of channels, created at engine initialization.
///
/// The catalog is immutable at runtime: every append and subscription is
/// validated against it, and an unknown slug is rejected with
/// `DomainError::UnknownChannel`.
#[derive(Debug, Clone)]
pub struct ChannelCatalog {
    channels: Vec<Channel>,
}

impl ChannelCatalog {
    /// Build a catalog from a list of channels
    #[must_use]
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    /// The default classroom catalog: one channel per subject
    #[must_use]
    pub fn classroom() -> Self {
        Self::new(vec![
            Channel::new("general", "General Discussion"),
            Channel::new("math", "Mathematics"),
            Channel::new("english", "English"),
            Channel::new("science", "Science"),
            Channel::new("physics", "Physics"),
            Channel::new("chemistry", "Chemistry"),
            Channel::new("biology", "Biology"),
        ])
    }

    /// Check if a channel is part of the catalog
    #[must_use]
    pub fn contains(&self, id: &ChannelId) -> bool {
        self.channels.iter().any(|c| &c.id == id)
    }

    /// Look up a channel by ID
    #[must_use]
    pub fn get(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| &c.id == id)
    }

    /// Iterate over all channels in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Number of channels in the catalog
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for ChannelCatalog {
    fn default() -> Self {
        Self::classroom()
    }
}
