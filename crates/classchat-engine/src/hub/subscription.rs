//! One client subscription - a cancellable stream of updates

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use super::SubscriberSet;

/// A live subscription to one source.
///
/// Updates arrive in the order the source produced them. The stream ends
/// (`recv` returns `None`) when the subscription is cancelled or when the hub
/// disconnected it for lagging; a caller that wants to resume re-subscribes
/// with its last cursor (channels) or takes the fresh snapshot
/// (presence/typing).
pub struct Subscription<T> {
    id: u64,
    receiver: mpsc::Receiver<T>,
    set: Arc<SubscriberSet<T>>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(id: u64, receiver: mpsc::Receiver<T>, set: Arc<SubscriberSet<T>>) -> Self {
        Self { id, receiver, set }
    }

    /// The hub-assigned subscription ID
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Receive the next update, or `None` once the subscription is over
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Receive without waiting, if an update is already queued
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Cancel the subscription.
    ///
    /// By the time this returns the hub has forgotten the subscriber: no
    /// further update will be enqueued, other subscribers are unaffected, and
    /// anything still queued is discarded along with the receiver.
    pub fn cancel(self) {
        // Drop does the detach
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.set.detach(self.id);
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.receiver.poll_recv(cx)
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
