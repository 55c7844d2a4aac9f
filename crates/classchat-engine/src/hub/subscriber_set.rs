//! Subscriber registry for one update source
//!
//! Holds the send side of every live subscriber queue for a single source
//! (one channel, the presence set, one channel's typing set).

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// One registered subscriber: its ID and the send side of its queue
struct Slot<T> {
    id: u64,
    sender: mpsc::Sender<T>,
}

/// The set of subscribers attached to one source.
///
/// `publish` and `attach` both run under the internal lock, so a new
/// subscriber's snapshot and all later updates form one gap-free sequence,
/// and after `detach` returns no further item is enqueued for that
/// subscriber.
pub struct SubscriberSet<T> {
    slots: Mutex<Vec<Slot<T>>>,
}

impl<T> SubscriberSet<T> {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
        }
    }

    /// Remove a subscriber. No delivery happens after this returns.
    pub fn detach(&self, id: u64) {
        self.slots.lock().retain(|slot| slot.id != id);
    }

    /// Number of attached subscribers
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Check if no subscriber is attached
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl<T: Clone> SubscriberSet<T> {
    /// Attach a subscriber with a bounded queue.
    ///
    /// `backlog` is evaluated under the set lock and pre-fills the queue
    /// before the slot becomes visible to `publish`; the queue is sized to
    /// hold the whole backlog plus `capacity` live updates.
    pub fn attach(
        &self,
        id: u64,
        capacity: usize,
        backlog: impl FnOnce() -> Vec<T>,
    ) -> mpsc::Receiver<T> {
        let mut slots = self.slots.lock();

        let items = backlog();
        let (sender, receiver) = mpsc::channel(capacity.max(1) + items.len());
        for item in items {
            // Cannot fail: the queue was sized for the backlog
            let _ = sender.try_send(item);
        }
        slots.push(Slot { id, sender });

        receiver
    }

    /// Deliver one update to every subscriber, never blocking.
    ///
    /// A subscriber whose queue is full has fallen `capacity` updates behind;
    /// it is disconnected (its sender dropped closes the stream) so the
    /// producer stays unblocked. Returns the number of successful deliveries.
    pub fn publish(&self, item: &T) -> usize {
        let mut delivered = 0;

        self.slots.lock().retain(|slot| {
            match slot.sender.try_send(item.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscription_id = slot.id,
                        "Subscriber queue full, disconnecting lagging subscriber"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::trace!(subscription_id = slot.id, "Subscriber gone, removing");
                    false
                }
            }
        });

        delivered
    }
}

impl<T> Default for SubscriberSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SubscriberSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("subscribers", &self.slots.lock().len())
            .finish()
    }
}
