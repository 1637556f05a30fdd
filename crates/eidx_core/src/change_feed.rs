//! Event feed for observing registry mutations.
//!
//! The feed lets UI layers react to registry changes (new suggestions,
//! a refreshed "recent" list) without polling the registry itself.
//! Events are emitted after the mutation has completed, in call order.
//!
//! # Usage
//!
//! ```rust,ignore
//! let receiver = registry.subscribe();
//!
//! registry.record_usage("shop.cart.add");
//!
//! while let Ok(event) = receiver.try_recv() {
//!     println!("{:?}", event.kind);
//! }
//! ```

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

/// What changed in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEventKind {
    /// A new EID was added.
    EidAdded {
        /// The new EID.
        eid: String,
    },
    /// An existing EID's metadata was replaced or updated.
    EidUpdated {
        /// The updated EID.
        eid: String,
    },
    /// Usage was recorded for an EID.
    UsageRecorded {
        /// The used EID.
        eid: String,
        /// Its usage counter after the update.
        frequency: u64,
    },
    /// A bulk load completed.
    BulkLoaded {
        /// Records accepted.
        loaded: usize,
        /// Records skipped as malformed.
        skipped: usize,
    },
    /// The whole registry was replaced from a snapshot.
    StateImported {
        /// Number of EIDs after the import.
        eids: usize,
    },
    /// The registry was emptied.
    Cleared,
}

/// A registry event with its position in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEvent {
    /// Strictly increasing sequence number, starting at 1.
    pub sequence: u64,
    /// What happened.
    pub kind: RegistryEventKind,
}

/// Distributes registry events to subscribers.
///
/// - Preserves emission order
/// - Supports multiple subscribers; disconnected ones are dropped
/// - Keeps a bounded history for catch-up polling
pub struct EventFeed {
    subscribers: RwLock<Vec<Sender<RegistryEvent>>>,
    history: RwLock<VecDeque<RegistryEvent>>,
    max_history: usize,
    last_sequence: AtomicU64,
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFeed {
    /// Creates a feed with the default history limit.
    pub fn new() -> Self {
        Self::with_max_history(1024)
    }

    /// Creates a feed keeping at most `max_history` events.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::new()),
            max_history,
            last_sequence: AtomicU64::new(0),
        }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> Receiver<RegistryEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event and returns its sequence number.
    pub fn emit(&self, kind: RegistryEventKind) -> u64 {
        let sequence = self.last_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let event = RegistryEvent { sequence, kind };

        {
            let mut history = self.history.write();
            history.push_back(event.clone());
            while history.len() > self.max_history {
                history.pop_front();
            }
        }

        self.subscribers
            .write()
            .retain(|tx| tx.send(event.clone()).is_ok());
        sequence
    }

    /// Returns up to `limit` events with sequence greater than `cursor`.
    pub fn poll(&self, cursor: u64, limit: usize) -> Vec<RegistryEvent> {
        self.history
            .read()
            .iter()
            .filter(|e| e.sequence > cursor)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Returns the sequence number of the latest event (0 if none).
    pub fn latest_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::SeqCst)
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl std::fmt::Debug for EventFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFeed")
            .field("subscribers", &self.subscriber_count())
            .field("history", &self.history.read().len())
            .field("latest_sequence", &self.latest_sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn added(eid: &str) -> RegistryEventKind {
        RegistryEventKind::EidAdded { eid: eid.into() }
    }

    #[test]
    fn subscribers_receive_in_order() {
        let feed = EventFeed::new();
        let rx = feed.subscribe();

        feed.emit(added("a.b.c"));
        feed.emit(RegistryEventKind::Cleared);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.kind, added("a.b.c"));
        assert_eq!(second.sequence, 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let feed = EventFeed::new();
        let rx = feed.subscribe();
        let _keep = feed.subscribe();
        drop(rx);

        feed.emit(RegistryEventKind::Cleared);
        assert_eq!(feed.subscriber_count(), 1);
    }

    #[test]
    fn history_is_bounded_and_pollable() {
        let feed = EventFeed::with_max_history(3);
        for i in 0..5 {
            feed.emit(added(&format!("a.b.{i}")));
        }

        assert_eq!(feed.latest_sequence(), 5);
        let events = feed.poll(0, 10);
        let seqs: Vec<_> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![3, 4, 5]);

        assert_eq!(feed.poll(4, 10).len(), 1);
        assert_eq!(feed.poll(0, 2).len(), 2);
    }
}
