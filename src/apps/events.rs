//! App path announcements.
//!
//! Delivery contract:
//! - every subscriber owns an unbounded queue
//! - an event published after `subscribe()` reaches that subscriber exactly
//!   once, in publish order
//! - events published before `subscribe()` are never replayed
//! - dropped receivers are pruned on the next publish

use std::sync::Mutex;

use tokio::sync::mpsc;

/// Something a subscriber should know about the set of deployed apps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// An app became servable at this context path.
    PathRegistered(String),
}

pub type AppEventReceiver = mpsc::UnboundedReceiver<AppEvent>;

/// Fan-out channel from an app registry to its subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<AppEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> AppEventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber. Returns how many got it.
    pub fn publish(&self, event: AppEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
