//! Drive event dispatch
//! Observers register callbacks (or a channel) and receive every `DriveEvent` in order

use crate::models::DriveEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub type EventHandler = Arc<dyn Fn(&DriveEvent) + Send + Sync>;

/// Handle returned by [`EventDispatcher::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
enum Subscriber {
    Callback(EventHandler),
    Channel(mpsc::UnboundedSender<DriveEvent>),
}

impl Subscriber {
    fn is_closed(&self) -> bool {
        match self {
            Subscriber::Callback(_) => false,
            Subscriber::Channel(tx) => tx.is_closed(),
        }
    }

    fn deliver(&self, event: &DriveEvent) {
        match self {
            Subscriber::Callback(handler) => handler(event),
            Subscriber::Channel(tx) => {
                let _ = tx.send(event.clone());
            }
        }
    }
}

/// Registry of event observers.
///
/// Handlers are invoked synchronously, in registration order, for every
/// emitted event.
pub struct EventDispatcher {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        EventDispatcher {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }

    fn register(&self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push((id, subscriber));
        }
        id
    }

    /// Register a callback for all drive events
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DriveEvent) + Send + Sync + 'static,
    {
        self.register(Subscriber::Callback(Arc::new(handler)))
    }

    /// Register a channel that receives a clone of every event.
    ///
    /// The subscription is dropped once its receiver is gone, or earlier
    /// through `unsubscribe`.
    pub fn channel(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<DriveEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (self.register(Subscriber::Channel(tx)), rx)
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        if let Ok(mut handlers) = self.handlers.lock() {
            let before = handlers.len();
            handlers.retain(|(existing, _)| *existing != id);
            return handlers.len() != before;
        }
        false
    }

    pub fn subscriber_count(&self) -> usize {
        match self.handlers.lock() {
            Ok(mut handlers) => {
                handlers.retain(|(_, subscriber)| !subscriber.is_closed());
                handlers.len()
            }
            Err(_) => 0,
        }
    }

    /// Deliver an event to every registered handler
    pub fn emit(&self, event: &DriveEvent) {
        // Snapshot the list so handlers may (un)subscribe without deadlocking
        let subscribers: Vec<Subscriber> = match self.handlers.lock() {
            Ok(mut handlers) => {
                handlers.retain(|(_, subscriber)| !subscriber.is_closed());
                handlers.iter().map(|(_, s)| s.clone()).collect()
            }
            Err(_) => return,
        };

        for subscriber in subscribers {
            subscriber.deliver(event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
