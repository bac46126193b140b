//! Hot, replay-latest publish/subscribe primitive.
//!
//! `Signal<T>` caches its most recent value and broadcasts new values to
//! every active subscriber in publication order. A new subscriber is handed
//! the cached value immediately and then only values published after that
//! point; history is never replayed. Unsubscription is explicit: dropping
//! the `Subscription` handle deregisters it.
//!
//! Values are stored and broadcast under one lock, so every subscriber
//! observes the same total order with no concurrent emissions.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

struct Subscriber<T> {
    id: u64,
    tx: mpsc::UnboundedSender<T>,
}

struct Inner<T> {
    latest: T,
    next_id: u64,
    subscribers: Vec<Subscriber<T>>,
}

/// A multi-subscriber signal holding the last published value.
pub struct Signal<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: Clone> Signal<T> {
    /// Creates a signal with an initial value.
    ///
    /// The initial value is what late subscribers receive until the first
    /// `publish`.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                latest: initial,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        let inner = self.inner.lock().unwrap();
        inner.latest.clone()
    }

    /// Stores `value` as the latest and delivers it to all subscribers.
    ///
    /// Subscribers whose receiving end has been dropped are pruned here.
    pub fn publish(&self, value: T) {
        let mut inner = self.inner.lock().unwrap();
        inner.latest = value.clone();
        inner
            .subscribers
            .retain(|sub| sub.tx.send(value.clone()).is_ok());
    }

    /// Registers a new subscriber.
    ///
    /// The current value is delivered immediately, so a subscriber always
    /// starts from a defined state even if nothing is published afterwards.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        // Queue the replayed value before registering so it precedes any
        // publish that races with this call.
        let _ = tx.send(inner.latest.clone());
        inner.subscribers.push(Subscriber { id, tx });
        Subscription {
            id,
            rx,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Unsubscribe handle for one subscriber of a [`Signal`].
///
/// Dropping the subscription removes it from the signal; values published
/// afterwards are not delivered.
pub struct Subscription<T> {
    id: u64,
    rx: mpsc::UnboundedReceiver<T>,
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Subscription<T> {
    /// Receives the next value in publication order.
    ///
    /// The first call yields the value cached at subscription time. Returns
    /// `None` once the subscription has been closed.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`] for synchronous loops.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.subscribers.retain(|sub| sub.id != self.id);
    }
}
