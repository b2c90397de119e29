//! Per-budget alert fan-out.
//!
//! The broker is a keyed registry: `BudgetId -> { SubscriberId -> bounded channel }`.
//!
//! ## Delivery guarantees
//!
//! - **Best-effort, at-most-once** per subscriber.
//! - **Non-blocking**: publishing uses `try_send`. A full subscriber buffer drops the
//!   event for that subscriber only; a closed one is pruned.
//! - **No persistence / replay**: a subscriber only sees events published while it
//!   is registered.
//!
//! ## Lifecycle
//!
//! `subscribe` returns an [`AlertSubscription`] owning the receiving half. Dropping
//! it (e.g. the HTTP server dropping the response stream on disconnect) unregisters
//! it immediately, and the registry entry for the budget is removed together with
//! its last subscriber.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::Stream;

use budgetwatch_core::BudgetId;

use crate::alert::AlertEvent;

/// Default per-subscriber buffer size.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Identifies one subscriber within the broker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl core::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Per-subscriber delivery failure. Local to that subscriber, never propagated by `publish`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("subscriber buffer is full")]
    Full,

    #[error("subscriber is closed or unknown")]
    Closed,
}

type Registry = HashMap<BudgetId, HashMap<SubscriberId, mpsc::Sender<AlertEvent>>>;

#[derive(Debug)]
struct Inner {
    subscribers: Mutex<Registry>,
    next_id: AtomicU64,
    capacity: usize,
}

impl Inner {
    // A panic while holding the lock cannot leave the map half-updated, so the
    // registry stays usable after poisoning.
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, entity_id: BudgetId, subscriber: SubscriberId) -> bool {
        let mut registry = self.registry();
        let Some(set) = registry.get_mut(&entity_id) else {
            return false;
        };

        let removed = set.remove(&subscriber).is_some();
        if set.is_empty() {
            registry.remove(&entity_id);
        }
        if removed {
            tracing::debug!(budget_id = %entity_id, %subscriber, "alert subscriber removed");
        }
        removed
    }
}

/// Concurrency-safe alert registry. Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct AlertBroker {
    inner: Arc<Inner>,
}

impl AlertBroker {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Broker whose subscribers buffer up to `capacity` undelivered events (min 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Register a new subscriber under `entity_id`.
    pub fn subscribe(&self, entity_id: BudgetId) -> AlertSubscription {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));

        self.inner
            .registry()
            .entry(entity_id)
            .or_default()
            .insert(id, tx);
        tracing::debug!(budget_id = %entity_id, subscriber = %id, "alert subscriber registered");

        AlertSubscription {
            entity_id,
            id,
            rx,
            broker: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a subscriber. Its stream ends once buffered events are drained.
    ///
    /// Returns `false` if it was not registered (already gone).
    pub fn unsubscribe(&self, entity_id: BudgetId, subscriber: SubscriberId) -> bool {
        self.inner.remove(entity_id, subscriber)
    }

    /// Deliver `event` to every current subscriber of `entity_id`.
    ///
    /// Returns how many subscribers accepted it. With no subscribers this is a
    /// no-op returning 0.
    pub fn publish(&self, entity_id: BudgetId, event: &AlertEvent) -> usize {
        let mut registry = self.inner.registry();
        let Some(set) = registry.get_mut(&entity_id) else {
            return 0;
        };

        let mut delivered = 0;
        set.retain(|subscriber, tx| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    budget_id = %entity_id,
                    %subscriber,
                    kind = %event.kind,
                    "alert dropped: {}",
                    DeliveryError::Full
                );
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(budget_id = %entity_id, %subscriber, "pruning closed alert subscriber");
                false
            }
        });

        if set.is_empty() {
            registry.remove(&entity_id);
        }

        tracing::debug!(budget_id = %entity_id, kind = %event.kind, delivered, "alert published");
        delivered
    }

    /// Deliver `event` to a single subscriber.
    pub fn send_to(
        &self,
        entity_id: BudgetId,
        subscriber: SubscriberId,
        event: AlertEvent,
    ) -> Result<(), DeliveryError> {
        let registry = self.inner.registry();
        let tx = registry
            .get(&entity_id)
            .and_then(|set| set.get(&subscriber))
            .ok_or(DeliveryError::Closed)?;

        tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    pub fn subscriber_count(&self, entity_id: BudgetId) -> usize {
        self.inner.registry().get(&entity_id).map_or(0, HashMap::len)
    }

    /// Number of budgets with at least one live subscriber.
    pub fn entity_count(&self) -> usize {
        self.inner.registry().len()
    }
}

impl Default for AlertBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of one subscription.
///
/// Yields events in publish order. Dropping it unregisters the subscriber.
#[derive(Debug)]
pub struct AlertSubscription {
    entity_id: BudgetId,
    id: SubscriberId,
    rx: mpsc::Receiver<AlertEvent>,
    broker: Weak<Inner>,
}

impl AlertSubscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn entity_id(&self) -> BudgetId {
        self.entity_id
    }

    /// Wait for the next event; `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<AlertEvent> {
        self.rx.recv().await
    }

    /// Next buffered event, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<AlertEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for AlertSubscription {
    type Item = AlertEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for AlertSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.broker.upgrade() {
            inner.remove(self.entity_id, self.id);
        }
    }
}
