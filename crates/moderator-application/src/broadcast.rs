//! Subscriber registry and fan-out.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use moderator_core::event::BroadcastEvent;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifies one connected observer.
pub type SubscriberId = Uuid;

/// Receiving half handed to an observer on connect.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<BroadcastEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event, or `None` once the gateway dropped this subscriber.
    pub async fn recv(&mut self) -> Option<BroadcastEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<BroadcastEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn into_parts(self) -> (SubscriberId, mpsc::Receiver<BroadcastEvent>) {
        (self.id, self.receiver)
    }
}

/// Fans events out to every registered subscriber.
///
/// Each subscriber owns a bounded queue. Publishing never waits: when a
/// queue is full the event is dropped for that subscriber only, and a
/// closed queue unregisters its subscriber.
#[derive(Debug)]
pub struct BroadcastGateway {
    queue_capacity: usize,
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<BroadcastEvent>>>,
}

impl BroadcastGateway {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queue_capacity: queue_capacity.max(1),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let id = Uuid::new_v4();
        self.registry().insert(id, sender);
        debug!("[Broadcast] Subscriber {} registered", id);
        Subscription { id, receiver }
    }

    /// Returns whether `id` was registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.registry().remove(&id).is_some();
        if removed {
            debug!("[Broadcast] Subscriber {} unregistered", id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().len()
    }

    /// Delivers `event` to every subscriber.
    pub fn publish(&self, event: BroadcastEvent) {
        let mut registry = self.registry();
        let mut closed = Vec::new();

        for (id, sender) in registry.iter() {
            match sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "[Broadcast] Queue full for subscriber {}, dropping {}",
                        id,
                        event.name()
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            registry.remove(&id);
            debug!("[Broadcast] Subscriber {} went away", id);
        }
    }

    /// Delivers `event` to a single subscriber. Returns whether it was queued.
    pub fn send_to(&self, id: SubscriberId, event: BroadcastEvent) -> bool {
        let mut registry = self.registry();
        let Some(sender) = registry.get(&id) else {
            return false;
        };

        match sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(
                    "[Broadcast] Queue full for subscriber {}, dropping {}",
                    id,
                    event.name()
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                registry.remove(&id);
                false
            }
        }
    }

    // Critical sections never panic, so a poisoned map is still consistent.
    fn registry(&self) -> MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<BroadcastEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
