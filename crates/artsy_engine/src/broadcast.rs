use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use artsy_core::EventMessage;
use artsy_logging::{artsy_debug, artsy_error};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub type SubscriberId = u64;

#[derive(Default)]
struct Registry {
    next_id: SubscriberId,
    subscribers: BTreeMap<SubscriberId, UnboundedSender<String>>,
}

/// Best-effort fan-out of serialized events to every attached subscriber.
#[derive(Clone, Default)]
pub struct Broadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        lock_registry(&self.registry)
    }

    /// Attach a subscriber whose queue starts with `initial`.
    pub fn subscribe(&self, initial: &EventMessage) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(text) = serialize(initial) {
            // The receiver is alive; this cannot fail.
            let _ = tx.send(text);
        }

        let mut registry = self.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscribers.insert(id, tx);
        artsy_debug!(
            "Subscriber {} attached ({} live)",
            id,
            registry.subscribers.len()
        );

        Subscription {
            rx,
            detach: Detach {
                id,
                registry: Arc::downgrade(&self.registry),
            },
        }
    }

    /// Detach a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.lock().subscribers.remove(&id).is_some()
    }

    /// Enqueue `message` for every subscriber and prune those whose receiver
    /// is gone. Returns the number of subscribers that accepted it.
    pub fn publish(&self, message: &EventMessage) -> usize {
        let Some(text) = serialize(message) else {
            return 0;
        };

        let mut registry = self.lock();
        let dead: Vec<SubscriberId> = registry
            .subscribers
            .iter()
            .filter_map(|(id, tx)| tx.send(text.clone()).err().map(|_| *id))
            .collect();
        for id in &dead {
            registry.subscribers.remove(id);
        }
        if !dead.is_empty() {
            artsy_debug!("Pruned {} dead subscriber(s)", dead.len());
        }
        registry.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

/// Receiving end of one subscriber. Dropping it detaches the subscriber.
pub struct Subscription {
    rx: UnboundedReceiver<String>,
    detach: Detach,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.detach.id
    }

    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Keep only the queue. The registry entry stays until a publish finds
    /// the receiver gone and prunes it.
    pub fn into_receiver(self) -> UnboundedReceiver<String> {
        let Subscription { rx, detach } = self;
        detach.disarm();
        rx
    }
}

struct Detach {
    id: SubscriberId,
    registry: Weak<Mutex<Registry>>,
}

impl Detach {
    fn disarm(mut self) {
        self.registry = Weak::new();
    }
}

impl Drop for Detach {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if lock_registry(&registry).subscribers.remove(&self.id).is_some() {
                artsy_debug!("Subscriber {} detached", self.id);
            }
        }
    }
}

fn lock_registry(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn serialize(message: &EventMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(text) => Some(text),
        Err(err) => {
            artsy_error!("Failed to serialize {:?} event: {}", message.kind, err);
            None
        }
    }
}
