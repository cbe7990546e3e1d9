use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::application::ports::ProgressPublisher;
use crate::domain::{ProgressEvent, ProgressMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscriber {
    sink: mpsc::Sender<ProgressMessage>,
    last_activity: Instant,
}

struct Registry {
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    next_id: AtomicU64,
    channel_capacity: usize,
}

impl Registry {
    fn subscribers(&self) -> MutexGuard<'_, HashMap<SubscriberId, Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fan-out of progress events to every live subscriber.
///
/// Each subscriber owns a bounded queue. Publishing never blocks: a closed queue removes the
/// subscriber, a full queue drops that one event for that one subscriber.
#[derive(Clone)]
pub struct ProgressBroadcaster {
    registry: Arc<Registry>,
}

impl ProgressBroadcaster {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                channel_capacity: channel_capacity.max(1),
            }),
        }
    }

    /// Registers a subscriber. `initial`, when given, is queued ahead of anything published
    /// after this call.
    pub fn subscribe(&self, initial: Option<ProgressEvent>) -> Subscription {
        let id = SubscriberId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        let (sink, receiver) = mpsc::channel(self.registry.channel_capacity);

        let mut subscribers = self.registry.subscribers();
        if let Some(event) = initial {
            let _ = sink.try_send(ProgressMessage::now(event));
        }
        subscribers.insert(
            id,
            Subscriber {
                sink,
                last_activity: Instant::now(),
            },
        );
        tracing::debug!(subscriber = %id, total = subscribers.len(), "Progress subscriber added");

        Subscription {
            id,
            receiver,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.registry.subscribers().remove(&id).is_some();
        if removed {
            tracing::debug!(subscriber = %id, "Progress subscriber removed");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers().len()
    }

    /// Delivers `event` to every subscriber and returns how many accepted it.
    pub fn broadcast(&self, event: ProgressEvent) -> usize {
        let message = ProgressMessage::now(event);
        let now = Instant::now();
        let mut delivered = 0;

        self.registry
            .subscribers()
            .retain(|id, subscriber| match subscriber.sink.try_send(message.clone()) {
                Ok(()) => {
                    subscriber.last_activity = now;
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(subscriber = %id, "Subscriber queue full, event dropped");
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(subscriber = %id, "Subscriber gone, pruning");
                    false
                }
            });

        delivered
    }

    /// Removes subscribers that have not accepted an event within `timeout`.
    pub fn prune_stale(&self, timeout: Duration) -> usize {
        let now = Instant::now();
        let mut subscribers = self.registry.subscribers();
        let before = subscribers.len();
        subscribers.retain(|id, subscriber| {
            let alive = now.duration_since(subscriber.last_activity) < timeout
                && !subscriber.sink.is_closed();
            if !alive {
                tracing::info!(subscriber = %id, "Pruning unresponsive progress subscriber");
            }
            alive
        });
        before - subscribers.len()
    }

    /// Sends a heartbeat every `interval` and prunes subscribers silent for `timeout`.
    ///
    /// The task ends once every handle to this broadcaster has been dropped.
    pub fn spawn_keep_alive(&self, interval: Duration, timeout: Duration) -> JoinHandle<()> {
        let registry = Arc::downgrade(&self.registry);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let broadcaster = ProgressBroadcaster { registry };
                broadcaster.broadcast(ProgressEvent::Heartbeat);
                broadcaster.prune_stale(timeout);
            }
        })
    }
}

impl ProgressPublisher for ProgressBroadcaster {
    fn publish(&self, event: ProgressEvent) {
        self.broadcast(event);
    }
}

/// Receiving end of one subscriber. Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<ProgressMessage>,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<ProgressMessage> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ProgressMessage> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.subscribers().remove(&self.id);
        }
    }
}
