use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::state::events::{EventPayload, SessionEvent};

/// Receiving end handed to a subscriber.
pub type EventReceiver = mpsc::UnboundedReceiver<Arc<SessionEvent>>;

struct Subscriber {
    id: Uuid,
    sender: mpsc::UnboundedSender<Arc<SessionEvent>>,
}

/// Fan-out of one session's events to its subscribers.
///
/// Owned by the session actor, so emission order is the order in which the
/// actor processed operations. Channels are unbounded: a slow reader never
/// stalls the session and never loses an event.
#[derive(Default)]
pub struct EventDispatcher {
    seq: u64,
    subscribers: Vec<Subscriber>,
}

impl EventDispatcher {
    /// Create a dispatcher with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber that will receive every event emitted from now on.
    pub fn subscribe(&mut self) -> (Uuid, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.push(Subscriber { id, sender });
        debug!(subscriber = %id, "subscriber attached");
        (id, receiver)
    }

    /// Stamp `payload` with the next sequence number and deliver it.
    ///
    /// Subscribers whose receiver is gone are pruned on the way.
    pub fn emit(&mut self, payload: EventPayload) -> u64 {
        self.seq += 1;
        let event = Arc::new(SessionEvent {
            seq: self.seq,
            payload,
        });

        self.subscribers.retain(|subscriber| {
            let delivered = subscriber.sender.send(event.clone()).is_ok();
            if !delivered {
                debug!(subscriber = %subscriber.id, "dropping closed subscriber");
            }
            delivered
        });

        self.seq
    }

    /// Sequence number of the last emitted event (0 before the first).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
