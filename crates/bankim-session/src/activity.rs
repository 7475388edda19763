//! Injected source of user-activity events.

use bankim_types::{ActivityEvent, ActivityKind};
use tokio::sync::broadcast;

/// Default number of buffered events per subscriber.
const DEFAULT_CAPACITY: usize = 64;

/// Fan-out hub that the host feeds with user-activity events.
///
/// The UI layer calls [`emit`](Self::emit) for pointer, keyboard, scroll and
/// touch input; session managers subscribe to it. Cloning yields another
/// handle to the same hub.
#[derive(Debug, Clone)]
pub struct ActivityHub {
    tx: broadcast::Sender<ActivityEvent>,
}

impl ActivityHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Returns the number of subscribers that received it.
    pub fn emit(&self, kind: ActivityKind) -> usize {
        self.tx.send(ActivityEvent::new(kind)).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivityEvent> {
        self.tx.subscribe()
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ActivityHub {
    fn default() -> Self {
        Self::new()
    }
}
