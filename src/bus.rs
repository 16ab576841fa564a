//! Broadcast event bus - the seam between the host's notification
//! subsystem and the bridge.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Buffered events per subscriber; a lagged subscriber drops the oldest,
/// which for snapshot recalls are exactly the ones that no longer matter.
const BUS_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum BusEvent {
    /// The host application switched to a new scene.
    SceneChanged { scene: String },
    /// Orderly shutdown requested.
    ShuttingDown,
}

pub struct Bus {
    tx: broadcast::Sender<BusEvent>,
}

pub type SharedBus = Arc<Bus>;

pub fn create_bus() -> SharedBus {
    Arc::new(Bus::new())
}

impl Bus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Silently dropped when nobody is subscribed.
    pub fn publish(&self, event: BusEvent) {
        trace!(?event, "bus publish");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
