//! Scene-change handling - the glue between resolver and dispatcher.

use std::io;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::{BusEvent, SharedBus};
use crate::config::BridgeConfig;
use crate::mapping::SnapshotIndex;
use crate::osc::SnapshotDispatcher;

/// What a single scene-change event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneOutcome {
    /// A recall datagram went out for this snapshot.
    Sent(SnapshotIndex),
    /// Disabled, unknown scene or unassigned slot; nothing to do.
    NoMapping,
    /// The send failed; logged and swallowed.
    SendFailed,
}

/// Owns the dispatcher socket and the current configuration.
///
/// Events are consumed strictly serialized by a single `run` task, so each
/// scene change produces at most one send attempt and recalls hit the
/// mixer in scene-change order.
pub struct SceneBridge {
    config: RwLock<BridgeConfig>,
    dispatcher: SnapshotDispatcher,
}

impl SceneBridge {
    pub fn new(config: BridgeConfig) -> io::Result<Self> {
        Ok(Self {
            config: RwLock::new(config),
            dispatcher: SnapshotDispatcher::new()?,
        })
    }

    /// Swap in a freshly validated config. The whole value is replaced;
    /// there is no incremental mutation.
    pub async fn reconfigure(&self, config: BridgeConfig) {
        let mappings = config.map.len();
        *self.config.write().await = config;
        info!(mappings, "settings updated");
    }

    /// React to one scene-change notification.
    ///
    /// Never panics and never returns an error: a mixer that is offline
    /// must not take the host's event handling down with it.
    pub async fn handle_scene_change(&self, scene: &str) -> SceneOutcome {
        let config = self.config.read().await;
        let Some(index) = config.map.resolve(scene, config.enabled) else {
            debug!(scene, "no snapshot mapping");
            return SceneOutcome::NoMapping;
        };
        match self.dispatcher.dispatch(index, &config.endpoint) {
            Ok(()) => {
                info!(
                    scene,
                    snapshot = %index,
                    endpoint = %config.endpoint,
                    "snapshot recall sent"
                );
                SceneOutcome::Sent(index)
            }
            Err(e) => {
                warn!(scene, snapshot = %index, "snapshot recall failed: {e}");
                SceneOutcome::SendFailed
            }
        }
    }

    /// Consume scene-change events from the bus until shutdown.
    pub async fn run(self: Arc<Self>, bus: SharedBus, shutdown: CancellationToken) {
        let mut rx = bus.subscribe();
        info!("scene bridge started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("scene bridge cancelled");
                    break;
                }
                result = rx.recv() => match result {
                    Ok(BusEvent::SceneChanged { scene }) => {
                        self.handle_scene_change(&scene).await;
                    }
                    Ok(BusEvent::ShuttingDown) => {
                        info!("scene bridge shutting down");
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Skipped events are recalls for scenes that are no
                        // longer current; only the newest one matters.
                        debug!(skipped, "bus lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        info!("scene bridge stopped");
    }
}
