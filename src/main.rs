//! xair-scene-sync - recall an X Air mixer snapshot on host scene changes.
//!
//! Scene-change notifications arrive one per line on stdin; whatever feeds
//! them in (obs-cli, a websocket shim, a test harness) owns the
//! subscription mechanics. Each line is published on the bus and handled
//! by the scene bridge.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xair_scene_sync::bridge::SceneBridge;
use xair_scene_sync::bus::{create_bus, BusEvent};
use xair_scene_sync::config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xair_scene_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting xair-scene-sync");

    let config = config::load_config()?;
    tracing::info!(
        enabled = config.enabled,
        endpoint = %config.endpoint,
        mappings = config.map.len(),
        "Configuration loaded"
    );

    let bus = create_bus();
    let shutdown = CancellationToken::new();

    let bridge = Arc::new(SceneBridge::new(config)?);
    let bridge_task = tokio::spawn(bridge.run(bus.clone(), shutdown.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl-C received, shutting down");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let scene = line.trim();
                    if !scene.is_empty() {
                        bus.publish(BusEvent::SceneChanged {
                            scene: scene.to_string(),
                        });
                    }
                }
                Ok(None) => {
                    tracing::info!("stdin closed, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::warn!("stdin error: {e}");
                    break;
                }
            },
        }
    }

    bus.publish(BusEvent::ShuttingDown);
    shutdown.cancel();
    let _ = bridge_task.await;

    tracing::info!("Stopped");
    Ok(())
}
