//! MQTT ⇄ HTTP bridge daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   MQTT broker                         BRIDGE                              HTTP service
//!  ┌──────────┐   message   ┌────────────┐   ┌─────────────┐   request   ┌──────────┐
//!  │  topic   │────────────▶│ supervisor │──▶│ route table │────────────▶│  target  │
//!  │          │             │   (pump)   │   │ → translate │             │   URL    │
//!  │ response │◀────────────│            │◀──│ ← dispatch  │◀────────────│          │
//!  │  topic   │   publish   └────────────┘   └─────────────┘  GET body   └──────────┘
//!  └──────────┘
//!
//!   config file ──(notify)──▶ reload_config        admin API ──▶ add/remove routes
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use mqtt_http_bridge::admin;
use mqtt_http_bridge::config::{load_config, watcher::ConfigWatcher, ObservabilityConfig};
use mqtt_http_bridge::lifecycle::{shutdown::with_deadline, wait_for_shutdown_signal, Shutdown};
use mqtt_http_bridge::observability::{logging, metrics};
use mqtt_http_bridge::Bridge;

const READY_TIMEOUT: Duration = Duration::from_secs(10);
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "mqtt-http-bridge")]
#[command(about = "Bridge MQTT topics to HTTP endpoints", long_about = None)]
struct Args {
    /// Path to the TOML, JSON or YAML config file
    #[arg(short, long, default_value = "bridge.toml")]
    config: PathBuf,

    /// Reload routes when the config file changes
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(path = ?args.config, error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("mqtt-http-bridge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        mqtt_host = %config.mqtt_host,
        http_host = %config.http_host,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let admin_config = config.admin.clone();
    let bridge = Bridge::mqtt(&config.http)?;
    bridge.connect_with_config(config).await?;

    if bridge.wait_until_connected(Some(READY_TIMEOUT)).await {
        tracing::info!(status = ?bridge.status(), "Bridge ready");
    } else {
        tracing::warn!(
            timeout_secs = READY_TIMEOUT.as_secs(),
            "Broker not connected yet, continuing in background"
        );
    }

    let shutdown = Shutdown::new();

    let admin_task = if admin_config.enabled {
        match admin_config.bind_address.parse() {
            Ok(addr) => {
                let bridge = bridge.clone();
                let stop = shutdown.signalled();
                Some(tokio::spawn(async move {
                    if let Err(e) = admin::serve(addr, bridge, stop).await {
                        tracing::error!(error = %e, "Admin API failed");
                    }
                }))
            }
            Err(_) => {
                tracing::error!(bind_address = %admin_config.bind_address, "Failed to parse admin address");
                None
            }
        }
    } else {
        None
    };

    // the watcher stops when this handle is dropped
    let (_watcher, mut updates) = if args.watch {
        let (watcher, updates) = ConfigWatcher::new(&args.config);
        match watcher.run() {
            Ok(handle) => (Some(handle), Some(updates)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to start config watcher");
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    let signal = wait_for_shutdown_signal();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            _ = &mut signal => break,
            Some(new_config) = async {
                match updates.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                bridge.reload_config(new_config).await;
            }
        }
    }

    tracing::info!(listeners = shutdown.receiver_count(), "Shutting down");
    shutdown.trigger();

    let drain = async {
        if let Some(task) = admin_task {
            let _ = task.await;
        }
        bridge.disconnect().await;
    };
    with_deadline(drain, SHUTDOWN_DEADLINE).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
