//! WiiKey host entry point.
//!
//! Loads configuration and the mapping table, wires together the session
//! manager and the OS key injector, then runs until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML host settings
//!  └─ reload_mappings()      -- mapping file -> SharedMappingTable
//!  └─ SessionManager::new()  -- registry + event receiver
//!  └─ event pump             -- logs Opened / StatusChanged / Closed
//!  └─ --replay <capture>     -- optional: drive one session from a file
//! ```
//!
//! Bluetooth discovery and channel setup are provided by the platform; a
//! transport hands each open channel to `SessionManager::accept_device`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wiikey_core::{RemoteIdentity, SharedMappingTable};
use wiikey_host::application::inject_keys::InjectKeysUseCase;
use wiikey_host::application::run_session::{RemoteLink, SessionEvent};
use wiikey_host::infrastructure::key_injection::platform_injector;
use wiikey_host::infrastructure::session_manager::{ManagerConfig, SessionManager};
use wiikey_host::infrastructure::storage::config::{load_config, load_config_from};
use wiikey_host::infrastructure::storage::mapping_loader::reload_mappings;
use wiikey_host::infrastructure::transport::replay::{load_capture, spawn_replay};
use wiikey_host::infrastructure::transport::LoggingFrameSink;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WiiKey host.
///
/// Turns Wii Remote guitar controllers into keyboard input.
#[derive(Debug, Parser)]
#[command(
    name = "wiikey",
    about = "Map Wii Remote guitar controllers to keyboard input",
    version
)]
struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, env = "WIIKEY_CONFIG")]
    config: Option<PathBuf>,

    /// Mapping file; overrides `host.mapping_file` from the config.
    #[arg(long, env = "WIIKEY_MAPPING")]
    mapping: Option<PathBuf>,

    /// Start with key dispatch enabled.
    #[arg(long)]
    dispatch: bool,

    /// Capture file of inbound frames to replay through one session.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Remote address the replayed frames are attributed to.
    #[arg(long, default_value = "00:00:00:00:00:00")]
    address: RemoteIdentity,

    /// Delay between replayed frames in milliseconds.
    #[arg(long, default_value_t = 10)]
    frame_interval_ms: u64,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("failed to load configuration")?;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.host.log_level)),
        )
        .init();

    info!("WiiKey host starting");

    // ── Mapping table ─────────────────────────────────────────────────────────
    let mappings = Arc::new(SharedMappingTable::default());
    match cli.mapping.as_ref().or(config.host.mapping_file.as_ref()) {
        Some(path) => {
            if let Err(e) = reload_mappings(&mappings, path).await {
                warn!("{e}; continuing with an empty mapping table");
            }
        }
        None => warn!("no mapping file configured; no keys will be sent"),
    }

    // ── Session manager ───────────────────────────────────────────────────────
    let injector = Arc::new(InjectKeysUseCase::new(platform_injector()));
    let (manager, mut events) = SessionManager::new(
        ManagerConfig {
            initial_leds: config.remote.initial_led_set(),
            dispatch_enabled: cli.dispatch || config.host.dispatch_enabled,
        },
        mappings,
        injector,
    );
    info!(dispatch = manager.dispatch_enabled(), "key dispatch state");

    // ── Replay (optional) ─────────────────────────────────────────────────────
    let replay_identity = match &cli.replay {
        Some(path) => {
            let frames = load_capture(path).await?;
            let (inbound_tx, inbound_rx) = mpsc::channel(config.remote.inbound_queue_depth.max(1));
            let link = RemoteLink::new(
                cli.address,
                inbound_rx,
                Arc::new(LoggingFrameSink::new(cli.address)),
            );
            manager.connect(link)?;
            spawn_replay(frames, inbound_tx, Duration::from_millis(cli.frame_interval_ms));
            Some(cli.address)
        }
        None => {
            info!("no transport attached; waiting for Ctrl-C");
            None
        }
    };

    // ── Event pump ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                log_event(&event);
                if let SessionEvent::Closed { identity, .. } = event {
                    if replay_identity == Some(identity) {
                        break;
                    }
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("failed to listen for Ctrl-C: {e}");
                }
                info!("shutdown signal received");
                break;
            }
        }
    }

    // Sessions await queue space for their Closed event, so keep draining.
    let shutdown = manager.shutdown();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            Some(event) = events.recv() => log_event(&event),
        }
    }
    info!("WiiKey host stopped");
    Ok(())
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Opened {
            identity,
            session_id,
        } => info!(%identity, session = %session_id, "remote connected"),
        SessionEvent::StatusChanged {
            identity,
            battery_level,
            low_battery,
            extension_present,
        } => info!(
            %identity,
            battery_level,
            low_battery,
            extension_present,
            "remote status"
        ),
        SessionEvent::Closed {
            identity,
            reason,
            ..
        } => info!(%identity, ?reason, "remote disconnected"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
