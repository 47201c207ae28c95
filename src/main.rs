//! combo-daemon: run commands when key combos are held
//!
//! This daemon reads raw key events from one Linux input device and
//! provides:
//! - Held-key tracking from press/release events
//! - A keybind cache loaded from a JSON file, optionally live-reloaded
//! - Exact-set combo matching that hands the configured command to the
//!   host, without waiting for it

mod config;
mod engine;
mod events;
mod hotkey;
mod keybinds;
mod lifecycle;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::config::{Cli, Config};
use crate::keybinds::KeybindCache;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(Cli::parse())?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init(&config.log)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "combo-daemon starting"
    );

    if config.check {
        let cache = KeybindCache::load(&config.keybinds_path)?;
        cache.report();
        return Ok(());
    }

    run(config).await
}

#[cfg(target_os = "linux")]
async fn run(config: Config) -> Result<()> {
    use std::sync::Arc;

    use tokio::sync::{mpsc, Notify};
    use tracing::warn;

    use crate::engine::{MatchEngine, ProcessExecutor};
    use crate::hotkey::DeviceListener;
    use crate::keybinds::ConfigWatcher;
    use crate::lifecycle::{SignalAction, Signals};

    let device = config.device.as_deref().context("no device specified")?;

    let mut signals = Signals::register().context("failed to register signal handlers")?;

    // Device listener -> match engine
    let (event_tx, event_rx) = mpsc::channel(64);
    // Config watcher and SIGHUP -> match engine
    let reload = Arc::new(Notify::new());

    let mut engine = MatchEngine::new(
        &config.keybinds_path,
        config.fire_policy,
        ProcessExecutor::new(),
    );

    // A device that cannot be opened is fatal
    let listener = DeviceListener::new(device, event_tx);
    listener.start()?;

    let _watcher = if config.watch {
        match ConfigWatcher::new(&config.keybinds_path, Arc::clone(&reload)) {
            Ok(watcher) => {
                info!(path = %config.keybinds_path.display(), "watching keybind file");
                Some(watcher)
            }
            Err(e) => {
                warn!(%e, "continuing without live reload");
                None
            }
        }
    } else {
        None
    };

    info!("daemon initialized, entering main loop");

    let result = tokio::select! {
        result = engine.run(event_rx, &reload) => {
            result.context("match engine stopped")
        }
        _ = async {
            while signals.recv().await == SignalAction::Reload {
                info!("reload requested");
                reload.notify_one();
            }
        } => {
            info!("shutdown signal received");
            Ok(())
        }
    };

    info!("shutting down...");
    listener.stop();
    info!("combo-daemon stopped");

    result
}

#[cfg(not(target_os = "linux"))]
async fn run(_config: Config) -> Result<()> {
    anyhow::bail!("reading input devices is only supported on Linux")
}
