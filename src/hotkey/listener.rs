//! Input device listener using evdev
//!
//! Reads raw events from a `/dev/input/event*` device on a dedicated
//! thread and forwards key events to the match engine.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use evdev::{Device, EventType};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::keys::KeyEvent;
use crate::events::DaemonEvent;

/// Delay between device polls, bounds CPU usage
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Listener that forwards key events from one input device
pub struct DeviceListener {
    device_path: PathBuf,
    event_tx: mpsc::Sender<DaemonEvent>,
    running: Arc<AtomicBool>,
}

impl DeviceListener {
    /// Create a new listener for the given device
    pub fn new(device_path: &Path, event_tx: mpsc::Sender<DaemonEvent>) -> Self {
        Self {
            device_path: device_path.to_owned(),
            event_tx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Open the device and start the listener thread
    ///
    /// The device is opened before the thread is spawned so an open
    /// failure is reported to the caller instead of the log only.
    pub fn start(&self) -> Result<(), ListenerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ListenerError::AlreadyRunning);
        }

        let device = match Device::open(&self.device_path) {
            Ok(device) => device,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(ListenerError::Open {
                    path: self.device_path.clone(),
                    source: e,
                });
            }
        };

        info!(
            path = %self.device_path.display(),
            name = device.name().unwrap_or("unknown"),
            "using input device"
        );

        let event_tx = self.event_tx.clone();
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("device-listener".to_string())
            .spawn(move || {
                debug!("device listener thread started");

                if let Err(e) = run_event_loop(device, &event_tx, &running) {
                    error!(%e, "device listener error");
                    let _ = event_tx.blocking_send(DaemonEvent::DeviceLost {
                        reason: e.to_string(),
                    });
                }

                running.store(false, Ordering::SeqCst);
                debug!("device listener thread stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                ListenerError::ThreadSpawn(e.to_string())
            })?;

        Ok(())
    }

    /// Stop the listener
    ///
    /// The thread exits after its current fetch returns.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the listener is currently running
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Errors that can occur in the device listener
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("device listener is already running")]
    AlreadyRunning,

    #[error("failed to open input device {}: {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read from input device, was it disconnected? ({0})")]
    Read(#[source] std::io::Error),

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),
}

/// Fetch events until stopped or the device fails
fn run_event_loop(
    mut device: Device,
    event_tx: &mpsc::Sender<DaemonEvent>,
    running: &AtomicBool,
) -> Result<(), ListenerError> {
    while running.load(Ordering::SeqCst) {
        let events = device.fetch_events().map_err(ListenerError::Read)?;

        for ev in events {
            if ev.event_type() != EventType::KEY {
                continue;
            }

            let event = KeyEvent::new(ev.code(), ev.value());
            debug!(code = event.code, value = event.value, "key event");

            if event_tx.blocking_send(DaemonEvent::Key(event)).is_err() {
                warn!("failed to send key event - engine stopped?");
                return Ok(());
            }
        }

        thread::sleep(POLL_INTERVAL);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let listener = DeviceListener::new(Path::new("/dev/input/event0"), tx);
        assert!(!listener.is_running());
    }

    #[test]
    fn test_open_failure_is_reported() {
        let (tx, _rx) = mpsc::channel(32);
        let listener = DeviceListener::new(Path::new("/nonexistent/event99"), tx);

        let err = listener.start().unwrap_err();
        assert!(matches!(err, ListenerError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/event99"));
        assert!(!listener.is_running());
    }
}
