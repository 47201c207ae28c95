//! Unix signal handling
//!
//! SIGTERM and SIGINT stop the daemon. SIGHUP asks for a keybind reload,
//! the usual daemon convention.

use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::debug;

/// What a received signal asks the daemon to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Shutdown,
    Reload,
}

/// Registered signal streams
pub struct Signals {
    sigterm: Signal,
    sigint: Signal,
    sighup: Signal,
}

impl Signals {
    /// Register the handlers; must run inside a tokio runtime
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
            sighup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> SignalAction {
        tokio::select! {
            _ = self.sigterm.recv() => {
                debug!("received SIGTERM");
                SignalAction::Shutdown
            }
            _ = self.sigint.recv() => {
                debug!("received SIGINT");
                SignalAction::Shutdown
            }
            _ = self.sighup.recv() => {
                debug!("received SIGHUP");
                SignalAction::Reload
            }
        }
    }
}
