//! Messages consumed by the match engine
//!
//! The device listener thread talks to the engine through one channel
//! carrying these, so the engine stays the only owner of its state. Reload
//! requests travel separately, see `MatchEngine::run`.

use crate::hotkey::KeyEvent;

/// Input to the match engine loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    /// A key event read from the input device
    Key(KeyEvent),

    /// The input device failed (disconnect, read error)
    DeviceLost {
        /// Human-readable cause
        reason: String,
    },
}

impl std::fmt::Display for DaemonEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaemonEvent::Key(event) => {
                write!(f, "KEY (code {}, value {})", event.code, event.value)
            }
            DaemonEvent::DeviceLost { reason } => write!(f, "DEVICE_LOST ({})", reason),
        }
    }
}
