//! Hotkey module for raw keyboard input
//!
//! Tracks which keys are held and, on Linux, reads key events straight
//! from an evdev input device.

mod keys;
#[cfg(target_os = "linux")]
mod listener;

pub use keys::{HeldKeys, KeyCode, KeyEvent, Transition};
#[cfg(target_os = "linux")]
pub use listener::DeviceListener;
