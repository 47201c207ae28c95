//! Keybind module: the configured combos and their commands
//!
//! Loads the JSON keybind file into an ordered cache of actions, and can
//! watch the file so edits reach the engine without a restart.

mod cache;
mod error;
mod watcher;

pub use cache::{Command, KeybindCache};
pub use error::LoadError;
pub use watcher::ConfigWatcher;
