use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the keybind file.
///
/// None of these are fatal: the engine keeps its previous cache.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Keybind file missing or unreadable.
    #[error("Unable to open keybind file {}: {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed JSON, wrong shape, a missing required field, or a key
    /// that is not an integer. Integer keys outside the key code range
    /// are not an error; their action loads but never fires.
    #[error("Malformed keybind file {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while setting up the keybind file watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The keybind path has no parent directory to watch.
    #[error("Cannot watch {}: no parent directory", .0.display())]
    NoParent(PathBuf),
    /// The OS watcher could not be created or registered.
    #[error("File watcher failed: {0}")]
    Notify(#[from] notify::Error),
}
