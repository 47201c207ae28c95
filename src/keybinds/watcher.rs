//! Live reload of the keybind file
//!
//! Uses OS-level file watching (Linux inotify) via the notify crate. The
//! parent directory is watched rather than the file itself, since editors
//! often save by writing a new file and renaming it over the old one.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::Notify;
use tracing::{debug, warn};

use super::error::WatchError;

/// Requests a reload from the engine whenever the keybind file changes
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn new(path: &Path, reload: Arc<Notify>) -> Result<Self, WatchError> {
        let file_name = path
            .file_name()
            .map(OsStr::to_owned)
            .ok_or_else(|| WatchError::NoParent(path.to_owned()))?;
        let dir = match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => return Err(WatchError::NoParent(path.to_owned())),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event, &file_name) => {
                    debug!(kind = ?event.kind, "keybind file changed");
                    // Stores a permit if the engine is busy; repeated
                    // changes before it wakes collapse into one reload
                    reload.notify_one();
                }
                Ok(_) => {}
                Err(e) => warn!(%e, "file watcher error"),
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(ConfigWatcher { _watcher: watcher })
    }
}

/// Modification or creation of the watched file
fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_relevant_events() {
        let name = OsString::from("keybinds.json");

        assert!(is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/etc/combo/keybinds.json"),
            &name
        ));
        assert!(is_relevant(
            &event(EventKind::Create(CreateKind::File), "/etc/combo/keybinds.json"),
            &name
        ));
        assert!(!is_relevant(
            &event(EventKind::Remove(RemoveKind::File), "/etc/combo/keybinds.json"),
            &name
        ));
        assert!(!is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/etc/combo/other.json"),
            &name
        ));
    }

    #[test]
    fn test_watch_requests_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keybinds.json");
        std::fs::write(&path, "[]").unwrap();

        let reload = Arc::new(Notify::new());
        let _watcher = ConfigWatcher::new(&path, Arc::clone(&reload)).unwrap();

        std::fs::write(&path, r#"[{"command": "x", "keybind": [{"key": 1}]}]"#).unwrap();

        let received = tokio_test::block_on(async {
            tokio::time::timeout(std::time::Duration::from_secs(5), reload.notified()).await
        });
        assert!(received.is_ok(), "reload request was not delivered");
    }

    #[test]
    fn test_reload_request_survives_full_key_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keybinds.json");
        std::fs::write(&path, "[]").unwrap();

        // Key channel is full and nobody drains it
        let (tx, _rx) = tokio::sync::mpsc::channel(2);
        tx.try_send(crate::events::DaemonEvent::Key(crate::hotkey::KeyEvent::new(1, 1)))
            .unwrap();
        tx.try_send(crate::events::DaemonEvent::Key(crate::hotkey::KeyEvent::new(2, 1)))
            .unwrap();

        let reload = Arc::new(Notify::new());
        let _watcher = ConfigWatcher::new(&path, Arc::clone(&reload)).unwrap();

        std::fs::write(&path, r#"[{"command": "x", "keybind": [{"key": 1}]}]"#).unwrap();
        // Let the watcher thread deliver before anyone waits
        std::thread::sleep(std::time::Duration::from_millis(500));

        let received = tokio_test::block_on(async {
            tokio::time::timeout(std::time::Duration::from_secs(5), reload.notified()).await
        });
        assert!(received.is_ok(), "reload request was dropped");
    }
}
