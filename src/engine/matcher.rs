//! Core match engine
//!
//! Owns the held-key tracker and the keybind cache. For every key event it
//! updates the held set and, when the set changed, fires the actions whose
//! combo is exactly the held set.

use std::path::{Path, PathBuf};

use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

use super::executor::Executor;
use crate::events::DaemonEvent;
use crate::hotkey::{HeldKeys, KeyEvent, Transition};
use crate::keybinds::{KeybindCache, LoadError};

/// What to do when several actions share the held combo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FirePolicy {
    /// Fire every matching action, in keybind file order
    #[default]
    All,
    /// Fire only the first matching action
    First,
}

/// Why the engine loop ended abnormally
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("input device lost: {0}")]
    DeviceLost(String),
}

/// The match engine
pub struct MatchEngine<E> {
    /// Keys currently held
    keys: HeldKeys,
    /// Actions from the last successful load
    cache: KeybindCache,
    /// Keybind file the cache is loaded from
    source: PathBuf,
    policy: FirePolicy,
    executor: E,
}

impl<E: Executor> MatchEngine<E> {
    /// Create a new engine and load the keybind file
    ///
    /// A failed initial load is logged and leaves the cache empty.
    pub fn new(source: &Path, policy: FirePolicy, executor: E) -> Self {
        let mut engine = Self {
            keys: HeldKeys::new(),
            cache: KeybindCache::default(),
            source: source.to_owned(),
            policy,
            executor,
        };
        let _ = engine.reload();
        engine
    }

    /// Reload the keybind file, replacing the cache on success
    ///
    /// On failure the previous cache stays in effect.
    pub fn reload(&mut self) -> Result<usize, LoadError> {
        match KeybindCache::load(&self.source) {
            Ok(cache) => {
                self.cache = cache;
                info!(
                    path = %self.source.display(),
                    actions = self.cache.len(),
                    "cache reloaded"
                );
                self.cache.report();
                Ok(self.cache.len())
            }
            Err(e) => {
                error!(%e, kept = self.cache.len(), "keybind reload failed, keeping previous cache");
                Err(e)
            }
        }
    }

    /// Process one key event
    ///
    /// Returns the cache indices of the actions that fired. Only an event
    /// that changes the held set can fire anything, so autorepeat and
    /// stray releases are silent. A release that leaves exactly a combo
    /// held fires that combo.
    pub fn check_event(&mut self, event: KeyEvent) -> Vec<usize> {
        if self.keys.update(event) == Transition::Unchanged {
            return Vec::new();
        }

        let mut fired = Vec::new();
        for (index, action) in self.cache.actions().iter().enumerate() {
            if !action.combo.matches(&self.keys) {
                continue;
            }

            match self.executor.execute(&action.command) {
                Ok(()) => info!(combo = %action.combo, command = %action.command, "executed command"),
                Err(e) => error!(%e, combo = %action.combo, "failed to execute command"),
            }
            fired.push(index);

            if self.policy == FirePolicy::First {
                break;
            }
        }

        fired
    }

    /// Run the engine, processing events until the channel closes
    ///
    /// Reload requests arrive on `reload` rather than the event channel, so
    /// a backlog of key events can never crowd one out. A pending reload is
    /// applied before the next key event.
    pub async fn run(
        &mut self,
        mut event_rx: mpsc::Receiver<DaemonEvent>,
        reload: &Notify,
    ) -> Result<(), EngineError> {
        info!(
            actions = self.cache.len(),
            policy = ?self.policy,
            "match engine started"
        );
        if self.cache.is_empty() {
            warn!("no keybindings loaded, nothing will fire until a reload");
        }

        loop {
            let event = tokio::select! {
                biased;
                _ = reload.notified() => {
                    let _ = self.reload();
                    continue;
                }
                event = event_rx.recv() => event,
            };

            let Some(event) = event else {
                break;
            };
            debug!(%event, "engine event");

            match event {
                DaemonEvent::Key(key) => {
                    self.check_event(key);
                }
                DaemonEvent::DeviceLost { reason } => {
                    warn!(%reason, "input device lost, stopping match engine");
                    return Err(EngineError::DeviceLost(reason));
                }
            }
        }

        info!("match engine stopped");
        Ok(())
    }

    pub fn cache(&self) -> &KeybindCache {
        &self.cache
    }

    #[cfg(test)]
    pub fn held_keys(&self) -> &HeldKeys {
        &self.keys
    }

    #[cfg(test)]
    pub fn executor(&self) -> &E {
        &self.executor
    }
}
