//! Held-key tracking
//!
//! Turns a stream of raw `(code, value)` key signals into the set of keys
//! currently held down. Presence in the set is what "held" means; there is
//! no separate pressed flag to go stale.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use tracing::debug;

/// Linux input key code (`KEY_*` in `input-event-codes.h`)
pub type KeyCode = u16;

/// A raw key signal forwarded from the input device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key code
    pub code: KeyCode,
    /// 0 = release, 1 = press, 2 = autorepeat
    pub value: i32,
}

impl KeyEvent {
    pub fn new(code: KeyCode, value: i32) -> Self {
        Self { code, value }
    }

    /// Any non-zero value means the key is down
    pub fn is_down(&self) -> bool {
        self.value != 0
    }
}

/// What a single update did to the held set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The key was not held and now is
    Pressed,
    /// The key was held and now is not
    Released,
    /// Repeat of a held key, or release of an untracked key
    Unchanged,
}

/// Set of keys currently held, keyed by code
#[derive(Debug, Default, Clone)]
pub struct HeldKeys {
    /// Code -> time the key went down. The timestamp is informational only.
    held: BTreeMap<KeyCode, Instant>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one key signal to the held set
    ///
    /// A release for a key that is not tracked is a no-op, and so is a
    /// repeated press of a key already held (its timestamp is kept).
    pub fn update(&mut self, event: KeyEvent) -> Transition {
        let transition = match (self.held.contains_key(&event.code), event.is_down()) {
            (false, true) => {
                self.held.insert(event.code, Instant::now());
                Transition::Pressed
            }
            (true, false) => {
                self.held.remove(&event.code);
                Transition::Released
            }
            _ => Transition::Unchanged,
        };

        if transition != Transition::Unchanged {
            debug!(held = %self, ?transition, code = event.code, "held keys changed");
        }

        transition
    }

    pub fn contains(&self, code: KeyCode) -> bool {
        self.held.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Held codes in ascending order
    pub fn codes(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.held.keys().copied()
    }

    /// When a held key went down
    #[cfg(test)]
    pub fn held_since(&self, code: KeyCode) -> Option<Instant> {
        self.held.get(&code).copied()
    }
}

impl fmt::Display for HeldKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, code) in self.codes().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", code)?;
        }
        write!(f, "]")
    }
}
