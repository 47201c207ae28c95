//! Keybind cache: the actions currently in effect
//!
//! The keybind file is a JSON array of actions:
//!
//! ```json
//! [
//!     {
//!         "command": "echo Hello World",
//!         "keybind": [ { "key": 29, "modifier": 0 }, { "key": 20, "modifier": 0 } ]
//!     },
//!     {
//!         "command": ["playerctl", "play-pause"],
//!         "keybind": [ { "key": 164 } ]
//!     }
//! ]
//! ```
//!
//! A string command runs through `sh -c`; an array runs the program
//! directly with the remaining elements as arguments.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::error::LoadError;
use crate::hotkey::{HeldKeys, KeyCode};

/// Set of key codes that must all be held, and nothing else
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combo(BTreeSet<KeyCode>);

impl Combo {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, code: KeyCode) -> bool {
        self.0.contains(&code)
    }

    pub fn iter(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.0.iter().copied()
    }

    /// Exact-size match: the held set must be exactly this combo
    ///
    /// An empty combo never matches.
    pub fn matches(&self, held: &HeldKeys) -> bool {
        if self.is_empty() || self.len() != held.len() {
            return false;
        }
        self.iter().filter(|&code| held.contains(code)).count() == self.len()
    }
}

impl FromIterator<KeyCode> for Combo {
    fn from_iter<I: IntoIterator<Item = KeyCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, code) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            write!(f, "{}", code)?;
        }
        Ok(())
    }
}

/// Command to run when a combo fires
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCommand")]
pub enum Command {
    /// Handed verbatim to `sh -c`
    Shell(String),
    /// Run directly, without shell interpretation
    Exec { program: String, args: Vec<String> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCommand {
    Shell(String),
    Exec(Vec<String>),
}

impl TryFrom<RawCommand> for Command {
    type Error = String;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        match raw {
            RawCommand::Shell(line) => Ok(Command::Shell(line)),
            RawCommand::Exec(argv) => {
                let mut argv = argv.into_iter();
                let program = argv
                    .next()
                    .ok_or_else(|| "command array must name a program".to_string())?;
                Ok(Command::Exec {
                    program,
                    args: argv.collect(),
                })
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Shell(line) => write!(f, "{}", line),
            Command::Exec { program, args } => {
                write!(f, "{}", program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

/// A combo paired with the command it triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub combo: Combo,
    pub command: Command,
}

#[derive(Deserialize)]
struct ActionEntry {
    command: Command,
    keybind: Vec<KeyEntry>,
}

#[derive(Deserialize)]
struct KeyEntry {
    /// Any integer; codes outside the key code range never match
    key: i64,
    /// Parsed for compatibility, not part of combo identity
    #[serde(default)]
    modifier: i32,
}

/// Ordered list of actions, in keybind file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeybindCache {
    actions: Vec<Action>,
}

impl KeybindCache {
    /// Read and parse a keybind file
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Open {
            path: path.to_owned(),
            source,
        })?;

        Self::parse(&text).map_err(|source| LoadError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Parse keybind JSON
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<ActionEntry> = serde_json::from_str(json)?;

        let actions = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                for key in entry.keybind.iter().filter(|k| k.modifier != 0) {
                    warn!(
                        index,
                        key = key.key,
                        modifier = key.modifier,
                        "modifier is ignored when matching combos"
                    );
                }

                let combo: Combo = match entry
                    .keybind
                    .iter()
                    .find(|k| KeyCode::try_from(k.key).is_err())
                {
                    Some(bad) => {
                        warn!(
                            index,
                            key = bad.key,
                            command = %entry.command,
                            "key code out of range, action will never fire"
                        );
                        Combo::default()
                    }
                    None => entry
                        .keybind
                        .iter()
                        .filter_map(|k| KeyCode::try_from(k.key).ok())
                        .collect(),
                };
                if entry.keybind.is_empty() {
                    warn!(index, command = %entry.command, "action has no keys and will never fire");
                }

                Action {
                    combo,
                    command: entry.command,
                }
            })
            .collect();

        Ok(Self { actions })
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Log the cache contents
    pub fn report(&self) {
        info!(actions = self.len(), "current keybindings");
        for action in &self.actions {
            debug!(combo = %action.combo, command = %action.command, "keybinding");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::KeyEvent;
    use std::io::Write;

    fn held(codes: &[KeyCode]) -> HeldKeys {
        let mut keys = HeldKeys::new();
        for &code in codes {
            keys.update(KeyEvent::new(code, 1));
        }
        keys
    }

    #[test]
    fn test_parse_preserves_source_order() {
        let json = r#"[
            {"command": "first", "keybind": [{"key": 28, "modifier": 0}]},
            {"keybind": [{"modifier": 0, "key": 30}, {"key": 28, "modifier": 0}], "command": "second"},
            {"command": "third", "keybind": [{"key": 1, "modifier": 0}]}
        ]"#;
        let cache = KeybindCache::parse(json).unwrap();

        assert_eq!(cache.len(), 3);
        let commands: Vec<String> = cache.actions().iter().map(|a| a.command.to_string()).collect();
        assert_eq!(commands, vec!["first", "second", "third"]);
        assert_eq!(
            cache.actions()[1].combo,
            [28, 30].into_iter().collect::<Combo>()
        );
    }

    #[test]
    fn test_duplicate_keys_collapse() {
        let json = r#"[{"command": "x", "keybind": [{"key": 5, "modifier": 0}, {"key": 5, "modifier": 1}]}]"#;
        let cache = KeybindCache::parse(json).unwrap();
        assert_eq!(cache.actions()[0].combo.len(), 1);
    }

    #[test]
    fn test_modifier_is_optional() {
        let json = r#"[{"command": "x", "keybind": [{"key": 5}]}]"#;
        let cache = KeybindCache::parse(json).unwrap();
        assert!(cache.actions()[0].combo.contains(5));
    }

    #[test]
    fn test_missing_fields_are_errors() {
        assert!(KeybindCache::parse(r#"[{"keybind": [{"key": 5}]}]"#).is_err());
        assert!(KeybindCache::parse(r#"[{"command": "x"}]"#).is_err());
        assert!(KeybindCache::parse(r#"[{"command": "x", "keybind": [{"modifier": 0}]}]"#).is_err());
        assert!(KeybindCache::parse(r#"{"command": "x"}"#).is_err());
        assert!(KeybindCache::parse("[{").is_err());
    }

    #[test]
    fn test_out_of_range_key_disables_only_its_action() {
        let json = r#"[
            {"command": "negative", "keybind": [{"key": -1}, {"key": 29}]},
            {"command": "too-big", "keybind": [{"key": 70000}]},
            {"command": "fine", "keybind": [{"key": 29}]}
        ]"#;
        let cache = KeybindCache::parse(json).unwrap();

        assert_eq!(cache.len(), 3);
        assert!(cache.actions()[0].combo.is_empty());
        assert!(cache.actions()[1].combo.is_empty());

        // The valid key of a disabled action must not match on its own
        let keys = held(&[29]);
        assert!(!cache.actions()[0].combo.matches(&keys));
        assert!(cache.actions()[2].combo.matches(&keys));
    }

    #[test]
    fn test_non_integer_key_is_error() {
        assert!(KeybindCache::parse(r#"[{"command": "x", "keybind": [{"key": "A"}]}]"#).is_err());
        assert!(KeybindCache::parse(r#"[{"command": "x", "keybind": [{"key": 1.5}]}]"#).is_err());
    }

    #[test]
    fn test_exec_command() {
        let json = r#"[{"command": ["playerctl", "play-pause"], "keybind": [{"key": 164}]}]"#;
        let cache = KeybindCache::parse(json).unwrap();
        assert_eq!(
            cache.actions()[0].command,
            Command::Exec {
                program: "playerctl".to_string(),
                args: vec!["play-pause".to_string()],
            }
        );
        assert_eq!(cache.actions()[0].command.to_string(), "playerctl play-pause");

        assert!(KeybindCache::parse(r#"[{"command": [], "keybind": [{"key": 1}]}]"#).is_err());
    }

    #[test]
    fn test_empty_keybind_is_accepted_but_never_matches() {
        let json = r#"[{"command": "x", "keybind": []}]"#;
        let cache = KeybindCache::parse(json).unwrap();
        assert!(cache.actions()[0].combo.is_empty());
        assert!(!cache.actions()[0].combo.matches(&held(&[])));
        assert!(!cache.actions()[0].combo.matches(&held(&[1])));
    }

    #[test]
    fn test_combo_exact_size_match() {
        let combo: Combo = [28, 30].into_iter().collect();

        assert!(combo.matches(&held(&[30, 28])));
        assert!(!combo.matches(&held(&[28])));
        assert!(!combo.matches(&held(&[28, 30, 31])));
        assert!(!combo.matches(&held(&[28, 31])));
        assert_eq!(combo.to_string(), "28+30");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keybinds.json");

        let err = KeybindCache::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
        assert!(err.to_string().contains("keybinds.json"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"command": "echo hi", "keybind": [{{"key": 28, "modifier": 0}}]}}]"#
        )
        .unwrap();

        let cache = KeybindCache::load(file.path()).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.actions()[0].command, Command::Shell("echo hi".to_string()));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = KeybindCache::load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
