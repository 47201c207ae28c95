//! Configuration loading and management

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;

use crate::engine::FirePolicy;

/// Directory bare device names are resolved against
const INPUT_DIR: &str = "/dev/input";

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(version, about = "Run commands when key combos are held")]
pub struct Cli {
    /// Input device to listen on, e.g. `event3` or `/dev/input/event3`
    #[arg(short = 'd', long, required_unless_present = "check")]
    pub device: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Keybind file
    #[arg(short = 'k', long, default_value = "keybinds.json")]
    pub keybinds: PathBuf,

    /// Log file
    #[arg(long, default_value = "log.txt")]
    pub log_file: PathBuf,

    /// Truncate the log file once it grows past this many bytes
    #[arg(long, default_value_t = 1_000_000)]
    pub log_max_bytes: u64,

    /// Whether every matching action fires or only the first
    #[arg(long, value_enum, default_value_t = FirePolicy::All)]
    pub fire_policy: FirePolicy,

    /// Reload the keybind file when it changes on disk
    #[arg(long)]
    pub watch: bool,

    /// Load the keybind file, print it and exit
    #[arg(long)]
    pub check: bool,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Input device path, absent only in check mode
    pub device: Option<PathBuf>,

    /// Path to the keybind file
    pub keybinds_path: PathBuf,

    pub log: LogConfig,

    pub fire_policy: FirePolicy,

    /// Live reload of the keybind file
    pub watch: bool,

    /// Validate the keybind file and exit
    pub check: bool,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub debug: bool,
    pub file: PathBuf,
    pub max_bytes: u64,
}

impl Config {
    /// Resolve configuration from command-line arguments
    pub fn load(cli: Cli) -> Result<Self> {
        let device = cli.device.as_deref().map(resolve_device).transpose()?;
        if device.is_none() && !cli.check {
            bail!("no device specified, use '-d eventX'");
        }

        Ok(Self {
            device,
            keybinds_path: cli.keybinds,
            log: LogConfig {
                debug: cli.debug,
                file: cli.log_file,
                max_bytes: cli.log_max_bytes,
            },
            fire_policy: cli.fire_policy,
            watch: cli.watch,
            check: cli.check,
        })
    }
}

/// Map a device selector to a path; bare names live under `/dev/input`
fn resolve_device(selector: &str) -> Result<PathBuf> {
    if selector.trim().is_empty() {
        bail!("device selector is empty");
    }
    let path = Path::new(selector);
    if path.is_absolute() {
        Ok(path.to_owned())
    } else {
        Ok(Path::new(INPUT_DIR).join(path))
    }
}
