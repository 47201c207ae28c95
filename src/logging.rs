//! Logging setup
//!
//! Console output goes to stderr. Everything is mirrored to a log file that
//! is cleared and restarted once it grows past a size ceiling.
//!
//! `RUST_LOG` overrides the default level (`info`, or `debug` with
//! `--debug`).

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Append-only file that truncates itself past `max_bytes`
///
/// The write that crosses the ceiling is kept as the first entry of the
/// fresh file.
pub struct BoundedLogFile {
    file: File,
    len: u64,
    max_bytes: u64,
}

impl BoundedLogFile {
    pub fn open(path: &Path, max_bytes: u64) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            len,
            max_bytes,
        })
    }
}

impl Write for BoundedLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        self.len += buf.len() as u64;

        if self.len > self.max_bytes {
            self.file.set_len(0)?;
            self.file.seek(SeekFrom::Start(0))?;
            self.file.write_all(buf)?;
            self.len = buf.len() as u64;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Initialize tracing; keep the guard alive until exit to flush the file
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_file = BoundedLogFile::open(&config.file, config.max_bytes)
        .with_context(|| format!("failed to open log file {}", config.file.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    Ok(guard)
}
