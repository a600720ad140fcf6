//! `env_logger` setup for the CLI.
//!
//! Quiet by default (`warn`). `--verbose` raises the level to `info` and also
//! copies every line into `<log_dir>/openaq-fetch_YYYYmmdd_HHMMSS.log`.
//! `RUST_LOG` always wins over both.

use crate::error::FetchError;
use chrono::Local;
use env_logger::{Builder, Env, Target, WriteStyle};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes everything to stderr and to a file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// `openaq-fetch_20200101_120000.log` style name for the current local time.
pub fn log_file_name() -> String {
    format!("openaq-fetch_{}.log", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Install the global logger. Returns the log file path when one was opened.
pub fn init(verbose: bool, log_dir: &Path) -> Result<Option<PathBuf>, FetchError> {
    let level = if verbose { "info" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));

    let mut log_path = None;
    if verbose {
        fs::create_dir_all(log_dir).map_err(|e| FetchError::fs(log_dir, e))?;
        let path = log_dir.join(log_file_name());
        let file = File::create(&path).map_err(|e| FetchError::fs(&path, e))?;
        builder
            .target(Target::Pipe(Box::new(Tee { file })))
            .write_style(WriteStyle::Never);
        log_path = Some(path);
    }

    if builder.try_init().is_err() {
        // The installed logger never writes to the new file.
        if let Some(path) = log_path.take() {
            fs::remove_file(&path).map_err(|e| FetchError::fs(&path, e))?;
            log::warn!("a logger is already installed; not logging to {}", path.display());
        }
    }
    Ok(log_path)
}
