// src/logging.rs

//! Log sinks: human-readable lines on the console plus an append-only log
//! file without ANSI colours.
//!
//! `RUST_LOG` wins when set; otherwise debug mode logs this crate at `debug`
//! and everything else at `info`.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Config;
use crate::util::ensure_parent_dir;

/// Where console output goes. `debug` keeps stdout for the JSON result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    Stdout,
    Stderr,
}

/// Install the global subscriber.
///
/// Failing to open the log file is not fatal: console logging still comes up
/// and the returned warning says why the file is missing.
pub fn init(cfg: &Config, console: Console) -> Result<Option<String>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cfg.debug {
            "info,pydebugger=debug,tower_http=debug"
        } else {
            "info"
        })
    });

    let (file_layer, file_warning) = match open_log_file(cfg) {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (
            None,
            Some(format!("File logging disabled: {:#}", e)),
        ),
    };

    let console_layer = match console {
        Console::Stdout => fmt::layer().with_writer(std::io::stdout).boxed(),
        Console::Stderr => fmt::layer().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(file_warning)
}

fn open_log_file(cfg: &Config) -> Result<std::fs::File> {
    ensure_parent_dir(&cfg.log_file)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)
        .with_context(|| format!("Failed to open log file {:?}", cfg.log_file))
}
