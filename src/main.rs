// src/main.rs

//! pydebugger
//!
//! Entry point for the pydebugger binary.
//!
//! The service accepts Python source over HTTP, checks it for syntax errors
//! without running it, runs it in a time-limited child process, and asks a
//! remote model to explain whatever went wrong.
//!
//! Responsibilities of this file:
//! - Load `.env` and read configuration from the environment
//! - Install logging
//! - Hand off to the server or the one-shot `debug` command
//!
//! There is intentionally *no business logic* here.

mod cli;
mod config;
mod engine;
mod explain;
mod logging;
mod metrics;
mod precheck;
mod request_id;
mod sandbox;
mod server;
mod shim;
mod sinks;
mod state;
mod util;

use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;
use tracing::{error, warn};

use crate::cli::Command;
use crate::config::Config;
use crate::logging::Console;

/// Program entry point.
///
/// Uses Tokio because both the HTTP server and the sandbox wait on child
/// processes asynchronously.
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();
    let (cfg, warnings) = Config::from_env();

    match cli.command.unwrap_or_default() {
        Command::Serve { host, port } => {
            let cfg = cfg.with_overrides(host, port);
            let mut warnings = warnings;
            warnings.extend(cfg.listen_warnings());
            init_logging(&cfg, Console::Stdout, &warnings)?;

            if let Err(e) = server::serve(cfg).await {
                error!(error = %format!("{:#}", e), "unexpected error running server");
            }
            Ok(())
        }

        Command::Debug { file } => {
            init_logging(&cfg, Console::Stderr, &warnings)?;
            debug_file(cfg, &file).await
        }
    }
}

fn init_logging(cfg: &Config, console: Console, warnings: &[String]) -> Result<()> {
    if let Some(w) = logging::init(cfg, console)? {
        warn!("{}", w);
    }
    for w in warnings {
        warn!("{}", w);
    }
    Ok(())
}

/// One-shot run of the `/debug` pipeline on a local file.
async fn debug_file(cfg: Config, file: &Path) -> Result<()> {
    let source = util::read_to_string(file)?;
    let code = source.trim();
    if code.is_empty() {
        bail!("No code provided");
    }

    let state = state::AppState::from_config(cfg);
    let request_id = request_id::RequestId::new();
    let mut sink = sinks::log::LogEventSink;

    let response = engine::run_debug(&state, &request_id, code, &mut sink).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        bail!("Debug run failed");
    }
    Ok(())
}
