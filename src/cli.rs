// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Python debugging service: runs snippets in a time-limited subprocess and
/// explains failures.
///
/// Configuration comes from the environment (and `.env`).
/// CLI flags only override environment values.
#[derive(Parser, Debug)]
#[command(
    name = "pydebugger",
    version,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// All supported CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server.
    ///
    /// Defaults to HOST / PORT from the environment,
    /// falling back to 127.0.0.1:5000.
    Serve {
        /// Override the bind address
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Debug a local Python file once and print the JSON result.
    ///
    /// Runs the same pipeline as `POST /debug`:
    /// syntax check, execution, explanation.
    Debug {
        /// Path to the Python source file
        file: PathBuf,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Serve {
            host: None,
            port: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["pydebugger"]).unwrap();
        assert!(matches!(
            cli.command.unwrap_or_default(),
            Command::Serve { host: None, port: None }
        ));
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from(["pydebugger", "serve", "--host", "0.0.0.0", "-p", "8080"]).unwrap();
        match cli.command {
            Some(Command::Serve { host, port }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_debug_takes_file() {
        let cli = Cli::try_parse_from(["pydebugger", "debug", "bug.py"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Debug { file }) if file == PathBuf::from("bug.py")));
    }
}
