// src/sandbox.rs

//! Time-limited execution of submitted source in a child interpreter.
//!
//! The source is written to a scoped temporary `.py` file that is removed
//! when the guard drops, whichever way `execute` exits (including the
//! request future being cancelled). The child runs with a cleared
//! environment and closed stdin, in a process group of its own. The whole
//! group is killed once the child exits or the deadline passes, so nothing
//! the submitted code forks outlives the call.
//!
//! This is NOT an isolation layer: no namespaces, seccomp or cgroups. A
//! descendant that calls `setsid` leaves the group and escapes the kill.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::metrics::{InvocationMetrics, MemoryTracker};

/// Appended to stdout when it was cut at the configured length.
pub const TRUNCATION_MARKER: &str = "\n... (output truncated)";

/// Exit code reported when the process never produced one.
pub const NO_EXIT_CODE: i32 = -1;

/// Outcome of one sandbox run. Failures are values, never errors.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub metrics: InvocationMetrics,
}

impl ExecutionResult {
    fn failed(stderr: String, metrics: InvocationMetrics) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr,
            exit_code: NO_EXIT_CODE,
            metrics,
        }
    }
}

/// Runs source files with a fixed interpreter, deadline and output cap.
#[derive(Debug, Clone)]
pub struct SandboxRunner {
    python: String,
    timeout: Duration,
    max_output_length: usize,
    scratch_dir: PathBuf,
}

impl SandboxRunner {
    pub fn new(python: impl Into<String>, timeout: Duration, max_output_length: usize) -> Self {
        Self {
            python: python.into(),
            timeout,
            max_output_length,
            scratch_dir: std::env::temp_dir(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.python.clone(), cfg.max_execution_time, cfg.max_output_length)
    }

    /// Put the ephemeral source files somewhere other than the system temp dir.
    #[cfg(test)]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute `code` to completion or until the deadline elapses.
    pub async fn execute(&self, code: &str) -> ExecutionResult {
        match self.try_execute(code).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %format!("{:#}", e), "execution error");
                ExecutionResult::failed(
                    format!("Execution error: {:#}", e),
                    InvocationMetrics::default(),
                )
            }
        }
    }

    async fn try_execute(&self, code: &str) -> Result<ExecutionResult> {
        // Dropping this guard deletes the file.
        let mut source = tempfile::Builder::new()
            .prefix("pydebugger_")
            .suffix(".py")
            .tempfile_in(&self.scratch_dir)
            .context("Failed to create temporary source file")?;
        source
            .write_all(code.as_bytes())
            .and_then(|_| source.flush())
            .context("Failed to write temporary source file")?;

        info!(path = %source.path().display(), "executing code in temporary file");

        let path_env =
            std::env::var("PATH").unwrap_or_else(|_| "/usr/local/bin:/usr/bin:/bin".to_string());

        let mut cmd = Command::new(&self.python);
        cmd.arg(source.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env_clear()
            .env("PATH", path_env)
            .env("PYTHONIOENCODING", "utf-8")
            .process_group(0)
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to start interpreter '{}'", self.python))?;

        // Dropping this kills the group, including when the caller is cancelled.
        let group = ProcessGroup::of(&child);

        let mut stdout_pipe = child.stdout.take().context("stdout was not captured")?;
        let mut stderr_pipe = child.stderr.take().context("stderr was not captured")?;
        let tracker = child
            .id()
            .map(|pid| MemoryTracker::start(pid, Duration::from_millis(20)));

        // Enough bytes to hold max_output_length chars of any width, plus one.
        let stdout_cap = self
            .max_output_length
            .saturating_mul(4)
            .saturating_add(4);

        // Leftover descendants hold the pipes open, so the group dies as soon
        // as the child exits and the readers see EOF.
        let waited = tokio::time::timeout(self.timeout, async {
            let wait_then_kill = async {
                let status = child.wait().await;
                group.kill();
                status
            };
            tokio::try_join!(
                wait_then_kill,
                read_capped(&mut stdout_pipe, stdout_cap),
                read_all(&mut stderr_pipe),
            )
        })
        .await;

        let peak_rss_kb = match tracker {
            Some(t) => t.stop_and_take().await,
            None => None,
        };
        let metrics = InvocationMetrics {
            duration_ms: start.elapsed().as_millis(),
            peak_rss_kb,
        };

        match waited {
            Ok(Ok((status, stdout, stderr))) => {
                let exit_code = status.code().unwrap_or(NO_EXIT_CODE);
                let stdout = truncate_output(&String::from_utf8_lossy(&stdout), self.max_output_length);

                info!(exit_code, "code execution completed");

                Ok(ExecutionResult {
                    success: exit_code == 0,
                    stdout,
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                    exit_code,
                    metrics,
                })
            }
            Ok(Err(e)) => {
                group.kill();
                reap(&mut child).await;
                Err(e).context("Failed while waiting for the interpreter")
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "code execution timed out"
                );
                group.kill();
                reap(&mut child).await;
                Ok(ExecutionResult::failed(
                    format!(
                        "Code execution timed out (>{} seconds). Possible infinite loop?",
                        self.timeout.as_secs()
                    ),
                    metrics,
                ))
            }
        }
    }
}

/// The child's process group. The child leads it, so its pid is the pgid.
///
/// Killed at most once, so a recycled pid is never signalled later.
struct ProcessGroup(AtomicI32);

impl ProcessGroup {
    fn of(child: &tokio::process::Child) -> Self {
        let pgid = child.id().and_then(|id| i32::try_from(id).ok()).unwrap_or(0);
        Self(AtomicI32::new(pgid))
    }

    /// SIGKILL every member. An already empty group is fine.
    fn kill(&self) {
        let pgid = self.0.swap(0, Ordering::SeqCst);
        if pgid <= 0 {
            return;
        }
        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!(pgid, error = %e, "failed to kill process group"),
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Kill the child and wait for it so nothing outlives the call.
async fn reap(child: &mut tokio::process::Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "child already gone");
    }
}

/// Cut `output` to `max_chars` characters and append the marker if longer.
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    match output.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", &output[..idx], TRUNCATION_MARKER),
        None => output.to_string(),
    }
}

/// Drain `reader` to EOF, keeping at most `cap` bytes.
async fn read_capped<R>(reader: &mut R, cap: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let room = cap.saturating_sub(kept.len());
        kept.extend_from_slice(&buf[..n.min(room)]);
    }

    Ok(kept)
}

async fn read_all<R>(reader: &mut R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await?;
    Ok(out)
}
