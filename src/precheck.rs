// src/precheck.rs

//! Compile-only syntax check.
//!
//! Runs the interpreter with the compile-check shim and the source on STDIN.
//! Nothing the user wrote is executed here and nothing is written to disk,
//! so a structural error is caught before the sandbox ever spawns.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::shim::compile_check_shim;

/// A compile-time defect found without running the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxDiagnostic {
    pub kind: String,
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl SyntaxDiagnostic {
    /// Error text shown to the caller and handed to the explanation client.
    pub fn error_text(&self) -> String {
        format!("{}: {}", self.kind, self.message)
    }
}

/// Shape of the single JSON object the shim prints.
#[derive(Debug, Deserialize)]
struct ShimReport {
    ok: bool,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    column: Option<u32>,
}

/// Compile `code` with `python` and report the first structural error.
///
/// `Ok(None)` means the source compiles. `Err` means the check itself could
/// not be carried out (missing interpreter, deadline, garbled shim output).
pub async fn check_syntax(
    python: &str,
    code: &str,
    deadline: Duration,
) -> Result<Option<SyntaxDiagnostic>> {
    let mut child = Command::new(python)
        .arg("-I")
        .arg("-c")
        .arg(compile_check_shim())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env("PYTHONIOENCODING", "utf-8")
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to spawn syntax checker '{}'", python))?;

    let mut stdin = child
        .stdin
        .take()
        .context("Syntax checker stdin was not captured")?;
    let source = code.as_bytes().to_vec();

    let output = tokio::time::timeout(deadline, async move {
        stdin.write_all(&source).await?;
        // Closing stdin is the shim's end-of-source signal.
        drop(stdin);
        child.wait_with_output().await
    })
    .await
    .context("Syntax check timed out")?
    .context("Failed while waiting for syntax checker")?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: ShimReport = match serde_json::from_str(stdout.trim()) {
        Ok(r) => r,
        Err(_) => bail!(
            "Syntax checker did not emit valid JSON (status {}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
    };

    Ok(report_to_diagnostic(report))
}

fn report_to_diagnostic(report: ShimReport) -> Option<SyntaxDiagnostic> {
    if report.ok {
        return None;
    }

    Some(SyntaxDiagnostic {
        kind: report.kind.unwrap_or_else(|| "SyntaxError".to_string()),
        message: report.message.unwrap_or_default(),
        line: report.line,
        column: report.column,
    })
}
