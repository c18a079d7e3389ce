use anyhow::{Context, Result};
use tracing::info;

use crate::{
    engine::{
        events::{DebugEvent, DebugEventKind},
        response::DebugResponse,
        sink::EventSink,
    },
    precheck::check_syntax,
    request_id::RequestId,
    state::AppState,
};

/// Run one validated request through the stages:
///
/// Prechecking → SyntaxFailed | Executing → RuntimeFailed | Succeeded
///
/// `code` is already trimmed and non-empty. An `Err` here is an unexpected
/// server failure; every expected failure is a `DebugResponse`.
pub async fn run_debug<S: EventSink>(
    state: &AppState,
    request_id: &RequestId,
    code: &str,
    sink: &mut S,
) -> Result<DebugResponse> {
    sink.emit(DebugEvent::new(request_id, DebugEventKind::RequestAccepted));
    info!(%request_id, code_len = code.len(), "processing code");

    // ---- prechecking ----
    sink.emit(DebugEvent::new(request_id, DebugEventKind::SyntaxCheckStarted));
    let diagnostic = check_syntax(&state.config.python, code, state.sandbox.timeout())
        .await
        .context("Syntax check could not be performed")?;

    if let Some(diagnostic) = diagnostic {
        // ---- syntax failed: never executes ----
        sink.emit(DebugEvent::new(request_id, DebugEventKind::SyntaxFailed));
        info!(%request_id, kind = %diagnostic.kind, line = ?diagnostic.line, "syntax error detected");

        let error = diagnostic.error_text();
        sink.emit(DebugEvent::new(request_id, DebugEventKind::ExplanationRequested));
        let explanation = state.explainer.explain(code, &error).await;

        sink.emit(DebugEvent::new(request_id, DebugEventKind::Responded));
        info!(%request_id, "returning syntax error response");
        return Ok(DebugResponse::syntax_failure(error, diagnostic.line, explanation));
    }

    // ---- executing ----
    sink.emit(DebugEvent::new(request_id, DebugEventKind::ExecutionStarted));
    info!(%request_id, "executing code");
    let result = state.sandbox.execute(code).await;
    sink.emit(DebugEvent::new(request_id, DebugEventKind::ExecutionFinished));
    info!(
        %request_id,
        duration_ms = result.metrics.duration_ms,
        peak_rss_kb = ?result.metrics.peak_rss_kb,
        "execution finished"
    );

    if result.success {
        sink.emit(DebugEvent::new(request_id, DebugEventKind::Responded));
        info!(%request_id, "code executed successfully");
        return Ok(DebugResponse::success(result.stdout));
    }

    // ---- runtime failed ----
    info!(%request_id, exit_code = result.exit_code, "runtime error occurred");
    sink.emit(DebugEvent::new(request_id, DebugEventKind::ExplanationRequested));
    let explanation = state.explainer.explain(code, &result.stderr).await;

    sink.emit(DebugEvent::new(request_id, DebugEventKind::Responded));
    info!(%request_id, "returning runtime error response");
    Ok(DebugResponse::runtime_failure(
        result.stdout,
        result.stderr,
        explanation,
    ))
}
