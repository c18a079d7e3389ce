use crate::{
    config::Config,
    engine::{
        response::{ErrorBody, ServerErrorBody, SERVER_ERROR_MESSAGE},
        run_debug, validate_request,
    },
    request_id::RequestId,
    sinks::log::LogEventSink,
    state::AppState,
};

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::{any::Any, io::ErrorKind, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn, Span};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Largest request body `/debug` will buffer.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/* ---------------- server ---------------- */

pub fn router(state: Arc<AppState>) -> Router {
    let debug_mode = state.config.debug;
    let routes = Router::new()
        .route("/", get(index).fallback(method_not_allowed))
        .route("/debug", post(debug).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
        .fallback(not_found)
        .with_state(state);
    with_layers(routes, debug_mode)
}

fn with_layers(routes: Router, debug_mode: bool) -> Router {
    routes
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(panic, debug_mode)
        }))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        path = %req.uri().path(),
                    )
                })
                .on_response(|res: &Response, latency: Duration, _span: &Span| {
                    tracing::info!(
                        status = res.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "request completed"
                    );
                }),
        )
}

/// Bind and serve until Ctrl-C.
///
/// A bind failure is logged and reported as `Ok`: there is nothing useful
/// the caller can do beyond what the log already says.
pub async fn serve(cfg: Config) -> Result<()> {
    log_startup(&cfg);

    let addr = cfg.bind_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            error!(port = cfg.port, "port is already in use");
            info!("Try one of these solutions:");
            info!("  1. Use a different port (set the PORT environment variable)");
            info!("  2. Stop the process using port {}", cfg.port);
            info!("  3. Wait a moment and try again");
            return Ok(());
        }
        Err(e) => {
            error!(addr = %addr, error = %e, "failed to start server");
            return Ok(());
        }
    };

    let state = Arc::new(AppState::from_config(cfg));
    if !state.explainer.is_available() {
        warn!("AI explanations will be unavailable");
    }

    info!("pydebugger listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server stopped unexpectedly")?;

    info!("server stopped");
    Ok(())
}

fn log_startup(cfg: &Config) {
    info!("local server configuration:");
    info!("  - Host: {}", cfg.host);
    info!("  - Port: {}", cfg.port);
    info!("  - Local URL: http://{}:{}", cfg.host, cfg.port);
    if cfg.host == "127.0.0.1" {
        info!("  - Alternative URL: http://localhost:{}", cfg.port);
    }
    info!("  - Debug Mode: {}", cfg.debug);
    info!("  - Interpreter: {}", cfg.python);
    info!("  - Execution timeout: {}s", cfg.max_execution_time.as_secs());
    info!(
        "  - AI explanations: {}",
        if cfg.ai_configured() { "configured" } else { "disabled" }
    );
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/* ---------------- endpoints ---------------- */

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "ai_available": state.explainer.is_available(),
        "timestamp": chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
    }))
}

async fn debug(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = RequestId::new();
    info!(%request_id, "debug request received");

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(%request_id, reason = %rejection.body_text(), "unreadable request body");
            let status = rejection.status();
            let error = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "Request body too large"
            } else {
                "Failed to read request body"
            };
            return (status, Json(ErrorBody { error })).into_response();
        }
    };

    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let code = match validate_request(content_type, &body) {
        Ok(code) => code,
        Err(rejection) => {
            warn!(%request_id, reason = rejection.message(), "invalid request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: rejection.message(),
                }),
            )
                .into_response();
        }
    };

    let mut sink = LogEventSink;
    match run_debug(&state, &request_id, &code, &mut sink).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => {
            let detail = format!("{:#}", e);
            error!(%request_id, error = %detail, "unexpected server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ServerErrorBody {
                    error: SERVER_ERROR_MESSAGE,
                    debug_info: state.config.debug.then_some(detail),
                }),
            )
                .into_response()
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Endpoint not found",
        }),
    )
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            error: "Method not allowed",
        }),
    )
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, debug_mode: bool) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    error!(error = %detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ServerErrorBody {
            error: SERVER_ERROR_MESSAGE,
            debug_info: debug_mode.then_some(detail),
        }),
    )
        .into_response()
}
