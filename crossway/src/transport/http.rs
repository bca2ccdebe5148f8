//! HTTP control API.
//!
//! Maps the scheduler operations onto five `/api/v1` routes using axum.
//! Status and history are JSON; the control routes answer with a short
//! plain-text confirmation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, body::Bytes};
use crossway_core::{SequenceConfig, SignalError};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Result;
use crate::error::{SchedulerError, TransportError};
use crate::observability::metrics;
use crate::scheduler::PhaseScheduler;

/// Default maximum accepted request body in bytes.
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to, e.g. `"127.0.0.1:8080"`.
    pub bind_addr: String,
    /// Maximum allowed request body size in bytes.
    pub max_body_size: usize,
}

impl HttpConfig {
    /// Config for `bind_addr` with the default body limit.
    #[must_use]
    pub fn new(bind_addr: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Shared state for the axum handlers.
#[derive(Clone)]
struct ApiState {
    scheduler: Arc<PhaseScheduler>,
}

/// Running HTTP server.
///
/// The server task exits once the cancellation token passed to
/// [`bind`](Self::bind) is cancelled and in-flight requests drain.
pub struct HttpServer {
    bound_addr: SocketAddr,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl HttpServer {
    /// Binds the control API and starts serving.
    ///
    /// Returns once the listener is bound, so port 0 can be used in tests
    /// and the real port read from [`local_addr`](Self::local_addr).
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the TCP listener cannot bind.
    pub async fn bind(
        config: HttpConfig,
        scheduler: Arc<PhaseScheduler>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("bind failed: {e}")))?;

        let bound_addr = listener
            .local_addr()
            .map_err(|e| TransportError::ConnectionFailed(format!("local_addr failed: {e}")))?;

        let router = build_router(scheduler, config.max_body_size);

        let server_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            info!(%bound_addr, "HTTP transport started");
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    server_cancel.cancelled().await;
                })
                .await
            {
                warn!(error = %e, "HTTP server exited with error");
            }
            debug!("HTTP server shut down");
        });

        Ok(Self {
            bound_addr,
            cancel,
            handle,
        })
    }

    /// The address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.bound_addr
    }

    /// Requests graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Waits for the server task to finish.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] if the server task panicked.
    pub async fn wait(self) -> Result<()> {
        self.handle
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("server task failed: {e}")))
    }
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("bound_addr", &self.bound_addr)
            .finish_non_exhaustive()
    }
}

/// Builds the control API router.
pub fn build_router(scheduler: Arc<PhaseScheduler>, max_body_size: usize) -> Router {
    Router::new()
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/sequence", post(handle_sequence))
        .route("/api/v1/pause", get(handle_pause))
        .route("/api/v1/resume", get(handle_resume))
        .route("/api/v1/history", get(handle_history))
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(ApiState { scheduler })
}

// ============================================================================
// Request / response bodies
// ============================================================================

/// Body of `POST /api/v1/sequence`. Durations are in seconds; omitted
/// fields take the startup defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceRequest {
    /// North/south green
    #[serde(rename = "timeGreenNS")]
    pub time_green_ns: i64,
    /// North/south yellow
    #[serde(rename = "timeYellowNS")]
    pub time_yellow_ns: i64,
    /// East/west green
    #[serde(rename = "timeGreenEW")]
    pub time_green_ew: i64,
    /// East/west yellow
    #[serde(rename = "timeYellowEW")]
    pub time_yellow_ew: i64,
}

impl Default for SequenceRequest {
    fn default() -> Self {
        let d = SequenceConfig::DEFAULT;
        Self {
            time_green_ns: d.ns_green_secs,
            time_yellow_ns: d.ns_yellow_secs,
            time_green_ew: d.ew_green_secs,
            time_yellow_ew: d.ew_yellow_secs,
        }
    }
}

impl From<SequenceRequest> for SequenceConfig {
    fn from(req: SequenceRequest) -> Self {
        Self {
            ns_green_secs: req.time_green_ns,
            ns_yellow_secs: req.time_yellow_ns,
            ew_green_secs: req.time_green_ew,
            ew_yellow_secs: req.time_yellow_ew,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn handle_status(State(api): State<ApiState>) -> Response {
    metrics::record_http_request("/api/v1/status");
    Json(api.scheduler.status()).into_response()
}

/// Parses the body by hand so malformed JSON maps to a plain 400.
async fn handle_sequence(State(api): State<ApiState>, body: Bytes) -> Response {
    metrics::record_http_request("/api/v1/sequence");

    let request: SequenceRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            debug!(error = %e, "rejected sequence body");
            return (StatusCode::BAD_REQUEST, format!("invalid request body: {e}"))
                .into_response();
        }
    };

    match api.scheduler.set_sequence(&request.into()) {
        Ok(()) => (StatusCode::OK, "Sequence updated").into_response(),
        Err(e) => scheduler_error_response(&e),
    }
}

async fn handle_pause(State(api): State<ApiState>) -> Response {
    metrics::record_http_request("/api/v1/pause");
    api.scheduler.pause();
    (StatusCode::OK, "Paused").into_response()
}

async fn handle_resume(State(api): State<ApiState>) -> Response {
    metrics::record_http_request("/api/v1/resume");
    match api.scheduler.resume() {
        Ok(()) => (StatusCode::OK, "Resumed").into_response(),
        Err(e) => scheduler_error_response(&e),
    }
}

async fn handle_history(State(api): State<ApiState>) -> Response {
    metrics::record_http_request("/api/v1/history");
    Json(api.scheduler.history()).into_response()
}

async fn handle_not_found(uri: Uri) -> Response {
    metrics::record_http_request(uri.path());
    (StatusCode::NOT_FOUND, "not found").into_response()
}

fn scheduler_error_response(err: &SchedulerError) -> Response {
    let status = match err {
        SchedulerError::Signal(SignalError::InvalidConfiguration { .. }) => {
            StatusCode::BAD_REQUEST
        }
        SchedulerError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
        SchedulerError::Signal(SignalError::ConflictDetected { .. })
        | SchedulerError::NoRuntime
        | SchedulerError::AlreadyStarted => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}

// ============================================================================
// Helpers
// ============================================================================

/// Parses a bind address string into a full `host:port` form.
///
/// Accepts:
/// - `:8080` → `0.0.0.0:8080`
/// - `8080` → `0.0.0.0:8080`
/// - `1.2.3.4:8080` → as-is
///
/// # Errors
///
/// Returns [`TransportError::ConnectionFailed`] if the result cannot be
/// parsed as a valid socket address.
pub fn parse_bind_addr(input: &str) -> std::result::Result<String, TransportError> {
    let addr = if input.starts_with(':') {
        format!("0.0.0.0{input}")
    } else if input.parse::<u16>().is_ok() {
        format!("0.0.0.0:{input}")
    } else {
        input.to_string()
    };
    addr.parse::<SocketAddr>().map_err(|e| {
        TransportError::ConnectionFailed(format!("invalid bind address \"{input}\": {e}"))
    })?;
    Ok(addr)
}

// ============================================================================
// Tests
// ============================================================================
