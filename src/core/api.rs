//! HTTP + WebSocket API for the presentation layer
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /session - Current session snapshot
//! - POST /session/start - Begin the liveness test
//! - POST /session/reset - Abort and return to waiting
//! - POST /session/frame - Submit one detector result
//! - GET /diagnostics - FPS and last face values
//! - WS /ws - Live step-changed events

use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::core::{FeedOutcome, SessionController};
use crate::error::LivenessError;
use crate::types::{
    DiagnosticsSnapshot, FaceMeasurement, FrameReport, LivenessConfig, LivenessStatus,
    LivenessStep, ReasonCode, SessionSnapshot, StepChanged,
};

/// App state: the one controller, single writer behind a mutex
pub struct AppState {
    pub controller: Mutex<SessionController>,
}

/// Submit frame request
#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    /// Generation captured when the frame was taken
    pub generation: u64,
    #[serde(default)]
    pub faces: Vec<FaceMeasurement>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Submit frame response
#[derive(Debug, Serialize)]
pub struct FrameResponse {
    pub result: FeedOutcome,
    pub step: LivenessStep,
    pub status: LivenessStatus,
    pub reason: ReasonCode,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub generation: u64,
}

/// Create the API router
pub fn create_router(config: LivenessConfig) -> Router {
    let state = Arc::new(AppState {
        controller: Mutex::new(SessionController::new(config)),
    });

    Router::new()
        .route("/health", get(health))
        .route("/session", get(get_session))
        .route("/session/start", post(start_session))
        .route("/session/reset", post(reset_session))
        .route("/session/frame", post(submit_frame))
        .route("/diagnostics", get(get_diagnostics))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let controller = state.controller.lock().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        generation: controller.generation(),
    })
}

/// Get session status
async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    let controller = state.controller.lock().await;
    Json(controller.snapshot())
}

/// Start the test
async fn start_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StepChanged>, (StatusCode, Json<ErrorResponse>)> {
    let mut controller = state.controller.lock().await;
    match controller.start() {
        Ok(event) => Ok(Json(event)),
        Err(err @ LivenessError::AlreadyInProgress { .. }) => {
            Err((StatusCode::CONFLICT, Json(ErrorResponse { error: err.to_string() })))
        }
        Err(err) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: err.to_string() }),
        )),
    }
}

/// Reset the test
async fn reset_session(State(state): State<Arc<AppState>>) -> Json<StepChanged> {
    let mut controller = state.controller.lock().await;
    Json(controller.reset())
}

/// Submit one detector result
async fn submit_frame(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FrameRequest>,
) -> Json<FrameResponse> {
    let report = FrameReport { faces: req.faces, error: req.error };
    let mut controller = state.controller.lock().await;
    let outcome = controller.feed_frame(&report, req.generation);

    Json(FrameResponse {
        reason: outcome.reason(),
        step: controller.step(),
        status: controller.status(),
        result: outcome,
    })
}

/// Debug overlay values
async fn get_diagnostics(State(state): State<Arc<AppState>>) -> Json<DiagnosticsSnapshot> {
    let controller = state.controller.lock().await;
    Json(controller.diagnostics())
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.controller.lock().await.subscribe();
    ws.on_upgrade(move |socket| handle_websocket(socket, rx))
}

/// Forward step changes until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<StepChanged>) {
    let (mut sender, mut receiver) = socket.split();
    debug!("WebSocket subscriber connected");

    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(err) => {
                            warn!("Failed to encode step change: {}", err);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket subscriber lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("WebSocket subscriber disconnected");
}

/// Run the API server
pub async fn run_server(addr: &str, config: LivenessConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Vivacity API listening on {}", addr);
    println!("Vivacity API running on {}", addr);
    println!("  GET  /health         - Health check");
    println!("  GET  /session        - Session status");
    println!("  POST /session/start  - Start test");
    println!("  POST /session/reset  - Reset test");
    println!("  POST /session/frame  - Submit detector result");
    println!("  GET  /diagnostics    - FPS / face debug values");
    println!("  WS   /ws             - Live step changes");
    axum::serve(listener, router).await?;
    Ok(())
}
