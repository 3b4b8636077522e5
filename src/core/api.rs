//! HTTP + WebSocket API for MoodFi
//!
//! Endpoints:
//! - POST /verify - One-shot vibe check on a simulated capture
//! - POST /session/new - Start a training session
//! - GET /session/{id} - Get session status
//! - POST /session/{id}/capture - Submit a capture for the current challenge
//! - POST /session/{id}/stop - Finalize a session
//! - WS /ws/{id} - Live status updates
//! - GET /health - Health check

use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::core::mock::{MockDetector, SimulatedEngine};
use crate::core::reward::reward_for;
use crate::core::session::TrainingSession;
use crate::core::verifier::{Detector, DetectorStack, FaceVerifier};
use crate::core::ModelAdapter;
use crate::types::{Emotion, Frame, TrainingPhase, TrainingStatus, VerificationResult};
use crate::MATCH_THRESHOLD_PERCENT;

/// One live training session
pub struct ApiSession {
    pub id: String,
    pub session: TrainingSession,
    pub update_tx: broadcast::Sender<TrainingStatus>,
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, ApiSession>>,
    pub stack: Arc<DetectorStack>,
}

/// One-shot verify request. An absent `expressed` simulates an empty frame.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub expressed: Option<Emotion>,
    pub target: Option<Emotion>,
}

/// One-shot verify response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub result: VerificationResult,
    pub reward: f64,
}

/// Create session request
#[derive(Debug, Deserialize)]
pub struct NewSessionRequest {
    pub seed: Option<u64>,
}

/// Create session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
    pub status: TrainingStatus,
}

/// Capture request against the current challenge
#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub expressed: Option<Emotion>,
}

/// Capture response
#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub result: VerificationResult,
    pub matched: bool,
    pub status: TrainingStatus,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Create the API router over the default simulated pipeline
pub fn create_router() -> Router {
    let adapter = Arc::new(ModelAdapter::embedded(Arc::new(SimulatedEngine::new())));
    let stack = Arc::new(DetectorStack::new(vec![
        Arc::new(FaceVerifier::new(adapter)) as Arc<dyn Detector>,
        Arc::new(MockDetector::new()) as Arc<dyn Detector>,
    ]));
    create_router_with_stack(stack)
}

/// Create the API router over a caller-supplied detector stack
pub fn create_router_with_stack(stack: Arc<DetectorStack>) -> Router {
    let state = Arc::new(AppState {
        sessions: RwLock::new(HashMap::new()),
        stack,
    });

    Router::new()
        .route("/health", get(health))
        .route("/verify", post(verify))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session))
        .route("/session/:id/capture", post(capture))
        .route("/session/:id/stop", post(stop_session))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// One-shot vibe check
async fn verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    let frame = frame_for(req.expressed);
    let result = state.stack.verify(&frame, req.target).await;
    let reward = reward_for(&result);
    Json(VerifyResponse { result, reward })
}

/// Start a new training session
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Json<NewSessionResponse> {
    let session_id = generate_session_id();
    let mut session = match req.seed {
        Some(seed) => TrainingSession::with_seed(seed),
        None => TrainingSession::new(),
    };
    let status = session.start();
    let (update_tx, _) = broadcast::channel(100);

    let api_session = ApiSession {
        id: session_id.clone(),
        session,
        update_tx,
    };

    let mut sessions = state.sessions.write().await;
    sessions.insert(session_id.clone(), api_session);
    drop(sessions);

    spawn_session_clock(Arc::clone(&state), session_id.clone());

    Json(NewSessionResponse {
        session_id: session_id.clone(),
        websocket_url: format!("/ws/{}", session_id),
        status,
    })
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TrainingStatus>, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(session.session.status()))
}

/// Submit a capture for the current challenge
async fn capture(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CaptureRequest>,
) -> Result<Json<CaptureResponse>, StatusCode> {
    // Verify before touching the session map, so inference latency never
    // blocks other sessions
    let target = {
        let sessions = state.sessions.read().await;
        let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
        session.session.target()
    };

    let frame = frame_for(req.expressed);
    let result = state.stack.verify(&frame, target).await;

    let matched = match (target, result.dominant_emotion) {
        (Some(target), Some(dominant)) => {
            dominant == target && result.match_score_percent() > MATCH_THRESHOLD_PERCENT
        }
        _ => false,
    };

    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if matched {
        session.session.record_match(true);
        session.session.enforce_bounds();
    }
    let status = session.session.status();
    let _ = session.update_tx.send(status.clone());

    Ok(Json(CaptureResponse {
        result,
        matched,
        status,
    }))
}

/// Finalize a session manually
async fn stop_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TrainingStatus>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let status = session.session.stop();
    let _ = session.update_tx.send(status.clone());
    Ok(Json(status))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let rx = session.update_tx.subscribe();
    drop(sessions);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Handle WebSocket connection
async fn handle_websocket(mut socket: WebSocket, mut rx: broadcast::Receiver<TrainingStatus>) {
    while let Ok(status) = rx.recv().await {
        let json = serde_json::to_string(&status).unwrap_or_default();
        if socket.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

/// Per-session 1-second clock; exits when the session completes or is gone
fn spawn_session_clock(state: Arc<AppState>, id: String) {
    tokio::spawn(async move {
        let mut clock = tokio::time::interval(Duration::from_secs(1));
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately
        clock.tick().await;
        loop {
            clock.tick().await;
            let mut sessions = state.sessions.write().await;
            let Some(entry) = sessions.get_mut(&id) else { break };
            let status = entry.session.tick();
            let _ = entry.update_tx.send(status.clone());
            if status.phase == TrainingPhase::Complete {
                debug!(session = %id, "session clock finished");
                break;
            }
        }
    });
}

/// Synthetic frame for a simulated capture
fn frame_for(expressed: Option<Emotion>) -> Frame {
    match expressed {
        Some(emotion) => Frame::synthetic(emotion, 640, 480),
        None => Frame::synthetic_empty(640, 480),
    }
}

/// Generate session ID
fn generate_session_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("session_{:x}", nanos as u64)
}

/// Run the API server
pub async fn run_server(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("😄 MoodFi API running on {}", addr);
    println!("  POST /verify               - One-shot vibe check");
    println!("  POST /session/new          - Start training session");
    println!("  GET  /session/:id          - Session status");
    println!("  POST /session/:id/capture  - Submit a capture");
    println!("  POST /session/:id/stop     - Finalize session");
    println!("  WS   /ws/:id               - Live updates");
    println!("  GET  /health               - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
