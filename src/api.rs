//! REST API server for the voice banking assistant
//!
//! Exposes the turn pipeline plus account lookups via HTTP endpoints
//! Integrates with frontend UI

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::models::Language;
use crate::pipeline::{Pipeline, TurnInput};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VoiceBankingRequest {
    pub user_id: Option<String>,
    pub thread_id: Option<String>,
    pub user_input: Option<String>,
    /// Base64 payload, with or without a `data:` URL prefix.
    pub audio_data: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<Pipeline>,
}

/// =============================
/// Helpers
/// =============================

fn decode_audio(raw: &str) -> Option<Vec<u8>> {
    let payload = match raw.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => raw,
    };
    STANDARD.decode(payload.trim()).ok()
}

fn session_token(user_id: &str) -> String {
    use sha2::{Digest, Sha256};

    let seed = format!("{}:{}", user_id, chrono::Utc::now().timestamp_millis());
    hex::encode(Sha256::digest(seed.as_bytes()))
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "transcription_available": state.pipeline.has_transcriber(),
        "generation_available": state.pipeline.has_generator(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Main Turn Endpoint
/// =============================

async fn voice_banking(
    State(state): State<ApiState>,
    Json(req): Json<VoiceBankingRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    info!(
        user_id = ?req.user_id,
        has_audio = req.audio_data.is_some(),
        "Received voice banking request"
    );

    if req.user_input.as_deref().map_or(true, |t| t.is_empty()) && req.audio_data.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No user input or audio provided".into())),
        );
    }

    let audio = match req.audio_data.as_deref() {
        Some(raw) => match decode_audio(raw) {
            Some(bytes) => Some(bytes),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error("Invalid audio data".into())),
                )
            }
        },
        None => None,
    };

    let input = TurnInput {
        user_id: req.user_id,
        thread_id: req.thread_id,
        text: req.user_input,
        audio,
        language: req.language.as_deref().and_then(Language::parse),
    };

    match state.pipeline.run_turn(input).await {
        Ok(reply) => (StatusCode::OK, Json(ApiResponse::success(reply))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Assistant turn failed: {}", e))),
        ),
    }
}

/// =============================
/// Account Endpoints
/// =============================

async fn authenticate(
    State(state): State<ApiState>,
    Json(req): Json<AuthRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    match state
        .pipeline
        .accounts()
        .authenticate(&req.username, &req.password)
        .await
    {
        Some(profile) => {
            info!(user_id = %profile.user_id, "Authentication succeeded");
            let token = session_token(&profile.user_id);
            (
                StatusCode::OK,
                Json(ApiResponse::success(serde_json::json!({
                    "user": profile,
                    "token": token,
                }))),
            )
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid credentials".into())),
        ),
    }
}

async fn get_user(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.pipeline.accounts().get(&user_id).await {
        Some(profile) => (StatusCode::OK, Json(ApiResponse::success(profile))),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("User not found".into())),
        ),
    }
}

async fn get_transactions(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    if state.pipeline.accounts().get(&user_id).await.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No transactions found".into())),
        );
    }

    let transactions = state.pipeline.accounts().transactions(&user_id).await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "user_id": user_id,
            "transactions": transactions,
        }))),
    )
}

/// =============================
/// Router
/// =============================

pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    let state = ApiState { pipeline };

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/api/health", axum::routing::get(health))
        .route("/api/voice-banking", post(voice_banking))
        .route("/api/authenticate", post(authenticate))
        .route("/api/user/:user_id", axum::routing::get(get_user))
        .route(
            "/api/transactions/:user_id",
            axum::routing::get(get_transactions),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    pipeline: Arc<Pipeline>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(pipeline);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
