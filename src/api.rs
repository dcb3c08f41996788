//! REST API for Stock Sage
//!
//! Exposes the picker, the presenter and the credential lifecycle over HTTP
//! for a browser front end.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{AnalysisError, SageError};
use crate::session::Session;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub api_key: String,
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

type ApiResult = (StatusCode, Json<ApiResponse>);

fn failure(err: SageError) -> ApiResult {
    let status = match &err {
        SageError::UnknownSymbol(_) => StatusCode::NOT_FOUND,
        SageError::Analysis(AnalysisError::MissingCredential) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::error(err.to_string())))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub session: Arc<Session>,
}

/// =============================
/// Handlers
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_stocks(
    State(state): State<ApiState>,
    Query(query): Query<StockQuery>,
) -> ApiResult {
    let stocks = state.session.search(query.q.as_deref().unwrap_or_default());
    (StatusCode::OK, Json(ApiResponse::success(stocks)))
}

async fn select_stock(
    State(state): State<ApiState>,
    Json(req): Json<SelectRequest>,
) -> ApiResult {
    info!("Received selection: {}", req.symbol);

    match state.session.select(&req.symbol) {
        Ok(ticket) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(serde_json::json!({
                "stock": ticket.stock,
                "generation": ticket.generation,
            }))),
        ),
        Err(e) => failure(e),
    }
}

async fn current_analysis(State(state): State<ApiState>) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(state.session.view())))
}

async fn credential_status(State(state): State<ApiState>) -> ApiResult {
    let credential = state.session.credential();
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "configured": credential.is_some(),
            "fingerprint": credential.map(|c| c.fingerprint()),
        }))),
    )
}

async fn submit_credential(
    State(state): State<ApiState>,
    Json(req): Json<CredentialRequest>,
) -> ApiResult {
    match state.session.submit_credential(&req.api_key).await {
        Ok(credential) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "configured": true,
                "fingerprint": credential.fingerprint(),
            }))),
        ),
        Err(e) => failure(e),
    }
}

async fn reset_credential(State(state): State<ApiState>) -> ApiResult {
    match state.session.reset_credential().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({ "configured": false }))),
        ),
        Err(e) => failure(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(session: Arc<Session>) -> Router {
    let state = ApiState { session };

    Router::new()
        .route("/health", get(health))
        .route("/api/stocks", get(list_stocks))
        .route("/api/select", post(select_stock))
        .route("/api/analysis", get(current_analysis))
        .route(
            "/api/credential",
            get(credential_status)
                .put(submit_credential)
                .delete(reset_credential),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(session: Arc<Session>, port: u16) -> crate::Result<()> {
    let router = create_router(session);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
