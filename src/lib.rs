//! Dealer Ops API
//!
//! Backend de inventario de vehículos: roles y permisos, ARB, reportes,
//! importación de inventario, mensajes y archivos.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::{auth::auth_middleware, cors::cors_layer};
use crate::state::AppState;

/// Router completo: `/health` público y `/api` autenticado
pub fn build_router(state: AppState) -> Router {
    // El contenido de los uploads viaja en base64 dentro del JSON
    let body_limit = state.config.max_upload_bytes.saturating_mul(2).max(1024 * 1024);

    let api = routes::api_router().route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

/// Estado del servicio y de la base de datos
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match database::connection::ping(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "connected", "timestamp": timestamp })),
        ),
        Err(e) => {
            tracing::error!("❌ Health check: base de datos no disponible: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable", "timestamp": timestamp })),
            )
        }
    }
}
