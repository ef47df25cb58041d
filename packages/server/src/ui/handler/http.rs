//! Status HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::{
    infrastructure::dto::http::{HealthDto, HistoryEntryDto, OnlineUsersDto},
    ui::state::AppState,
};

/// Query parameters of `GET /api/history`
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Build the status API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/users/online", get(get_online_users))
        .route("/api/history", get(get_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// Currently online users in registration order
pub async fn get_online_users(State(state): State<Arc<AppState>>) -> Json<OnlineUsersDto> {
    let users = state.get_online_users_usecase.execute().await;
    Json(OnlineUsersDto::from(users))
}

/// Most recent public messages, oldest first
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntryDto>>, StatusCode> {
    let limit = query.limit.unwrap_or(state.history_window);
    match state.get_history_usecase.execute(limit).await {
        Ok(entries) => Ok(Json(entries.into_iter().map(HistoryEntryDto::from).collect())),
        Err(e) => {
            tracing::error!("Failed to read history: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
