//! Hiroma chat server library.
//!
//! Clients authenticate over a persistent TCP connection, then exchange public
//! messages broadcast to every online user, with presence tracking, per-session
//! rate limiting and history replay on join.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
pub mod error;

use std::sync::Arc;

use hiroma_shared::time::SystemClock;

use crate::{
    config::ServerConfig,
    domain::{HistoryStore, UserStore},
    error::ServerError,
    infrastructure::repository::{
        DEFAULT_HISTORY_CAPACITY, InMemoryHistoryStore, InMemoryUserStore, JsonFileUserStore,
        JsonLinesHistoryStore,
    },
    ui::state::AppState,
};

/// Open the configured stores and wire the application state.
///
/// Stores without a configured file are kept in memory.
pub async fn build_app_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let user_store: Arc<dyn UserStore> = match &config.users_file {
        Some(path) => Arc::new(JsonFileUserStore::open(path).await?),
        None => {
            tracing::info!("No users file configured, credentials are kept in memory");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let capacity = DEFAULT_HISTORY_CAPACITY.max(config.history_window);
    let history_store: Arc<dyn HistoryStore> = match &config.history_file {
        Some(path) => Arc::new(JsonLinesHistoryStore::open(path, capacity).await?),
        None => Arc::new(InMemoryHistoryStore::with_capacity(capacity)),
    };

    Ok(AppState::new(
        user_store,
        history_store,
        Arc::new(SystemClock),
        config.min_message_interval,
        config.history_window,
    ))
}
