//! Route definitions.

use super::handlers::*;
use super::websocket::websocket_handler;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Game endpoints
        .route("/api/game/bet", post(place_bet_handler))
        .route("/api/game/current", get(current_round_handler))
        .route("/api/game/recent", get(recent_rolls_handler))
        .route("/api/game/streaks", get(win_streaks_handler))
        // Account endpoints (identity itself lives upstream)
        .route("/api/accounts", post(create_account_handler))
        .route("/api/accounts/:id", get(get_account_handler))
        // Real-time round events
        .route("/ws", get(websocket_handler))
        .with_state(state)
}
