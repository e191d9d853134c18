//! Request handlers.
//!
//! Placement rejections are part of the protocol: they come back as a 400
//! with a structured body naming the reason, never as a bare error. Only
//! engine faults map to 500.

use super::models::*;
use crate::errors::EngineError;
use crate::game::ledger::PlacementOutcome;
use crate::game::service::GameService;
use crate::VERSION;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Shared application state.
pub struct AppState {
    pub service: Arc<GameService>,
}

fn internal_error(context: &str, e: EngineError) -> (StatusCode, String) {
    error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong".to_string(),
    )
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: VERSION.to_string(),
    })
}

/// POST /api/game/bet
pub async fn place_bet_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlaceBetRequest>,
) -> Result<(StatusCode, Json<PlaceBetResponse>), (StatusCode, String)> {
    let outcome = state
        .service
        .place_wager(request.user_id, request.amount, request.on_lucky_seven)
        .await
        .map_err(|e| internal_error("place bet failed", e))?;

    match outcome {
        PlacementOutcome::Accepted { account, .. } => {
            Ok((StatusCode::OK, Json(PlaceBetResponse::accepted(account))))
        }
        PlacementOutcome::Rejected { reason } => Ok((
            StatusCode::BAD_REQUEST,
            Json(PlaceBetResponse::rejected(reason)),
        )),
    }
}

/// GET /api/game/current
pub async fn current_round_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CurrentRoundResponse>, (StatusCode, String)> {
    let round = state
        .service
        .current_round()
        .await
        .map_err(|e| internal_error("current round lookup failed", e))?
        .ok_or((StatusCode::NOT_FOUND, "No active round found".to_string()))?;

    let (betting_open, betting_closes_in_secs) = state.service.window_state(&round);
    Ok(Json(CurrentRoundResponse {
        id: round.id,
        created_at: round.created_at,
        betting_open,
        betting_closes_in_secs,
    }))
}

/// GET /api/game/recent?user_id=...&limit=...
pub async fn recent_rolls_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentRollsQuery>,
) -> Result<Json<Vec<crate::game::types::RecentRound>>, (StatusCode, String)> {
    let rounds = state
        .service
        .recent_rounds(query.user_id, query.limit)
        .await
        .map_err(|e| internal_error("recent rolls lookup failed", e))?;
    Ok(Json(rounds))
}

/// GET /api/game/streaks
pub async fn win_streaks_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<crate::game::types::StreakEntry>>, (StatusCode, String)> {
    let entries = state
        .service
        .win_streak_leaderboard(query.limit)
        .await
        .map_err(|e| internal_error("leaderboard lookup failed", e))?;
    Ok(Json(entries))
}

/// POST /api/accounts
pub async fn create_account_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Json<crate::game::types::Account>, (StatusCode, String)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Name must not be empty".to_string()));
    }
    let account = state
        .service
        .create_account(name.to_string())
        .await
        .map_err(|e| internal_error("account creation failed", e))?;
    Ok(Json(account))
}

/// GET /api/accounts/:id
pub async fn get_account_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<crate::game::types::Account>, (StatusCode, String)> {
    let account = state
        .service
        .account(user_id)
        .await
        .map_err(|e| internal_error("account lookup failed", e))?
        .ok_or((StatusCode::NOT_FOUND, "Account not found".to_string()))?;
    Ok(Json(account))
}
