//! API request/response models.

use crate::errors::RejectReason;
use crate::game::types::AccountSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body for POST /api/game/bet. The user id comes from the upstream
/// identity layer; this service trusts it.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceBetRequest {
    pub user_id: Uuid,
    pub amount: u64,
    pub on_lucky_seven: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceBetResponse {
    pub message: String,
    pub status: BetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    /// Whether retrying the same request later can succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountSnapshot>,
}

impl PlaceBetResponse {
    pub fn accepted(account: AccountSnapshot) -> Self {
        Self {
            message: "Wager placed successfully".to_string(),
            status: BetStatus::Accepted,
            reason: None,
            retryable: None,
            account: Some(account),
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            message: reason.message().to_string(),
            status: BetStatus::Rejected,
            reason: Some(reason),
            retryable: Some(reason.retryable()),
            account: None,
        }
    }
}

/// Current round with its live betting-window state.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentRoundResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub betting_open: bool,
    pub betting_closes_in_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentRollsQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
}
