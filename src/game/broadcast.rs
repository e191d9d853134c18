//! Round lifecycle event fan-out.
//!
//! Delivery is best-effort and at-most-once per observer: a subscriber that
//! is not listening when an event fires never sees it, and resynchronizes
//! through the recent-rounds read path instead. A publish with no observers
//! is normal, not an error.

use crate::game::types::{AccountSnapshot, RollOutcome, Round, RoundSettlement, WagerStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// Aggregated result of one closed round, as published to observers.
#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    pub id: Uuid,
    pub die_a: u8,
    pub die_b: u8,
    pub roll_sum: u8,
    pub lucky_seven: bool,
    pub closed_at: DateTime<Utc>,
    /// Win/loss per user whose wager settled in this round.
    pub user_results: HashMap<Uuid, WagerStatus>,
    /// Post-settlement account snapshots for the same users.
    pub accounts: HashMap<Uuid, AccountSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    #[serde(rename = "round_opened")]
    RoundOpened {
        id: Uuid,
        created_at: DateTime<Utc>,
    },
    #[serde(rename = "round_result")]
    RoundResult(RoundResult),
}

#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<GameEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn publish_round_opened(&self, round: &Round) {
        self.publish(GameEvent::RoundOpened {
            id: round.id,
            created_at: round.created_at,
        });
    }

    pub fn publish_round_result(
        &self,
        round: &Round,
        outcome: RollOutcome,
        closed_at: DateTime<Utc>,
        settlement: RoundSettlement,
    ) {
        self.publish(GameEvent::RoundResult(RoundResult {
            id: round.id,
            die_a: outcome.die_a,
            die_b: outcome.die_b,
            roll_sum: outcome.roll_sum(),
            lucky_seven: outcome.is_lucky_seven(),
            closed_at,
            user_results: settlement.results,
            accounts: settlement.accounts,
        }));
    }

    fn publish(&self, event: GameEvent) {
        if self.tx.send(event).is_err() {
            debug!("no subscribers for game event");
        }
    }
}
