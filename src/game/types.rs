//! Core domain types: rounds, wagers, accounts and their derived views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The dice result of a closed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub die_a: u8,
    pub die_b: u8,
}

impl RollOutcome {
    pub fn roll_sum(&self) -> u8 {
        self.die_a + self.die_b
    }

    pub fn is_lucky_seven(&self) -> bool {
        self.roll_sum() == 7
    }
}

/// Round lifecycle. The outcome only exists once the round is closed, so a
/// closed round can never be missing its dice and an open round can never
/// carry stale ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RoundState {
    Open,
    Closed {
        outcome: RollOutcome,
        closed_at: DateTime<Utc>,
    },
}

/// A single betting round. Created open by the scheduler, closed exactly once
/// with its outcome, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: RoundState,
}

impl Round {
    pub fn open(id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            state: RoundState::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, RoundState::Open)
    }

    pub fn outcome(&self) -> Option<RollOutcome> {
        match self.state {
            RoundState::Open => None,
            RoundState::Closed { outcome, .. } => Some(outcome),
        }
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            RoundState::Open => None,
            RoundState::Closed { closed_at, .. } => Some(closed_at),
        }
    }
}

/// Wager resolution state. Pending until the round settles, then terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerStatus {
    Pending,
    Won,
    Lost,
}

/// A user's stake in one round. The amount is debited at placement; a win
/// credits the payout back, a loss forfeits the stake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wager {
    pub id: Uuid,
    pub user_id: Uuid,
    pub round_id: Uuid,
    pub amount: u64,
    /// True when the wager backs the roll coming up lucky seven.
    pub on_lucky_seven: bool,
    pub status: WagerStatus,
    pub placed_at: DateTime<Utc>,
}

impl Wager {
    pub fn pending(
        user_id: Uuid,
        round_id: Uuid,
        amount: u64,
        on_lucky_seven: bool,
        placed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            round_id,
            amount,
            on_lucky_seven,
            status: WagerStatus::Pending,
            placed_at,
        }
    }
}

/// Player account. Balance is an integer token count and never goes negative;
/// the store layer enforces the floor atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub balance: u64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn with_bonus(name: String, bonus: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            balance: bonus,
            current_streak: 0,
            best_streak: 0,
            created_at,
        }
    }
}

/// Account view handed to callers and broadcast after settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: Uuid,
    pub name: String,
    pub balance: u64,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl From<&Account> for AccountSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            balance: account.balance,
            current_streak: account.current_streak,
            best_streak: account.best_streak,
        }
    }
}

/// Aggregate produced by settling one round.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundSettlement {
    pub round_id: Uuid,
    /// Terminal result per user that settled in this call.
    pub results: HashMap<Uuid, WagerStatus>,
    /// Post-settlement account snapshot per affected user.
    pub accounts: HashMap<Uuid, AccountSnapshot>,
    /// Wagers resolved by this call.
    pub settled: usize,
    /// Wagers found already resolved (replayed settle is a no-op).
    pub skipped: usize,
    /// Wagers whose update failed; they stay pending and are logged.
    pub failed: usize,
}

impl RoundSettlement {
    pub fn empty(round_id: Uuid) -> Self {
        Self {
            round_id,
            ..Default::default()
        }
    }
}

/// Closed-round summary for the recent-rolls read path, annotated with the
/// caller's own wager outcome when they took part.
#[derive(Debug, Clone, Serialize)]
pub struct RecentRound {
    pub id: Uuid,
    pub die_a: u8,
    pub die_b: u8,
    pub roll_sum: u8,
    pub lucky_seven: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_result: Option<WagerStatus>,
}

/// Leaderboard row: accounts ranked by their best win streak.
#[derive(Debug, Clone, Serialize)]
pub struct StreakEntry {
    pub id: Uuid,
    pub name: String,
    pub best_streak: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_only_when_closed() {
        let mut round = Round::open(Uuid::new_v4(), Utc::now());
        assert!(round.is_open());
        assert!(round.outcome().is_none());
        assert!(round.closed_at().is_none());

        let outcome = RollOutcome { die_a: 3, die_b: 4 };
        let closed_at = Utc::now();
        round.state = RoundState::Closed { outcome, closed_at };

        assert!(!round.is_open());
        assert_eq!(round.outcome(), Some(outcome));
        assert_eq!(round.closed_at(), Some(closed_at));
    }

    #[test]
    fn lucky_seven_detection() {
        assert!(RollOutcome { die_a: 3, die_b: 4 }.is_lucky_seven());
        assert!(RollOutcome { die_a: 6, die_b: 1 }.is_lucky_seven());
        assert!(!RollOutcome { die_a: 6, die_b: 6 }.is_lucky_seven());
        assert!(!RollOutcome { die_a: 1, die_b: 1 }.is_lucky_seven());
    }

    #[test]
    fn round_serializes_with_flattened_state() {
        let round = Round::open(Uuid::new_v4(), Utc::now());
        let json = serde_json::to_value(&round).unwrap();
        assert_eq!(json["status"], "open");
        assert!(json.get("outcome").is_none());

        let closed = Round {
            state: RoundState::Closed {
                outcome: RollOutcome { die_a: 2, die_b: 5 },
                closed_at: Utc::now(),
            },
            ..round
        };
        let json = serde_json::to_value(&closed).unwrap();
        assert_eq!(json["status"], "closed");
        assert_eq!(json["outcome"]["die_a"], 2);
        assert_eq!(json["outcome"]["die_b"], 5);
    }

    #[test]
    fn account_signup_bonus() {
        let account = Account::with_bonus("dana".to_string(), 100, Utc::now());
        assert_eq!(account.balance, 100);
        assert_eq!(account.current_streak, 0);
        assert_eq!(account.best_streak, 0);
    }
}
