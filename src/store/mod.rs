//! Persistence collaborators.
//!
//! The engine only requires three narrow capabilities from its stores: a
//! conditional Open→Closed transition on rounds, a uniqueness constraint on
//! (user, round) for wagers, and an atomic signed balance delta with a zero
//! floor on accounts. Everything else is plain create/find/update. The traits
//! keep the engine testable against fakes; [`memory::MemoryStore`] is the
//! bundled implementation.

pub mod memory;

use crate::errors::StoreError;
use crate::game::types::{Account, RollOutcome, Round, Wager, WagerStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RoundStore: Send + Sync {
    /// Record a freshly opened round.
    async fn insert_round(&self, round: Round) -> StoreResult<()>;

    async fn round(&self, id: Uuid) -> StoreResult<Option<Round>>;

    /// The most recently created round, open or closed.
    async fn current_round(&self) -> StoreResult<Option<Round>>;

    /// Transition a round Open→Closed exactly once, stamping its outcome.
    /// Fails with `RoundAlreadyClosed` on a replay.
    async fn close_round(
        &self,
        id: Uuid,
        outcome: RollOutcome,
        closed_at: DateTime<Utc>,
    ) -> StoreResult<Round>;

    /// Closed rounds, newest first.
    async fn recent_closed(&self, limit: usize) -> StoreResult<Vec<Round>>;
}

#[async_trait]
pub trait WagerStore: Send + Sync {
    /// Record a pending wager. The store enforces at most one wager per
    /// (user, round) and fails the loser of a race with `DuplicateWager`.
    async fn insert_wager(&self, wager: Wager) -> StoreResult<()>;

    /// Compensating delete for a placement whose debit failed.
    async fn remove_wager(&self, id: Uuid) -> StoreResult<()>;

    async fn wagers_for_round(&self, round_id: Uuid) -> StoreResult<Vec<Wager>>;

    async fn wager_for_user_round(
        &self,
        user_id: Uuid,
        round_id: Uuid,
    ) -> StoreResult<Option<Wager>>;

    /// Move a wager from Pending to a terminal status. Returns false when the
    /// wager was already terminal, so settlement replays resolve nothing.
    async fn resolve_wager(&self, id: Uuid, status: WagerStatus) -> StoreResult<bool>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert_account(&self, account: Account) -> StoreResult<()>;

    async fn account(&self, id: Uuid) -> StoreResult<Option<Account>>;

    /// Apply a signed balance delta atomically. A debit that would take the
    /// balance below zero fails with `InsufficientFunds` and changes nothing.
    /// Both the placement debit and the settlement credit go through here.
    async fn adjust_balance(&self, id: Uuid, delta: i64) -> StoreResult<Account>;

    /// Extend the win streak, folding it into the best streak.
    async fn record_win(&self, id: Uuid) -> StoreResult<Account>;

    /// Reset the current streak after a loss.
    async fn record_loss(&self, id: Uuid) -> StoreResult<Account>;

    /// Accounts ranked by best streak, descending.
    async fn top_by_best_streak(&self, limit: usize) -> StoreResult<Vec<Account>>;
}
