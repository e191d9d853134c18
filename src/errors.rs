//! Error types for the wagering engine.
//!
//! Placement-path problems are data, not errors: they become a
//! [`RejectReason`] inside the placement outcome and are never thrown past
//! the service boundary. Only infrastructure faults and broken multi-step
//! updates propagate as [`EngineError`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Why a wager placement was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Amount was zero or not representable as a signed delta.
    InvalidAmount,
    /// No account exists for the supplied user id.
    UnknownAccount,
    /// Amount exceeds the account balance.
    InsufficientFunds,
    /// No round has been opened yet.
    NoActiveRound,
    /// The betting window for the current round has elapsed.
    WindowClosed,
    /// The user already holds a wager in the current round.
    DuplicateWager,
}

impl RejectReason {
    /// Whether retrying the same request later can succeed.
    ///
    /// A closed window or missing round is transient (the next round opens
    /// shortly); the rest will fail again unless the caller changes something.
    pub fn retryable(&self) -> bool {
        matches!(self, RejectReason::NoActiveRound | RejectReason::WindowClosed)
    }

    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::InvalidAmount => "Wager amount must be a positive integer",
            RejectReason::UnknownAccount => "Account not found",
            RejectReason::InsufficientFunds => "Insufficient balance",
            RejectReason::NoActiveRound => "No active round found",
            RejectReason::WindowClosed => "Sorry, the betting window closed",
            RejectReason::DuplicateWager => "A wager was already placed for this round",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Store-layer failures.
///
/// The domain-meaningful variants are matched on by the ledger and settlement
/// paths; `Unavailable` is the catch-all for a backend that cannot serve the
/// request at all.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("round {0} not found")]
    RoundNotFound(Uuid),

    #[error("account {0} not found")]
    AccountNotFound(Uuid),

    #[error("wager {0} not found")]
    WagerNotFound(Uuid),

    #[error("round {0} is already closed")]
    RoundAlreadyClosed(Uuid),

    #[error("user {user_id} already has a wager in round {round_id}")]
    DuplicateWager { user_id: Uuid, round_id: Uuid },

    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: u64, requested: u64 },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Faults that escape the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The wager was inserted but the balance debit failed for a reason other
    /// than the floor check. A compensating delete has been attempted; the
    /// caller must treat the placement as failed.
    #[error("wager {wager_id} recorded but debit failed: {source}")]
    Consistency {
        wager_id: Uuid,
        #[source]
        source: StoreError,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
