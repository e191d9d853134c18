//! Betting-window admission gate.

use crate::game::types::Round;
use chrono::{DateTime, Duration, Utc};

/// Pure time predicate deciding whether a round still accepts wagers.
///
/// The window starts at round creation and is never extended; the boundary
/// itself is inclusive, so a wager arriving exactly `window` after creation
/// is still admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BettingWindow {
    window: Duration,
}

impl BettingWindow {
    pub fn from_secs(secs: i64) -> Self {
        Self {
            window: Duration::seconds(secs),
        }
    }

    pub fn is_open(&self, round: &Round, now: DateTime<Utc>) -> bool {
        round.is_open() && now - round.created_at <= self.window
    }

    /// Seconds until the window closes, clamped at zero.
    pub fn remaining_secs(&self, round: &Round, now: DateTime<Utc>) -> i64 {
        if !round.is_open() {
            return 0;
        }
        (round.created_at + self.window - now).num_seconds().max(0)
    }
}
