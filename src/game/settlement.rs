//! Round settlement: resolving wagers against the roll and paying winners.

use crate::errors::{EngineResult, StoreError};
use crate::game::types::{
    Account, AccountSnapshot, RollOutcome, RoundSettlement, Wager, WagerStatus,
};
use crate::store::{AccountStore, WagerStore};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Payout multipliers. Backing the lucky seven pays long odds because two
/// dice land on seven only 6 times in 36; the safe side pays even money.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutTable {
    lucky_seven_multiplier: u64,
    standard_multiplier: u64,
}

impl PayoutTable {
    pub fn new(lucky_seven_multiplier: u64, standard_multiplier: u64) -> Self {
        Self {
            lucky_seven_multiplier,
            standard_multiplier,
        }
    }

    /// Total returned to a winner: the original stake plus winnings.
    pub fn payout(&self, amount: u64, on_lucky_seven: bool) -> u64 {
        let multiplier = if on_lucky_seven {
            self.lucky_seven_multiplier
        } else {
            self.standard_multiplier
        };
        amount.saturating_add(amount.saturating_mul(multiplier))
    }
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self::new(7, 1)
    }
}

/// Resolves every wager of a closed round and applies the ledger effects.
///
/// Wagers settle independently: the terminal status transition is the
/// idempotency gate (a wager already resolved settles as a no-op), and a
/// failed update on one wager is logged and skipped without aborting the
/// rest of the batch. There is no partial-abort path by construction.
pub struct SettlementEngine {
    wagers: Arc<dyn WagerStore>,
    accounts: Arc<dyn AccountStore>,
    payouts: PayoutTable,
}

impl SettlementEngine {
    pub fn new(
        wagers: Arc<dyn WagerStore>,
        accounts: Arc<dyn AccountStore>,
        payouts: PayoutTable,
    ) -> Self {
        Self {
            wagers,
            accounts,
            payouts,
        }
    }

    /// Settle all wagers of `round_id` against `outcome`.
    ///
    /// Safe to call more than once: replays find every wager already
    /// terminal and resolve nothing.
    pub async fn settle(
        &self,
        round_id: Uuid,
        outcome: RollOutcome,
    ) -> EngineResult<RoundSettlement> {
        let wagers = self.wagers.wagers_for_round(round_id).await?;
        let mut settlement = RoundSettlement::empty(round_id);

        for wager in &wagers {
            match self.settle_one(wager, outcome).await {
                Ok(Some((status, account))) => {
                    settlement.results.insert(wager.user_id, status);
                    settlement
                        .accounts
                        .insert(wager.user_id, AccountSnapshot::from(&account));
                    settlement.settled += 1;
                }
                Ok(None) => settlement.skipped += 1,
                Err(e) => {
                    error!(
                        wager_id = %wager.id,
                        user_id = %wager.user_id,
                        "failed to settle wager: {}",
                        e
                    );
                    settlement.failed += 1;
                }
            }
        }

        info!(
            round_id = %round_id,
            settled = settlement.settled,
            skipped = settlement.skipped,
            failed = settlement.failed,
            "round settled"
        );
        Ok(settlement)
    }

    /// Resolve a single wager. Returns `None` when the wager was already
    /// terminal (replayed settlement, or a racing resolver won).
    async fn settle_one(
        &self,
        wager: &Wager,
        outcome: RollOutcome,
    ) -> Result<Option<(WagerStatus, Account)>, StoreError> {
        let won = wager.on_lucky_seven == outcome.is_lucky_seven();
        let status = if won {
            WagerStatus::Won
        } else {
            WagerStatus::Lost
        };

        // The Pending->terminal transition is the gate; taking it exactly
        // once is what makes double-settlement unable to double-pay.
        if !self.wagers.resolve_wager(wager.id, status).await? {
            return Ok(None);
        }

        let account = if won {
            let payout = self.payouts.payout(wager.amount, wager.on_lucky_seven);
            self.accounts
                .adjust_balance(wager.user_id, payout as i64)
                .await?;
            self.accounts.record_win(wager.user_id).await?
        } else {
            // The stake was debited at placement; a loss forfeits it.
            self.accounts.record_loss(wager.user_id).await?
        };

        Ok(Some((status, account)))
    }
}
