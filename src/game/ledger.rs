//! Wager placement and the balance ledger.
//!
//! Placement is the only write path a caller can drive concurrently, so the
//! two races it must survive are handled here: duplicate placement loses to
//! the store's (user, round) uniqueness constraint, and the debit goes
//! through the store's atomic signed-delta primitive rather than a
//! read-modify-write. There is no transaction spanning the wager insert and
//! the debit; a failed debit is compensated by deleting the wager.

use crate::clock::Clock;
use crate::errors::{EngineError, EngineResult, RejectReason, StoreError};
use crate::game::types::{AccountSnapshot, Wager};
use crate::game::window::BettingWindow;
use crate::store::{AccountStore, RoundStore, WagerStore};
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Outcome of a placement request. Rejections are part of the normal
/// protocol and carry the reason back to the caller.
#[derive(Debug, Clone)]
pub enum PlacementOutcome {
    Accepted {
        wager: Wager,
        account: AccountSnapshot,
    },
    Rejected {
        reason: RejectReason,
    },
}

impl PlacementOutcome {
    fn rejected(reason: RejectReason) -> Self {
        PlacementOutcome::Rejected { reason }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, PlacementOutcome::Accepted { .. })
    }
}

pub struct WagerLedger {
    rounds: Arc<dyn RoundStore>,
    wagers: Arc<dyn WagerStore>,
    accounts: Arc<dyn AccountStore>,
    window: BettingWindow,
    clock: Arc<dyn Clock>,
}

impl WagerLedger {
    pub fn new(
        rounds: Arc<dyn RoundStore>,
        wagers: Arc<dyn WagerStore>,
        accounts: Arc<dyn AccountStore>,
        window: BettingWindow,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rounds,
            wagers,
            accounts,
            window,
            clock,
        }
    }

    /// Place a wager for the current round.
    ///
    /// On `Accepted`, the wager is durably recorded and the balance already
    /// debited; the two never diverge. Domain rejections come back as
    /// `Rejected`; only infrastructure faults surface as `Err`.
    pub async fn place_wager(
        &self,
        user_id: Uuid,
        amount: u64,
        on_lucky_seven: bool,
    ) -> EngineResult<PlacementOutcome> {
        if amount == 0 || amount > i64::MAX as u64 {
            return Ok(PlacementOutcome::rejected(RejectReason::InvalidAmount));
        }

        let Some(account) = self.accounts.account(user_id).await? else {
            return Ok(PlacementOutcome::rejected(RejectReason::UnknownAccount));
        };
        if account.balance < amount {
            return Ok(PlacementOutcome::rejected(RejectReason::InsufficientFunds));
        }

        let Some(round) = self.rounds.current_round().await? else {
            return Ok(PlacementOutcome::rejected(RejectReason::NoActiveRound));
        };

        let now = self.clock.now();
        if !self.window.is_open(&round, now) {
            return Ok(PlacementOutcome::rejected(RejectReason::WindowClosed));
        }

        let wager = Wager::pending(user_id, round.id, amount, on_lucky_seven, now);
        match self.wagers.insert_wager(wager.clone()).await {
            Ok(()) => {}
            Err(StoreError::DuplicateWager { .. }) => {
                return Ok(PlacementOutcome::rejected(RejectReason::DuplicateWager));
            }
            Err(e) => return Err(e.into()),
        }

        // The early balance check above is advisory; this debit is the
        // authoritative guard and can still lose to a concurrent credit race.
        match self.accounts.adjust_balance(user_id, -(amount as i64)).await {
            Ok(updated) => {
                debug!(
                    user_id = %user_id,
                    round_id = %round.id,
                    amount,
                    on_lucky_seven,
                    "wager accepted"
                );
                Ok(PlacementOutcome::Accepted {
                    wager,
                    account: AccountSnapshot::from(&updated),
                })
            }
            Err(StoreError::InsufficientFunds { .. }) => {
                self.compensate(wager.id).await;
                Ok(PlacementOutcome::rejected(RejectReason::InsufficientFunds))
            }
            Err(source) => {
                self.compensate(wager.id).await;
                Err(EngineError::Consistency {
                    wager_id: wager.id,
                    source,
                })
            }
        }
    }

    /// Best-effort removal of a wager whose debit failed. If this also fails
    /// the wager is orphaned pending; it can never win funds that were not
    /// staked, so the damage is bounded and logged.
    async fn compensate(&self, wager_id: Uuid) {
        warn!(%wager_id, "debit failed after wager insert, compensating");
        if let Err(e) = self.wagers.remove_wager(wager_id).await {
            error!(%wager_id, "compensating delete failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::game::types::{Account, Round, WagerStatus};
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        ledger: WagerLedger,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ledger = WagerLedger::new(
            store.clone(),
            store.clone(),
            store.clone(),
            BettingWindow::from_secs(10),
            clock.clone(),
        );
        Fixture {
            store,
            clock,
            ledger,
        }
    }

    async fn seed_account(fx: &Fixture, balance: u64) -> Uuid {
        let account = Account::with_bonus("player".to_string(), balance, fx.clock.now());
        let id = account.id;
        fx.store.insert_account(account).await.unwrap();
        id
    }

    async fn seed_open_round(fx: &Fixture) -> Uuid {
        let round = Round::open(Uuid::new_v4(), fx.clock.now());
        let id = round.id;
        fx.store.insert_round(round).await.unwrap();
        id
    }

    #[tokio::test]
    async fn accepted_wager_debits_balance() {
        let fx = fixture();
        let user = seed_account(&fx, 100).await;
        let round = seed_open_round(&fx).await;
        fx.clock.advance(Duration::seconds(2));

        let outcome = fx.ledger.place_wager(user, 50, true).await.unwrap();
        let PlacementOutcome::Accepted { wager, account } = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(wager.round_id, round);
        assert_eq!(wager.status, WagerStatus::Pending);
        assert_eq!(account.balance, 50);

        // Both facts hold together: wager recorded, balance debited.
        let stored = fx
            .store
            .wager_for_user_round(user, round)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.amount, 50);
        assert_eq!(fx.store.account(user).await.unwrap().unwrap().balance, 50);
    }

    #[tokio::test]
    async fn zero_amount_is_invalid() {
        let fx = fixture();
        let user = seed_account(&fx, 100).await;
        seed_open_round(&fx).await;

        let outcome = fx.ledger.place_wager(user, 0, true).await.unwrap();
        assert!(
            matches!(outcome, PlacementOutcome::Rejected { reason: RejectReason::InvalidAmount })
        );
    }

    #[tokio::test]
    async fn unknown_account_is_rejected() {
        let fx = fixture();
        seed_open_round(&fx).await;

        let outcome = fx
            .ledger
            .place_wager(Uuid::new_v4(), 10, true)
            .await
            .unwrap();
        assert!(
            matches!(outcome, PlacementOutcome::Rejected { reason: RejectReason::UnknownAccount })
        );
    }

    #[tokio::test]
    async fn over_balance_is_rejected() {
        let fx = fixture();
        let user = seed_account(&fx, 30).await;
        seed_open_round(&fx).await;

        let outcome = fx.ledger.place_wager(user, 31, true).await.unwrap();
        assert!(matches!(
            outcome,
            PlacementOutcome::Rejected {
                reason: RejectReason::InsufficientFunds
            }
        ));
        assert_eq!(fx.store.account(user).await.unwrap().unwrap().balance, 30);
    }

    #[tokio::test]
    async fn no_round_is_rejected() {
        let fx = fixture();
        let user = seed_account(&fx, 100).await;

        let outcome = fx.ledger.place_wager(user, 10, true).await.unwrap();
        assert!(
            matches!(outcome, PlacementOutcome::Rejected { reason: RejectReason::NoActiveRound })
        );
    }

    #[tokio::test]
    async fn late_wager_hits_closed_window() {
        let fx = fixture();
        let user = seed_account(&fx, 100).await;
        let round = seed_open_round(&fx).await;
        fx.clock.advance(Duration::seconds(11));

        let outcome = fx.ledger.place_wager(user, 50, true).await.unwrap();
        assert!(
            matches!(outcome, PlacementOutcome::Rejected { reason: RejectReason::WindowClosed })
        );

        // Nothing changed: no wager, no debit.
        assert!(fx
            .store
            .wager_for_user_round(user, round)
            .await
            .unwrap()
            .is_none());
        assert_eq!(fx.store.account(user).await.unwrap().unwrap().balance, 100);
    }

    #[tokio::test]
    async fn second_wager_same_round_is_duplicate() {
        let fx = fixture();
        let user = seed_account(&fx, 100).await;
        let round = seed_open_round(&fx).await;

        let first = fx.ledger.place_wager(user, 10, true).await.unwrap();
        assert!(first.is_accepted());

        let second = fx.ledger.place_wager(user, 10, false).await.unwrap();
        assert!(
            matches!(second, PlacementOutcome::Rejected { reason: RejectReason::DuplicateWager })
        );

        // Balance only reflects the first debit and one wager exists.
        assert_eq!(fx.store.account(user).await.unwrap().unwrap().balance, 90);
        assert_eq!(fx.store.wagers_for_round(round).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_placements_admit_exactly_one() {
        let fx = fixture();
        let user = seed_account(&fx, 100).await;
        let round = seed_open_round(&fx).await;

        let ledger = Arc::new(fx.ledger);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.place_wager(user, 10, true).await.unwrap()
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_accepted() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(fx.store.wagers_for_round(round).await.unwrap().len(), 1);
        assert_eq!(fx.store.account(user).await.unwrap().unwrap().balance, 90);
    }
}
