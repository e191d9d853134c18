//! Game service facade.
//!
//! Bundles the stores, the placement ledger and the broadcaster behind the
//! operations the outside world is allowed to call. Identity is an external
//! collaborator: the `user_id` arriving here is trusted to be pre-validated.

use crate::clock::Clock;
use crate::config::GameConfig;
use crate::errors::EngineResult;
use crate::game::broadcast::{EventBroadcaster, GameEvent};
use crate::game::ledger::{PlacementOutcome, WagerLedger};
use crate::game::types::{Account, RecentRound, Round, StreakEntry};
use crate::game::window::BettingWindow;
use crate::store::{AccountStore, RoundStore, WagerStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

pub struct GameService {
    rounds: Arc<dyn RoundStore>,
    wagers: Arc<dyn WagerStore>,
    accounts: Arc<dyn AccountStore>,
    ledger: WagerLedger,
    broadcaster: EventBroadcaster,
    window: BettingWindow,
    clock: Arc<dyn Clock>,
    config: GameConfig,
}

impl GameService {
    pub fn new(
        rounds: Arc<dyn RoundStore>,
        wagers: Arc<dyn WagerStore>,
        accounts: Arc<dyn AccountStore>,
        broadcaster: EventBroadcaster,
        clock: Arc<dyn Clock>,
        config: GameConfig,
    ) -> Self {
        let window = BettingWindow::from_secs(config.betting_window_secs);
        let ledger = WagerLedger::new(
            rounds.clone(),
            wagers.clone(),
            accounts.clone(),
            window,
            clock.clone(),
        );
        Self {
            rounds,
            wagers,
            accounts,
            ledger,
            broadcaster,
            window,
            clock,
            config,
        }
    }

    /// Place a wager on the current round for `user_id`.
    pub async fn place_wager(
        &self,
        user_id: Uuid,
        amount: u64,
        on_lucky_seven: bool,
    ) -> EngineResult<PlacementOutcome> {
        self.ledger.place_wager(user_id, amount, on_lucky_seven).await
    }

    /// The most recently created round, if any.
    pub async fn current_round(&self) -> EngineResult<Option<Round>> {
        Ok(self.rounds.current_round().await?)
    }

    /// Whether and for how long the given round still accepts wagers.
    pub fn window_state(&self, round: &Round) -> (bool, i64) {
        let now = self.clock.now();
        (
            self.window.is_open(round, now),
            self.window.remaining_secs(round, now),
        )
    }

    /// Settled rounds, newest first, each annotated with the caller's own
    /// wager outcome when they took part. `limit` of zero falls back to the
    /// configured default.
    pub async fn recent_rounds(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> EngineResult<Vec<RecentRound>> {
        let limit = if limit == 0 {
            self.config.recent_rounds_limit
        } else {
            limit
        };
        let rounds = self.rounds.recent_closed(limit).await?;

        let mut out = Vec::with_capacity(rounds.len());
        for round in rounds {
            // recent_closed only returns closed rounds, so both fields exist.
            let Some(outcome) = round.outcome() else {
                continue;
            };
            let Some(closed_at) = round.closed_at() else {
                continue;
            };
            let user_result = self
                .wagers
                .wager_for_user_round(user_id, round.id)
                .await?
                .map(|wager| wager.status);
            out.push(RecentRound {
                id: round.id,
                die_a: outcome.die_a,
                die_b: outcome.die_b,
                roll_sum: outcome.roll_sum(),
                lucky_seven: outcome.is_lucky_seven(),
                created_at: round.created_at,
                closed_at,
                user_result,
            });
        }
        Ok(out)
    }

    /// Accounts ranked by best win streak, descending.
    pub async fn win_streak_leaderboard(&self, limit: usize) -> EngineResult<Vec<StreakEntry>> {
        let limit = if limit == 0 {
            self.config.leaderboard_size
        } else {
            limit
        };
        let accounts = self.accounts.top_by_best_streak(limit).await?;
        Ok(accounts
            .iter()
            .map(|account| StreakEntry {
                id: account.id,
                name: account.name.clone(),
                best_streak: account.best_streak,
            })
            .collect())
    }

    /// Create an account seeded with the signup bonus.
    pub async fn create_account(&self, name: String) -> EngineResult<Account> {
        let account = Account::with_bonus(name, self.config.signup_bonus, self.clock.now());
        self.accounts.insert_account(account.clone()).await?;
        info!(account_id = %account.id, balance = account.balance, "account created");
        Ok(account)
    }

    pub async fn account(&self, user_id: Uuid) -> EngineResult<Option<Account>> {
        Ok(self.accounts.account(user_id).await?)
    }

    /// Live feed of round lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.broadcaster.subscribe()
    }
}
