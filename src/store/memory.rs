//! In-memory store backed by lock-free maps.
//!
//! DashMap's per-shard locking makes each single-key mutation atomic: a
//! `get_mut` holds the shard lock while the entry is inspected and updated,
//! which is exactly the conditional-update capability the engine asks of its
//! persistence layer. Round creation order is tracked in a side log so
//! "current round" and "recent closed" stay O(limit) instead of scanning.

use crate::errors::StoreError;
use crate::game::types::{Account, RollOutcome, Round, RoundState, Wager, WagerStatus};
use crate::store::{AccountStore, RoundStore, StoreResult, WagerStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryStore {
    rounds: DashMap<Uuid, Round>,
    /// Round ids in creation order; the scheduler is the only writer.
    round_log: RwLock<Vec<Uuid>>,
    wagers: DashMap<Uuid, Wager>,
    /// (user, round) -> wager id. Insertion through `entry` closes the
    /// check-then-act race between concurrent duplicate placements.
    wager_slots: DashMap<(Uuid, Uuid), Uuid>,
    accounts: DashMap<Uuid, Account>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn log_read(&self) -> StoreResult<Vec<Uuid>> {
        self.round_log
            .read()
            .map(|log| log.clone())
            .map_err(|_| StoreError::Unavailable("round log poisoned".to_string()))
    }
}

#[async_trait]
impl RoundStore for MemoryStore {
    async fn insert_round(&self, round: Round) -> StoreResult<()> {
        let id = round.id;
        self.rounds.insert(id, round);
        self.round_log
            .write()
            .map(|mut log| log.push(id))
            .map_err(|_| StoreError::Unavailable("round log poisoned".to_string()))
    }

    async fn round(&self, id: Uuid) -> StoreResult<Option<Round>> {
        Ok(self.rounds.get(&id).map(|entry| entry.clone()))
    }

    async fn current_round(&self) -> StoreResult<Option<Round>> {
        let log = self.log_read()?;
        for id in log.iter().rev() {
            if let Some(round) = self.rounds.get(id) {
                return Ok(Some(round.clone()));
            }
        }
        Ok(None)
    }

    async fn close_round(
        &self,
        id: Uuid,
        outcome: RollOutcome,
        closed_at: DateTime<Utc>,
    ) -> StoreResult<Round> {
        let mut round = self
            .rounds
            .get_mut(&id)
            .ok_or(StoreError::RoundNotFound(id))?;
        match round.state {
            RoundState::Open => {
                round.state = RoundState::Closed { outcome, closed_at };
                Ok(round.clone())
            }
            RoundState::Closed { .. } => Err(StoreError::RoundAlreadyClosed(id)),
        }
    }

    async fn recent_closed(&self, limit: usize) -> StoreResult<Vec<Round>> {
        let log = self.log_read()?;
        let mut out = Vec::with_capacity(limit);
        for id in log.iter().rev() {
            if out.len() >= limit {
                break;
            }
            if let Some(round) = self.rounds.get(id) {
                if !round.is_open() {
                    out.push(round.clone());
                }
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl WagerStore for MemoryStore {
    async fn insert_wager(&self, wager: Wager) -> StoreResult<()> {
        let slot = (wager.user_id, wager.round_id);
        match self.wager_slots.entry(slot) {
            Entry::Occupied(_) => Err(StoreError::DuplicateWager {
                user_id: wager.user_id,
                round_id: wager.round_id,
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(wager.id);
                self.wagers.insert(wager.id, wager);
                Ok(())
            }
        }
    }

    async fn remove_wager(&self, id: Uuid) -> StoreResult<()> {
        let (_, wager) = self
            .wagers
            .remove(&id)
            .ok_or(StoreError::WagerNotFound(id))?;
        self.wager_slots.remove(&(wager.user_id, wager.round_id));
        Ok(())
    }

    async fn wagers_for_round(&self, round_id: Uuid) -> StoreResult<Vec<Wager>> {
        Ok(self
            .wagers
            .iter()
            .filter(|entry| entry.round_id == round_id)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn wager_for_user_round(
        &self,
        user_id: Uuid,
        round_id: Uuid,
    ) -> StoreResult<Option<Wager>> {
        let Some(wager_id) = self.wager_slots.get(&(user_id, round_id)).map(|slot| *slot) else {
            return Ok(None);
        };
        Ok(self.wagers.get(&wager_id).map(|entry| entry.clone()))
    }

    async fn resolve_wager(&self, id: Uuid, status: WagerStatus) -> StoreResult<bool> {
        let mut wager = self
            .wagers
            .get_mut(&id)
            .ok_or(StoreError::WagerNotFound(id))?;
        if wager.status != WagerStatus::Pending {
            return Ok(false);
        }
        wager.status = status;
        Ok(true)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, account: Account) -> StoreResult<()> {
        self.accounts.insert(account.id, account);
        Ok(())
    }

    async fn account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|entry| entry.clone()))
    }

    async fn adjust_balance(&self, id: Uuid, delta: i64) -> StoreResult<Account> {
        let mut account = self
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::AccountNotFound(id))?;
        if delta < 0 {
            let debit = delta.unsigned_abs();
            if account.balance < debit {
                return Err(StoreError::InsufficientFunds {
                    balance: account.balance,
                    requested: debit,
                });
            }
            account.balance -= debit;
        } else {
            account.balance = account.balance.saturating_add(delta as u64);
        }
        Ok(account.clone())
    }

    async fn record_win(&self, id: Uuid) -> StoreResult<Account> {
        let mut account = self
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::AccountNotFound(id))?;
        account.current_streak += 1;
        account.best_streak = account.best_streak.max(account.current_streak);
        Ok(account.clone())
    }

    async fn record_loss(&self, id: Uuid) -> StoreResult<Account> {
        let mut account = self
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::AccountNotFound(id))?;
        account.current_streak = 0;
        Ok(account.clone())
    }

    async fn top_by_best_streak(&self, limit: usize) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> =
            self.accounts.iter().map(|entry| entry.clone()).collect();
        accounts.sort_by(|a, b| b.best_streak.cmp(&a.best_streak));
        accounts.truncate(limit);
        Ok(accounts)
    }
}
