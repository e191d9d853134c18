//! Round lifecycle scheduler.
//!
//! One timer is the single scheduling authority: each tick closes the
//! current round, settles it synchronously, then opens the next one, so no
//! two rounds are ever concurrently closed-but-unsettled. Failures inside a
//! cycle are logged and contained; a broken settlement must never stop the
//! next round from opening.

use crate::clock::Clock;
use crate::dice::DiceRoller;
use crate::errors::EngineResult;
use crate::game::broadcast::EventBroadcaster;
use crate::game::settlement::SettlementEngine;
use crate::game::types::{Round, RoundSettlement};
use crate::store::RoundStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct RoundScheduler {
    core: Arc<SchedulerCore>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct SchedulerCore {
    rounds: Arc<dyn RoundStore>,
    dice: Arc<dyn DiceRoller>,
    settlement: SettlementEngine,
    broadcaster: EventBroadcaster,
    clock: Arc<dyn Clock>,
    interval: Duration,
    running: AtomicBool,
    shutdown: Notify,
}

impl RoundScheduler {
    pub fn new(
        rounds: Arc<dyn RoundStore>,
        dice: Arc<dyn DiceRoller>,
        settlement: SettlementEngine,
        broadcaster: EventBroadcaster,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            core: Arc::new(SchedulerCore {
                rounds,
                dice,
                settlement,
                broadcaster,
                clock,
                interval,
                running: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Open the first round immediately and arm the fixed-interval timer.
    ///
    /// Failing to open round #1 is a startup error and propagates; once the
    /// loop is running, per-cycle failures are contained instead.
    pub async fn start(&self) -> EngineResult<()> {
        if self.core.running.swap(true, Ordering::SeqCst) {
            warn!("round scheduler already running");
            return Ok(());
        }

        let first = self.core.open_round().await?;
        info!(round_id = %first.id, interval_secs = self.core.interval.as_secs(), "round scheduler started");

        let core = self.core.clone();
        let task = tokio::spawn(async move { core.run().await });
        if let Ok(mut handle) = self.handle.lock() {
            *handle = Some(task);
        }
        Ok(())
    }

    /// Cancel future ticks. A cycle already in progress runs to completion,
    /// so a round is never left half-settled by shutdown.
    pub fn stop(&self) {
        if self.core.running.swap(false, Ordering::SeqCst) {
            self.core.shutdown.notify_one();
            info!("round scheduler stopping");
        }
    }

    /// Stop and wait for the scheduler task to drain.
    pub async fn shutdown(&self) {
        self.stop();
        let task = match self.handle.lock() {
            Ok(mut handle) => handle.take(),
            Err(_) => None,
        };
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("scheduler task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.core.running.load(Ordering::SeqCst)
    }
}

impl SchedulerCore {
    async fn run(self: Arc<Self>) {
        let start = tokio::time::Instant::now() + self.interval;
        let mut ticker = tokio::time::interval_at(start, self.interval);
        // A settlement that overruns the interval delays later ticks rather
        // than bursting to catch up; ticks drift, they never overlap.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.running.load(Ordering::SeqCst) {
                        break;
                    }
                    self.run_cycle().await;
                }
                _ = self.shutdown.notified() => break,
            }
        }
        info!("round scheduler stopped");
    }

    /// One tick: close the current round, settle it, publish the result,
    /// open the next round.
    async fn run_cycle(&self) {
        let open = match self.rounds.current_round().await {
            Ok(Some(round)) if round.is_open() => round,
            Ok(_) => {
                // The previous cycle closed its round but failed to open the
                // next one; recover by opening a fresh round now.
                warn!("no open round at tick, opening a fresh one");
                if let Err(e) = self.open_round().await {
                    error!("failed to open recovery round: {}", e);
                }
                return;
            }
            Err(e) => {
                error!("failed to load current round: {}", e);
                return;
            }
        };

        let outcome = self.dice.roll();
        let closed_at = self.clock.now();
        let closed = match self.rounds.close_round(open.id, outcome, closed_at).await {
            Ok(round) => round,
            Err(e) => {
                // The round stays open and the next tick tries again.
                error!(round_id = %open.id, "failed to close round: {}", e);
                return;
            }
        };
        debug!(
            round_id = %closed.id,
            die_a = outcome.die_a,
            die_b = outcome.die_b,
            roll_sum = outcome.roll_sum(),
            lucky_seven = outcome.is_lucky_seven(),
            "round closed"
        );

        let settlement = match self.settlement.settle(closed.id, outcome).await {
            Ok(settlement) => settlement,
            Err(e) => {
                // Contained: the outcome is still published (with empty
                // per-user maps) and the next round still opens. Affected
                // wagers stay pending.
                error!(round_id = %closed.id, "settlement failed: {}", e);
                RoundSettlement::empty(closed.id)
            }
        };

        self.broadcaster
            .publish_round_result(&closed, outcome, closed_at, settlement);

        if let Err(e) = self.open_round().await {
            error!("failed to open next round: {}", e);
        }
    }

    async fn open_round(&self) -> EngineResult<Round> {
        let round = Round::open(Uuid::new_v4(), self.clock.now());
        self.rounds.insert_round(round.clone()).await?;
        debug!(round_id = %round.id, "round opened");
        self.broadcaster.publish_round_opened(&round);
        Ok(round)
    }
}
