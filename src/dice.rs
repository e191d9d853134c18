//! Fair dice generation.
//!
//! A naive `byte % 6` skews toward low faces because 256 is not a multiple
//! of 6. Draws are instead rejection-sampled: bytes at or above 252 (6 × 42,
//! the largest multiple of 6 a byte can hold) are discarded and redrawn, so
//! every face is equally likely.

use crate::game::types::RollOutcome;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Bytes at or above this bound are redrawn.
const MAX_MULTIPLE_OF_SIX: u8 = 252;

/// Roll a single unbiased die in [1, 6].
pub fn unbiased_die<R: RngCore + ?Sized>(rng: &mut R) -> u8 {
    let mut buf = [0u8; 1];
    loop {
        rng.fill_bytes(&mut buf);
        if buf[0] < MAX_MULTIPLE_OF_SIX {
            return buf[0] % 6 + 1;
        }
    }
}

/// Roll both dice for a round. The draws are independent.
pub fn roll_dice<R: RngCore + ?Sized>(rng: &mut R) -> RollOutcome {
    RollOutcome {
        die_a: unbiased_die(rng),
        die_b: unbiased_die(rng),
    }
}

/// Source of round outcomes, injectable so tests can script rolls.
pub trait DiceRoller: Send + Sync {
    fn roll(&self) -> RollOutcome;
}

/// Production roller backed by the OS CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsDiceRoller;

impl DiceRoller for OsDiceRoller {
    fn roll(&self) -> RollOutcome {
        roll_dice(&mut OsRng)
    }
}

/// Scripted roller for tests: pops queued outcomes, then repeats a fallback.
#[derive(Debug)]
pub struct FixedDiceRoller {
    queued: Mutex<VecDeque<RollOutcome>>,
    fallback: RollOutcome,
}

impl FixedDiceRoller {
    pub fn new(fallback: RollOutcome) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback,
        }
    }

    pub fn push(&self, outcome: RollOutcome) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(outcome);
        }
    }
}

impl DiceRoller for FixedDiceRoller {
    fn roll(&self) -> RollOutcome {
        self.queued
            .lock()
            .ok()
            .and_then(|mut queued| queued.pop_front())
            .unwrap_or(self.fallback)
    }
}
