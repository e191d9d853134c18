//! Round lifecycle and wager settlement.

pub mod broadcast;
pub mod ledger;
pub mod scheduler;
pub mod service;
pub mod settlement;
pub mod types;
pub mod window;

pub use broadcast::{EventBroadcaster, GameEvent, RoundResult};
pub use ledger::{PlacementOutcome, WagerLedger};
pub use scheduler::RoundScheduler;
pub use service::GameService;
pub use settlement::{PayoutTable, SettlementEngine};
pub use window::BettingWindow;
