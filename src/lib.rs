//! # Lucky Seven
//!
//! Round-based dice wagering engine. Every `round_interval_secs` the
//! scheduler rolls two fair dice, settles all wagers of the closing round
//! (seven pays 7x, the safe side pays even money), broadcasts the result and
//! opens the next round. Wagers are accepted during a short window at the
//! start of each round; stakes are debited at placement and winners are
//! credited at settlement through a single atomic ledger primitive.
//!
//! ```text
//! src/
//!   clock.rs   - injected time source (SystemClock / ManualClock)
//!   config.rs  - TOML-backed configuration with validation
//!   dice.rs    - rejection-sampled fair dice
//!   errors.rs  - rejection reasons, store and engine errors
//!   game/      - ledger, settlement, scheduler, broadcast, service facade
//!   store/     - RoundStore/WagerStore/AccountStore traits + in-memory impl
//!   api/       - axum HTTP/WebSocket surface
//! ```

pub mod api;
pub mod clock;
pub mod config;
pub mod dice;
pub mod errors;
pub mod game;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, GameConfig, ServerConfig};
pub use dice::{DiceRoller, FixedDiceRoller, OsDiceRoller};
pub use errors::{EngineError, EngineResult, RejectReason, StoreError};
pub use game::broadcast::{EventBroadcaster, GameEvent};
pub use game::ledger::PlacementOutcome;
pub use game::scheduler::RoundScheduler;
pub use game::service::GameService;
pub use game::settlement::{PayoutTable, SettlementEngine};
pub use game::types::{Account, RollOutcome, Round, RoundState, Wager, WagerStatus};
pub use store::MemoryStore;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
