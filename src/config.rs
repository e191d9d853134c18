//! Configuration with validation and defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub server: ServerConfig,
}

/// Round cadence, betting window and payout knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seconds between rounds.
    pub round_interval_secs: u64,
    /// Seconds after round creation during which wagers are accepted.
    pub betting_window_secs: i64,
    /// Winnings multiplier for a lucky-seven wager.
    pub lucky_seven_multiplier: u64,
    /// Winnings multiplier for a safe-side wager.
    pub standard_multiplier: u64,
    /// Tokens granted to a fresh account.
    pub signup_bonus: u64,
    /// Default page size for the recent-rolls read path.
    pub recent_rounds_limit: usize,
    /// Default size of the win-streak leaderboard.
    pub leaderboard_size: usize,
    /// Buffer capacity of the event broadcast channel.
    pub event_buffer: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_interval_secs: 15,
            betting_window_secs: 10,
            lucky_seven_multiplier: 7,
            standard_multiplier: 1,
            signup_bonus: 100,
            recent_rounds_limit: 5,
            leaderboard_size: 10,
            event_buffer: 256,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load from a TOML file and validate. Missing keys fall back to the
    /// defaults above.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;
        if game.round_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "round_interval_secs must be positive".to_string(),
            ));
        }
        if game.betting_window_secs <= 0 {
            return Err(ConfigError::Invalid(
                "betting_window_secs must be positive".to_string(),
            ));
        }
        if game.betting_window_secs as u64 >= game.round_interval_secs {
            return Err(ConfigError::Invalid(
                "betting_window_secs must be shorter than round_interval_secs".to_string(),
            ));
        }
        if game.lucky_seven_multiplier <= game.standard_multiplier {
            // Asymmetric odds mirror the asymmetric probability of a seven.
            return Err(ConfigError::Invalid(
                "lucky_seven_multiplier must exceed standard_multiplier".to_string(),
            ));
        }
        if game.event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "event_buffer must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
