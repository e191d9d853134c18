//! HTTP/WebSocket surface.
//!
//! Thin transport layer over [`crate::game::service::GameService`]: bet
//! placement, round reads, the win-streak leaderboard, account endpoints and
//! a WebSocket relay of round events.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod websocket;

pub use server::ApiServer;
