// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Formic: a deterministic decision core for Ants-style grid bots.
//!
//! Each turn the engine absorbs the observation stream, computes a family of
//! weighted distance fields over the toroidal map, simulates local combat on
//! real and predicted snapshots, and commits a collision-free set of
//! single-step orders, all inside a strict wall-clock budget.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │       Protocol driver (stdin)       │
//! ├─────────────────────────────────────┤
//! │   Policy pipeline (food/defense/    │
//! │      explore/raze/analysis)         │
//! ├─────────────────────────────────────┤
//! │  Engine: grid · fields · combat ·   │
//! │     arbitration · exploration       │
//! └─────────────────────────────────────┘
//! ```

pub mod bot;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod trace;

pub use error::{ProtocolError, ProtocolResult};

// Re-export key engine types at crate root for convenience
pub use bot::{Bot, BotConfig};
pub use engine::{
    DistanceField, Direction, GameParams, Grid, NearbyEnemies, OrderBook, Tile, TileKind,
    TileRecord, TurnClock,
};
