//! Decision core for the bot.
//!
//! Everything the policy layer needs each turn:
//! - Toroidal grid model and per-cell records
//! - Cached disc/ring offsets for the fixed game radii
//! - Weighted multi-source distance fields and their compositor
//! - Nearby-enemy index, combat simulation, predicted maps
//! - Order arbitration with anti-oscillation
//! - Persistent exploration memory

mod combat;
mod field;
mod grid;
mod memory;
mod offsets;
mod orders;
mod tile;

pub use combat::{NearbyEnemies, area_score, predict, survives};
pub use field::{DistanceField, build_combat_field, build_field, composite, nearest_of_kind};
pub use grid::{CellGrid, GameParams, Grid, TurnClock};
pub use memory::ExplorationMemory;
pub use offsets::{disc_offsets, ring_offsets};
pub use orders::OrderBook;
pub use tile::{Direction, NO_OWNER, Offset, SELF_OWNER, Tile, TileKind, TileRecord};
