//! Persistent exploration memory.
//!
//! The only state that survives across turns besides the move history: a
//! per-cell "last seen" counter and the shrinking set of cells that have
//! never been visible at all. The counter re-arms to the cap while a cell is
//! visible and decays by one per turn while it is not, so long-unseen cells
//! gradually pull the explore field toward themselves. Mutated in place every
//! turn, never rebuilt.

use std::collections::HashSet;

use crate::engine::field::DistanceField;
use crate::engine::grid::Grid;
use crate::engine::tile::Tile;

/// Cross-turn record of what the colony has seen of the map.
#[derive(Debug, Clone)]
pub struct ExplorationMemory {
    rows: u16,
    cols: u16,
    cap: i32,
    last_seen: Vec<i32>,
    never_seen: HashSet<Tile>,
}

impl ExplorationMemory {
    /// Create memory for a fresh map; every cell starts unexplored with its
    /// counter at `cap`.
    #[must_use]
    pub fn new(rows: u16, cols: u16, cap: i32) -> Self {
        let mut never_seen = HashSet::new();
        for row in 0..rows {
            for col in 0..cols {
                never_seen.insert(Tile::new(row, col));
            }
        }
        Self {
            rows,
            cols,
            cap,
            last_seen: vec![cap; usize::from(rows) * usize::from(cols)],
            never_seen,
        }
    }

    fn index(&self, tile: Tile) -> usize {
        usize::from(tile.row) * usize::from(self.cols) + usize::from(tile.col)
    }

    /// The decaying counter for `tile`.
    #[must_use]
    pub fn last_seen(&self, tile: Tile) -> i32 {
        self.last_seen[self.index(tile)]
    }

    /// Cells that have never been visible in the whole game.
    #[must_use]
    pub const fn never_seen(&self) -> &HashSet<Tile> {
        &self.never_seen
    }

    /// Fold this turn's visibility mask into the memory.
    ///
    /// Returns every currently invisible tile in row-major order; these are
    /// the sources of the explore field.
    pub fn observe(&mut self, grid: &Grid) -> Vec<Tile> {
        let mut unseen = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let tile = Tile::new(row, col);
                let idx = self.index(tile);
                if grid.is_visible(tile) {
                    self.last_seen[idx] = self.cap;
                    self.never_seen.remove(&tile);
                } else {
                    unseen.push(tile);
                    if self.last_seen[idx] > 0 {
                        self.last_seen[idx] -= 1;
                    }
                }
            }
        }
        unseen
    }

    /// The additive weight overlay for the explore field.
    ///
    /// Unseen cells weigh their counter value, so recently seen cells stay
    /// expensive for a while; never-seen cells are forced to 0 to make truly
    /// unknown territory maximally attractive.
    #[must_use]
    pub fn explore_weights(&self, unseen: &[Tile]) -> DistanceField {
        let mut weights = DistanceField::zeroed(self.rows, self.cols);
        for &tile in unseen {
            weights.set(tile, self.last_seen(tile));
        }
        for &tile in &self.never_seen {
            weights.set(tile, 0);
        }
        weights
    }
}
