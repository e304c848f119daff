//! Move-order arbitration and anti-oscillation.
//!
//! The order book enforces the two per-turn invariants: no unit commits more
//! than one order (unique sources) and no two orders target the same cell
//! (unique destinations). Conflicts are ordinary, frequent outcomes reported
//! as `false`, never errors.

use std::collections::{HashMap, HashSet};

use crate::engine::field::DistanceField;
use crate::engine::grid::Grid;
use crate::engine::tile::{Direction, Tile};

/// Per-turn order book plus the cross-turn move history.
///
/// The history maps the tile a unit will occupy next turn to the direction it
/// arrived from (the opposite of its committed move), so the next turn's
/// direction selection can recognize and penalize walking straight back.
/// Stale history entries are never collected; the map stays small in
/// practice because units keep rewriting the cells they pass through.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: HashMap<Tile, Tile>,
    moved: HashSet<Tile>,
    history: HashMap<Tile, Direction>,
}

impl OrderBook {
    /// Create an empty order book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-turn state. The move history persists.
    pub fn reset(&mut self) {
        self.orders.clear();
        self.moved.clear();
    }

    /// Whether `unit` already committed an order this turn.
    #[must_use]
    pub fn has_moved(&self, unit: Tile) -> bool {
        self.moved.contains(&unit)
    }

    /// The direction `unit` arrived from last turn, if recorded.
    #[must_use]
    pub fn came_from(&self, unit: Tile) -> Option<Direction> {
        self.history.get(&unit).copied()
    }

    /// The committed orders as a destination → source map, the shape the
    /// predicted-map constructor consumes.
    #[must_use]
    pub const fn moves(&self) -> &HashMap<Tile, Tile> {
        &self.orders
    }

    /// The committed orders as (source, destination) pairs.
    #[must_use]
    pub fn committed_orders(&self) -> Vec<(Tile, Tile)> {
        self.orders
            .iter()
            .map(|(&destination, &source)| (source, destination))
            .collect()
    }

    /// The source that committed an order targeting `destination`, if any.
    #[must_use]
    pub fn source_for(&self, destination: Tile) -> Option<Tile> {
        self.orders.get(&destination).copied()
    }

    /// Try to commit a single-step move for `unit` in `direction`.
    ///
    /// Fails when the unit already moved this turn, when the destination is
    /// occupied or impassable, or when another order already claimed the
    /// destination. On success the move history records the opposite
    /// direction at the destination tile.
    pub fn propose_move(&mut self, grid: &Grid, unit: Tile, direction: Direction) -> bool {
        if self.moved.contains(&unit) {
            return false;
        }
        let destination = grid.neighbor(unit, direction);
        if !grid.kind_at(destination).is_unoccupied() || self.orders.contains_key(&destination) {
            return false;
        }
        self.orders.insert(destination, unit);
        self.moved.insert(unit);
        self.history.insert(destination, direction.opposite());
        true
    }

    /// Retract the order targeting `destination`, restoring both the
    /// unique-source and unique-destination slots.
    ///
    /// Returns the freed source, or `None` if no order claimed the cell.
    pub fn retract(&mut self, destination: Tile) -> Option<Tile> {
        let source = self.orders.remove(&destination)?;
        self.moved.remove(&source);
        Some(source)
    }

    /// Pick the direction of steepest descent on `field` for `unit`.
    ///
    /// Directions whose target reads 0 (unreached) or is occupied are
    /// skipped. The direction the unit arrived from is skipped too, unless
    /// it turns out to be the only viable one, which keeps units from being
    /// pinned in dead ends forever. Ties go to the first direction examined.
    /// In strict mode the unit refuses to move at all when its standing cost
    /// already beats every candidate.
    ///
    /// # Panics
    ///
    /// Panics if `field` dimensions differ from the grid's.
    #[must_use]
    pub fn select_direction(
        &self,
        grid: &Grid,
        field: &DistanceField,
        unit: Tile,
        strict: bool,
    ) -> Option<Direction> {
        assert!(
            field.rows() == grid.params().rows && field.cols() == grid.params().cols,
            "field dimensions {}x{} do not match grid {}x{}",
            field.rows(),
            field.cols(),
            grid.params().rows,
            grid.params().cols
        );

        let came_from = self.came_from(unit);
        let mut selected: Option<(Direction, i32)> = None;
        let mut history_skipped = false;

        for direction in Direction::ALL {
            let neighbor = grid.neighbor(unit, direction);
            let kind = grid.kind_at(neighbor);
            let cost = field.get(neighbor);

            // 0 means the field never reached this cell.
            if cost == 0 {
                continue;
            }
            if !kind.is_unoccupied() || !kind.is_passable() {
                continue;
            }
            if came_from == Some(direction) {
                history_skipped = true;
                continue;
            }
            match selected {
                Some((_, lowest)) if cost >= lowest => {}
                _ => selected = Some((direction, cost)),
            }
        }

        let standing = field.get(unit);
        if strict
            && standing != 0
            && let Some((_, lowest)) = selected
            && standing < lowest
        {
            return None;
        }

        // Walking back is allowed when it is the only way out.
        if selected.is_none() && history_skipped {
            return came_from;
        }
        selected.map(|(direction, _)| direction)
    }

    /// Select a direction on `field` and commit the resulting move.
    ///
    /// Returns `false` when no viable direction exists or arbitration
    /// rejects the step.
    pub fn move_along_field(
        &mut self,
        grid: &Grid,
        field: &DistanceField,
        unit: Tile,
        strict: bool,
    ) -> bool {
        match self.select_direction(grid, field, unit, strict) {
            Some(direction) => self.propose_move(grid, unit, direction),
            None => false,
        }
    }
}
