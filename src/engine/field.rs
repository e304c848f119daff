//! Weighted multi-source distance fields and their compositor.
//!
//! The relaxation here is deliberately not Dijkstra. The frontier expands in
//! breadth-first discovery order and each cell's overlay weight is added once,
//! at the moment the cell is settled. A cell reachable at the same hop count
//! through two different neighbors keeps whichever settled value is lower,
//! but no full path-sum minimization takes place. This matches the observed
//! behavior the downstream heuristics were tuned against; swapping in a true
//! label-correcting solve would change move selection.

use std::collections::VecDeque;

use crate::engine::grid::CellGrid;
use crate::engine::tile::{Direction, Tile, TileKind};

/// Cost subtracted from a settled cell holding an own unit during combat
/// field construction, pulling approaching units toward each other.
const CLUSTER_BONUS: i32 = 2;

/// A dense per-cell cost grid.
///
/// Zero means "never reached"; sources are seeded at 1 so reached and
/// unreached cells stay distinguishable. The same type doubles as the
/// additive weight overlay fed back into [`build_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceField {
    rows: u16,
    cols: u16,
    cost: Vec<i32>,
}

impl DistanceField {
    /// Create an all-zero field of the given dimensions.
    #[must_use]
    pub fn zeroed(rows: u16, cols: u16) -> Self {
        Self {
            rows,
            cols,
            cost: vec![0; usize::from(rows) * usize::from(cols)],
        }
    }

    /// Field height.
    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    /// Field width.
    #[must_use]
    pub const fn cols(&self) -> u16 {
        self.cols
    }

    fn index(&self, tile: Tile) -> usize {
        usize::from(tile.row) * usize::from(self.cols) + usize::from(tile.col)
    }

    /// The cost at `tile`; 0 means the relaxation never reached it.
    #[must_use]
    pub fn get(&self, tile: Tile) -> i32 {
        self.cost[self.index(tile)]
    }

    /// Overwrite the cost at `tile`.
    pub fn set(&mut self, tile: Tile, value: i32) {
        let idx = self.index(tile);
        self.cost[idx] = value;
    }

    /// Whether every cost in the field is zero.
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.cost.iter().all(|&c| c == 0)
    }

    fn assert_matches(&self, grid: &CellGrid) {
        assert!(
            self.rows == grid.rows() && self.cols == grid.cols(),
            "field dimensions {}x{} do not match grid {}x{}",
            self.rows,
            self.cols,
            grid.rows(),
            grid.cols()
        );
    }
}

/// Build a distance field from `sources` over `grid`, with an optional
/// additive weight overlay.
///
/// Every source is seeded at cost 1 (0 is reserved for "unreached"); an empty
/// source set therefore yields an all-zero field. Expansion never routes
/// through impassable cells, and a settled cell is only revisited when a
/// strictly lower pre-weight cost arrives.
///
/// # Panics
///
/// Panics if `weights` is present with dimensions differing from `grid`.
#[must_use]
pub fn build_field(grid: &CellGrid, sources: &[Tile], weights: Option<&DistanceField>) -> DistanceField {
    relax(grid, sources, weights, false)
}

/// [`build_field`] variant that additionally discounts cells occupied by own
/// units, producing mild clustering pressure. Used only for the
/// combat-pressure field.
///
/// # Panics
///
/// Panics if `weights` is present with dimensions differing from `grid`.
#[must_use]
pub fn build_combat_field(
    grid: &CellGrid,
    sources: &[Tile],
    weights: Option<&DistanceField>,
) -> DistanceField {
    relax(grid, sources, weights, true)
}

fn relax(
    grid: &CellGrid,
    sources: &[Tile],
    weights: Option<&DistanceField>,
    clustering: bool,
) -> DistanceField {
    if let Some(weights) = weights {
        weights.assert_matches(grid);
    }

    let mut field = DistanceField::zeroed(grid.rows(), grid.cols());
    let mut frontier: VecDeque<Tile> = VecDeque::with_capacity(sources.len());

    for &source in sources {
        field.set(source, 1);
        frontier.push_back(source);
    }

    while let Some(tile) = frontier.pop_front() {
        let settled = field.get(tile);
        for direction in Direction::ALL {
            let neighbor = grid.step(tile, direction);
            let current = field.get(neighbor);
            let proposed = settled + 1;

            // Resettle only on a strictly lower pre-weight cost.
            if current != 0 && current <= proposed {
                continue;
            }
            if !grid.kind(neighbor).is_passable() {
                continue;
            }

            let weight = weights.map_or(0, |w| w.get(neighbor));
            let mut cost = proposed + weight;
            if clustering && grid.kind(neighbor) == TileKind::OwnAnt {
                cost -= CLUSTER_BONUS;
            }
            field.set(neighbor, cost);

            if current == 0 {
                frontier.push_back(neighbor);
            }
        }
    }

    field
}

/// Linearly combine aligned fields into one composite field.
///
/// Each cell of the result is `sum(fields[i][cell] * multipliers[i])`.
/// Unreached cells contribute 0, which deliberately reads as "free" rather
/// than "unknown"; downstream heuristics rely on that edge.
///
/// # Panics
///
/// Panics if `fields` and `multipliers` differ in length, or if any two
/// fields disagree on dimensions.
#[must_use]
pub fn composite(fields: &[&DistanceField], multipliers: &[i32]) -> DistanceField {
    assert_eq!(
        fields.len(),
        multipliers.len(),
        "one multiplier per field required"
    );
    let Some(first) = fields.first() else {
        return DistanceField::zeroed(0, 0);
    };
    let mut result = DistanceField::zeroed(first.rows, first.cols);
    for (field, &multiplier) in fields.iter().zip(multipliers) {
        assert!(
            field.rows == first.rows && field.cols == first.cols,
            "composite inputs must share dimensions"
        );
        for (out, &cost) in result.cost.iter_mut().zip(&field.cost) {
            *out += cost * multiplier;
        }
    }
    result
}

/// Breadth-first probe for the nearest cell of `kind`, excluding `start`
/// itself.
///
/// Returns `None` when no such cell is reachable through passable terrain.
#[must_use]
pub fn nearest_of_kind(grid: &CellGrid, start: Tile, kind: TileKind) -> Option<Tile> {
    let mut checked = vec![false; grid.len()];
    let mut frontier = VecDeque::new();
    frontier.push_back(start);
    checked[grid.index(start)] = true;

    while let Some(tile) = frontier.pop_front() {
        if tile != start && grid.kind(tile) == kind {
            return Some(tile);
        }
        for direction in Direction::ALL {
            let neighbor = grid.step(tile, direction);
            let idx = grid.index(neighbor);
            if checked[idx] {
                continue;
            }
            if !grid.kind(neighbor).is_passable() {
                continue;
            }
            checked[idx] = true;
            frontier.push_back(neighbor);
        }
    }
    None
}
