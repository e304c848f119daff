//! The toroidal game grid and live world state.
//!
//! [`CellGrid`] is the dense per-cell storage shared by the live grid and by
//! predicted snapshots; [`Grid`] layers the per-turn unit/hill/food sets,
//! the visibility mask, and the precomputed radius offsets on top of it.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::engine::offsets::disc_offsets;
use crate::engine::tile::{Direction, Offset, Tile, TileKind, TileRecord, NO_OWNER};

/// Fixed game parameters supplied once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameParams {
    /// Setup time budget in milliseconds (turn 0).
    pub load_time_ms: u64,
    /// Per-turn time budget in milliseconds.
    pub turn_time_ms: u64,
    /// Map height.
    pub rows: u16,
    /// Map width.
    pub cols: u16,
    /// Maximum number of turns in the game.
    pub turns: u32,
    /// Squared view radius of each unit.
    pub view_radius2: u32,
    /// Squared attack radius of each unit.
    pub attack_radius2: u32,
    /// Squared spawn radius of each hill.
    pub spawn_radius2: u32,
}

impl GameParams {
    /// Squared attack radius padded by two steps, used to catch units that
    /// could enter engagement range next turn.
    #[must_use]
    pub fn extended_attack_radius2(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let padded = (f64::from(self.attack_radius2).sqrt() + 2.0).powi(2) as u32;
        padded
    }
}

impl Default for GameParams {
    fn default() -> Self {
        // Values typical of the official game servers.
        Self {
            load_time_ms: 3000,
            turn_time_ms: 1000,
            rows: 40,
            cols: 40,
            turns: 500,
            view_radius2: 55,
            attack_radius2: 5,
            spawn_radius2: 1,
        }
    }
}

/// Dense per-cell storage with toroidal geometry.
///
/// Cells are stored row-major and always fully populated; the default cell is
/// open land. All coordinate arithmetic wraps, so out-of-range tiles cannot
/// exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    rows: u16,
    cols: u16,
    cells: Vec<TileRecord>,
}

impl CellGrid {
    /// Create a grid of the given dimensions, all land.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    #[must_use]
    pub fn new(rows: u16, cols: u16) -> Self {
        assert!(rows > 0 && cols > 0, "grid dimensions must be non-zero");
        let size = usize::from(rows) * usize::from(cols);
        Self {
            rows,
            cols,
            cells: vec![TileRecord::LAND; size],
        }
    }

    /// Map height.
    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    /// Map width.
    #[must_use]
    pub const fn cols(&self) -> u16 {
        self.cols
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells. Always false by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn index(&self, tile: Tile) -> usize {
        usize::from(tile.row) * usize::from(self.cols) + usize::from(tile.col)
    }

    /// The record stored at `tile`.
    #[must_use]
    pub fn record(&self, tile: Tile) -> TileRecord {
        self.cells[self.index(tile)]
    }

    /// The kind stored at `tile`.
    #[must_use]
    pub fn kind(&self, tile: Tile) -> TileKind {
        self.record(tile).kind
    }

    /// The owner stored at `tile`, [`NO_OWNER`] where not meaningful.
    #[must_use]
    pub fn owner(&self, tile: Tile) -> i8 {
        self.record(tile).owner
    }

    /// Overwrite the record at `tile`.
    pub fn set_record(&mut self, tile: Tile, record: TileRecord) {
        let idx = self.index(tile);
        self.cells[idx] = record;
    }

    /// Iterate over every tile of the grid in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + use<> {
        let cols = self.cols;
        let rows = self.rows;
        (0..rows).flat_map(move |row| (0..cols).map(move |col| Tile::new(row, col)))
    }

    /// The tile at `offset` from `tile`, wrapping toroidally.
    #[must_use]
    pub fn offset_tile(&self, tile: Tile, offset: Offset) -> Tile {
        let row = wrap(i32::from(tile.row) + i32::from(offset.dr), self.rows);
        let col = wrap(i32::from(tile.col) + i32::from(offset.dc), self.cols);
        Tile::new(row, col)
    }

    /// The neighbor of `tile` one step in `direction`, wrapping toroidally.
    #[must_use]
    pub fn step(&self, tile: Tile, direction: Direction) -> Tile {
        self.offset_tile(tile, direction.delta())
    }

    /// Squared toroidal distance between two tiles.
    #[must_use]
    pub fn distance2(&self, t1: Tile, t2: Tile) -> u32 {
        let dr = t1.row.abs_diff(t2.row).min(self.rows - t1.row.abs_diff(t2.row));
        let dc = t1.col.abs_diff(t2.col).min(self.cols - t1.col.abs_diff(t2.col));
        u32::from(dr) * u32::from(dr) + u32::from(dc) * u32::from(dc)
    }

    /// The one or two directions that reduce toroidal distance from `t1`
    /// toward `t2`.
    #[must_use]
    pub fn directions_between(&self, t1: Tile, t2: Tile) -> Vec<Direction> {
        let mut directions = Vec::with_capacity(2);
        if t1.row < t2.row {
            if t2.row - t1.row >= self.rows / 2 {
                directions.push(Direction::North);
            } else {
                directions.push(Direction::South);
            }
        } else if t1.row > t2.row {
            if t1.row - t2.row >= self.rows / 2 {
                directions.push(Direction::South);
            } else {
                directions.push(Direction::North);
            }
        }
        if t1.col < t2.col {
            if t2.col - t1.col >= self.cols / 2 {
                directions.push(Direction::West);
            } else {
                directions.push(Direction::East);
            }
        } else if t1.col > t2.col {
            if t1.col - t2.col >= self.cols / 2 {
                directions.push(Direction::East);
            } else {
                directions.push(Direction::West);
            }
        }
        directions
    }

    /// The single direction whose step takes `t1` to `t2`, if the tiles are
    /// toroidally adjacent.
    #[must_use]
    pub fn direction_to(&self, t1: Tile, t2: Tile) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&direction| self.step(t1, direction) == t2)
    }
}

fn wrap(value: i32, modulus: u16) -> u16 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let wrapped = value.rem_euclid(i32::from(modulus)) as u16;
    wrapped
}

/// Live world state for the current turn.
#[derive(Debug, Clone)]
pub struct Grid {
    params: GameParams,
    cells: CellGrid,
    visible: Vec<bool>,
    own_ants: BTreeSet<Tile>,
    enemy_ants: BTreeSet<Tile>,
    own_hills: BTreeSet<Tile>,
    enemy_hills: BTreeSet<Tile>,
    food: BTreeSet<Tile>,
    vision_offsets: Vec<Offset>,
    combat_offsets: Vec<Offset>,
    extended_combat_offsets: Vec<Offset>,
}

impl Grid {
    /// Create the world state for a game with the given parameters.
    ///
    /// The view/attack offset discs are computed here, once, and reused every
    /// turn.
    #[must_use]
    pub fn new(params: GameParams) -> Self {
        let cells = CellGrid::new(params.rows, params.cols);
        let visible = vec![false; cells.len()];
        Self {
            cells,
            visible,
            own_ants: BTreeSet::new(),
            enemy_ants: BTreeSet::new(),
            own_hills: BTreeSet::new(),
            enemy_hills: BTreeSet::new(),
            food: BTreeSet::new(),
            vision_offsets: disc_offsets(params.view_radius2),
            combat_offsets: disc_offsets(params.attack_radius2),
            extended_combat_offsets: disc_offsets(params.extended_attack_radius2()),
            params,
        }
    }

    /// The fixed game parameters.
    #[must_use]
    pub const fn params(&self) -> &GameParams {
        &self.params
    }

    /// The dense cell storage backing this grid.
    #[must_use]
    pub const fn cells(&self) -> &CellGrid {
        &self.cells
    }

    /// The kind at `tile`.
    #[must_use]
    pub fn kind_at(&self, tile: Tile) -> TileKind {
        self.cells.kind(tile)
    }

    /// The owner at `tile`.
    #[must_use]
    pub fn owner_at(&self, tile: Tile) -> i8 {
        self.cells.owner(tile)
    }

    /// The neighbor of `tile` one step in `direction`.
    #[must_use]
    pub fn neighbor(&self, tile: Tile, direction: Direction) -> Tile {
        self.cells.step(tile, direction)
    }

    /// The tile at `offset` from `tile`.
    #[must_use]
    pub fn offset_tile(&self, tile: Tile, offset: Offset) -> Tile {
        self.cells.offset_tile(tile, offset)
    }

    /// Squared toroidal distance between two tiles.
    #[must_use]
    pub fn distance2(&self, t1: Tile, t2: Tile) -> u32 {
        self.cells.distance2(t1, t2)
    }

    /// Record a new observation at `tile`.
    ///
    /// Updates both the cell record and the per-kind set the rest of the
    /// engine reads, keeping the two views consistent.
    pub fn update(&mut self, kind: TileKind, tile: Tile, owner: i8) {
        self.cells.set_record(tile, TileRecord::new(kind, owner));
        match kind {
            TileKind::Food => {
                self.food.insert(tile);
            }
            TileKind::OwnAnt => {
                self.own_ants.insert(tile);
            }
            TileKind::EnemyAnt => {
                self.enemy_ants.insert(tile);
            }
            _ => {}
        }
    }

    /// Record an unowned observation at `tile`.
    pub fn update_unowned(&mut self, kind: TileKind, tile: Tile) {
        self.update(kind, tile, NO_OWNER);
    }

    /// Record a hill observation.
    pub fn update_hill(&mut self, owner: i8, tile: Tile) {
        if owner > 0 {
            self.enemy_hills.insert(tile);
            self.cells
                .set_record(tile, TileRecord::new(TileKind::EnemyHill, owner));
        } else {
            self.own_hills.insert(tile);
            self.cells
                .set_record(tile, TileRecord::new(TileKind::OwnHill, owner));
        }
    }

    /// Forget our own units from the previous turn.
    pub fn clear_own_ants(&mut self) {
        for &ant in &self.own_ants {
            self.cells.set_record(ant, TileRecord::LAND);
        }
        self.own_ants.clear();
    }

    /// Forget enemy units from the previous turn.
    pub fn clear_enemy_ants(&mut self) {
        for &ant in &self.enemy_ants {
            self.cells.set_record(ant, TileRecord::LAND);
        }
        self.enemy_ants.clear();
    }

    /// Forget food from the previous turn.
    pub fn clear_food(&mut self) {
        for &food in &self.food {
            self.cells.set_record(food, TileRecord::LAND);
        }
        self.food.clear();
    }

    /// Forget hill sightings from the previous turn.
    ///
    /// Hill cells are reset to land; current sightings are re-reported by the
    /// observation stream each turn.
    pub fn clear_hills(&mut self) {
        for &hill in self.own_hills.iter().chain(self.enemy_hills.iter()) {
            if !self.cells.kind(hill).is_ant() {
                self.cells.set_record(hill, TileRecord::LAND);
            }
        }
        self.own_hills.clear();
        self.enemy_hills.clear();
    }

    /// Remove last turn's corpses from the map.
    pub fn clear_dead(&mut self) {
        for idx in 0..self.cells.cells.len() {
            if self.cells.cells[idx].kind == TileKind::Dead {
                self.cells.cells[idx] = TileRecord::LAND;
            }
        }
    }

    /// Reset the visibility mask.
    pub fn clear_vision(&mut self) {
        self.visible.fill(false);
    }

    /// Recompute the visibility mask as the union of view discs around every
    /// own unit.
    pub fn compute_vision(&mut self) {
        // Indices are computed up front so the borrow of the offset disc ends
        // before the mask is written.
        let mut seen = Vec::with_capacity(self.own_ants.len() * self.vision_offsets.len());
        for &ant in &self.own_ants {
            for &offset in &self.vision_offsets {
                let tile = self.cells.offset_tile(ant, offset);
                seen.push(self.cells.index(tile));
            }
        }
        for idx in seen {
            self.visible[idx] = true;
        }
    }

    /// Whether `tile` is visible this turn.
    #[must_use]
    pub fn is_visible(&self, tile: Tile) -> bool {
        self.visible[self.cells.index(tile)]
    }

    /// Our own unit locations.
    #[must_use]
    pub const fn own_ants(&self) -> &BTreeSet<Tile> {
        &self.own_ants
    }

    /// Enemy unit locations.
    #[must_use]
    pub const fn enemy_ants(&self) -> &BTreeSet<Tile> {
        &self.enemy_ants
    }

    /// Our own hill locations.
    #[must_use]
    pub const fn own_hills(&self) -> &BTreeSet<Tile> {
        &self.own_hills
    }

    /// Enemy hill locations seen this turn.
    #[must_use]
    pub const fn enemy_hills(&self) -> &BTreeSet<Tile> {
        &self.enemy_hills
    }

    /// Food locations seen this turn.
    #[must_use]
    pub const fn food(&self) -> &BTreeSet<Tile> {
        &self.food
    }

    /// The attack-radius offset disc.
    #[must_use]
    pub fn combat_offsets(&self) -> &[Offset] {
        &self.combat_offsets
    }

    /// The padded attack-radius offset disc.
    #[must_use]
    pub fn extended_combat_offsets(&self) -> &[Offset] {
        &self.extended_combat_offsets
    }

    /// Tiles on the diagonal corners of every own hill, where defenders
    /// stand without blocking spawns.
    #[must_use]
    pub fn defense_points(&self) -> Vec<Tile> {
        const CORNERS: [Offset; 4] = [
            Offset::new(1, 1),
            Offset::new(-1, -1),
            Offset::new(1, -1),
            Offset::new(-1, 1),
        ];
        let mut points = Vec::with_capacity(self.own_hills.len() * CORNERS.len());
        for &hill in &self.own_hills {
            for corner in CORNERS {
                points.push(self.cells.offset_tile(hill, corner));
            }
        }
        points
    }
}

/// Wall-clock budget for the current turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnClock {
    budget: Duration,
    started: Instant,
}

impl TurnClock {
    /// Start the clock for a turn with the given budget.
    #[must_use]
    pub fn start(budget_ms: u64) -> Self {
        Self {
            budget: Duration::from_millis(budget_ms),
            started: Instant::now(),
        }
    }

    /// Milliseconds left before the turn times out; negative once the budget
    /// is blown.
    #[must_use]
    pub fn remaining_ms(&self) -> i64 {
        let elapsed = self.started.elapsed();
        #[allow(clippy::cast_possible_truncation)]
        let remaining = self.budget.as_millis() as i64 - elapsed.as_millis() as i64;
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> Grid {
        Grid::new(GameParams {
            rows: 10,
            cols: 12,
            ..GameParams::default()
        })
    }

    #[test]
    fn test_step_wraps_both_edges() {
        let grid = small_grid();
        assert_eq!(
            grid.neighbor(Tile::new(0, 0), Direction::North),
            Tile::new(9, 0)
        );
        assert_eq!(
            grid.neighbor(Tile::new(9, 11), Direction::South),
            Tile::new(0, 11)
        );
        assert_eq!(
            grid.neighbor(Tile::new(0, 0), Direction::West),
            Tile::new(0, 11)
        );
        assert_eq!(
            grid.neighbor(Tile::new(0, 11), Direction::East),
            Tile::new(0, 0)
        );
    }

    #[test]
    fn test_distance2_wraps() {
        let grid = small_grid();
        // One step across the row seam.
        assert_eq!(grid.distance2(Tile::new(0, 3), Tile::new(9, 3)), 1);
        // Symmetric.
        assert_eq!(
            grid.distance2(Tile::new(2, 3), Tile::new(7, 9)),
            grid.distance2(Tile::new(7, 9), Tile::new(2, 3))
        );
    }

    #[test]
    fn test_directions_between_prefers_wrap() {
        let grid = small_grid();
        // Going from row 0 to row 9 is one step north across the seam.
        let dirs = grid.cells().directions_between(Tile::new(0, 0), Tile::new(9, 0));
        assert_eq!(dirs, vec![Direction::North]);
        let dirs = grid.cells().directions_between(Tile::new(0, 0), Tile::new(1, 1));
        assert_eq!(dirs, vec![Direction::South, Direction::East]);
    }

    #[test]
    fn test_direction_to_adjacent_only() {
        let grid = small_grid();
        let cells = grid.cells();
        assert_eq!(
            cells.direction_to(Tile::new(5, 5), Tile::new(5, 6)),
            Some(Direction::East)
        );
        assert_eq!(
            cells.direction_to(Tile::new(0, 0), Tile::new(9, 0)),
            Some(Direction::North)
        );
        assert_eq!(cells.direction_to(Tile::new(0, 0), Tile::new(5, 5)), None);
    }

    #[test]
    fn test_update_keeps_sets_consistent() {
        let mut grid = small_grid();
        grid.update(TileKind::OwnAnt, Tile::new(2, 2), 0);
        grid.update(TileKind::EnemyAnt, Tile::new(4, 4), 1);
        grid.update_unowned(TileKind::Food, Tile::new(6, 6));
        assert!(grid.own_ants().contains(&Tile::new(2, 2)));
        assert_eq!(grid.kind_at(Tile::new(2, 2)), TileKind::OwnAnt);
        assert_eq!(grid.owner_at(Tile::new(4, 4)), 1);
        assert_eq!(grid.kind_at(Tile::new(6, 6)), TileKind::Food);

        grid.clear_own_ants();
        grid.clear_enemy_ants();
        grid.clear_food();
        assert!(grid.own_ants().is_empty());
        assert_eq!(grid.kind_at(Tile::new(2, 2)), TileKind::Land);
        assert_eq!(grid.owner_at(Tile::new(4, 4)), NO_OWNER);
    }

    #[test]
    fn test_vision_covers_disc() {
        let mut grid = small_grid();
        grid.update(TileKind::OwnAnt, Tile::new(5, 5), 0);
        grid.clear_vision();
        grid.compute_vision();
        assert!(grid.is_visible(Tile::new(5, 5)));
        assert!(grid.is_visible(Tile::new(5, 6)));
        // view_radius2 = 55 covers everything within 7 steps straight-line
        // on this small map, so pick the farthest possible tile instead.
        let far = Tile::new(0, 11);
        let within = grid.distance2(Tile::new(5, 5), far) <= grid.params().view_radius2;
        assert_eq!(grid.is_visible(far), within);
    }

    #[test]
    fn test_defense_points_are_hill_corners() {
        let mut grid = small_grid();
        grid.update_hill(0, Tile::new(3, 3));
        let points = grid.defense_points();
        assert_eq!(points.len(), 4);
        assert!(points.contains(&Tile::new(4, 4)));
        assert!(points.contains(&Tile::new(2, 2)));
        assert!(points.contains(&Tile::new(4, 2)));
        assert!(points.contains(&Tile::new(2, 4)));
    }

    #[test]
    fn test_precomputed_discs_match_their_radii() {
        // The discs handed to the combat index and area scoring come from
        // here, built once at startup, never recomputed per call.
        let grid = small_grid();
        assert_eq!(grid.combat_offsets(), disc_offsets(5).as_slice());
        assert_eq!(
            grid.extended_combat_offsets(),
            disc_offsets(17).as_slice()
        );
    }

    #[test]
    fn test_extended_attack_radius() {
        let params = GameParams {
            attack_radius2: 5,
            ..GameParams::default()
        };
        // (sqrt(5) + 2)^2 = 17.94 -> 17 truncated.
        assert_eq!(params.extended_attack_radius2(), 17);
    }
}
