//! Local combat outcome simulation.
//!
//! The survival rule is a concentration-of-force heuristic, not an exact
//! replay of the server's combat resolution: a unit's "weakness" is the
//! number of opposing units inside engagement range, and a unit dies when
//! any opponent touching it is at least as free of other threats as it is.
//! Scores are always computed against an explicit snapshot + index pair so
//! the same routines can judge both the present map and a predicted one.

use std::collections::HashMap;

use crate::engine::grid::CellGrid;
use crate::engine::tile::{Offset, Tile, TileKind, TileRecord};

/// Penalty multiplier applied to own losses when scoring an area.
const OWN_LOSS_WEIGHT: i32 = 2;

/// For every unit on the snapshot, the opposing units within engagement
/// range. Rebuilt from scratch whenever the snapshot changes.
#[derive(Debug, Clone, Default)]
pub struct NearbyEnemies {
    by_tile: HashMap<Tile, Vec<Tile>>,
}

impl NearbyEnemies {
    /// Build the index over every unit on `grid`.
    ///
    /// `offsets` is the engagement disc, precomputed once per radius (the
    /// grid carries it for the attack radius).
    #[must_use]
    pub fn build(grid: &CellGrid, offsets: &[Offset]) -> Self {
        let mut by_tile = HashMap::new();
        for tile in grid.tiles() {
            if grid.kind(tile).is_ant() {
                by_tile.insert(tile, enemies_near(grid, tile, offsets));
            }
        }
        Self { by_tile }
    }

    /// Opposing units within engagement range of the unit at `tile`.
    #[must_use]
    pub fn get(&self, tile: Tile) -> &[Tile] {
        self.by_tile.get(&tile).map_or(&[], Vec::as_slice)
    }

    /// The unit's weakness: how many opponents can touch it.
    #[must_use]
    pub fn weakness(&self, tile: Tile) -> usize {
        self.get(tile).len()
    }
}

fn enemies_near(grid: &CellGrid, origin: Tile, offsets: &[Offset]) -> Vec<Tile> {
    let owner = grid.owner(origin);
    let mut enemies = Vec::new();
    for &offset in offsets {
        let tile = grid.offset_tile(origin, offset);
        let record = grid.record(tile);
        if record.kind.is_ant() && record.owner != owner {
            enemies.push(tile);
        }
    }
    enemies
}

/// Whether the unit at `tile` survives the engagement described by `index`.
///
/// A unit nobody can touch survives unconditionally. Otherwise it survives
/// only when it is strictly less threatened than every opponent touching it.
#[must_use]
pub fn survives(tile: Tile, index: &NearbyEnemies) -> bool {
    let nearby = index.get(tile);
    let weakness = nearby.len();
    if weakness == 0 {
        return true;
    }
    let min_enemy_weakness = nearby
        .iter()
        .map(|&enemy| index.weakness(enemy))
        .min()
        .unwrap_or(usize::MAX);
    weakness < min_enemy_weakness
}

/// Score the engagement inside the `offsets` disc around `origin`: +1 per
/// enemy death, −2 per own death.
///
/// Negative scores mark losing fights the policy layer should back out of.
#[must_use]
pub fn area_score(
    origin: Tile,
    grid: &CellGrid,
    index: &NearbyEnemies,
    offsets: &[Offset],
) -> i32 {
    let mut own_deaths = 0;
    let mut enemy_deaths = 0;
    for &offset in offsets {
        let tile = grid.offset_tile(origin, offset);
        match grid.kind(tile) {
            TileKind::OwnAnt => {
                if !survives(tile, index) {
                    own_deaths += 1;
                }
            }
            TileKind::EnemyAnt => {
                if !survives(tile, index) {
                    enemy_deaths += 1;
                }
            }
            _ => {}
        }
    }
    enemy_deaths - own_deaths * OWN_LOSS_WEIGHT
}

/// Build the snapshot that results from applying `moves` (destination →
/// source) to `grid`.
///
/// All sources are vacated before any record is placed, so chained moves
/// (one order's destination being another's source) resolve the same way
/// regardless of map iteration order.
#[must_use]
pub fn predict(grid: &CellGrid, moves: &HashMap<Tile, Tile>) -> CellGrid {
    let mut predicted = grid.clone();
    let mut placed: Vec<(Tile, TileRecord)> = Vec::with_capacity(moves.len());
    for (&destination, &source) in moves {
        placed.push((destination, predicted.record(source)));
        predicted.set_record(source, TileRecord::LAND);
    }
    for (destination, record) in placed {
        predicted.set_record(destination, record);
    }
    predicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::offsets::disc_offsets;
    use crate::engine::tile::{SELF_OWNER, TileKind};

    fn attack_disc() -> Vec<Offset> {
        disc_offsets(5)
    }

    fn grid_with(units: &[(Tile, TileKind, i8)]) -> CellGrid {
        let mut grid = CellGrid::new(20, 20);
        for &(tile, kind, owner) in units {
            grid.set_record(tile, TileRecord::new(kind, owner));
        }
        grid
    }

    #[test]
    fn test_untouched_unit_survives() {
        let own = Tile::new(5, 5);
        let grid = grid_with(&[
            (own, TileKind::OwnAnt, SELF_OWNER),
            (Tile::new(15, 15), TileKind::EnemyAnt, 1),
        ]);
        let index = NearbyEnemies::build(&grid, &attack_disc());
        assert_eq!(index.weakness(own), 0);
        assert!(survives(own, &index));
    }

    #[test]
    fn test_outnumbered_unit_dies() {
        // A faces B; B also faces C, so w(A)=1 < w(B)=2: A survives, B dies.
        let a = Tile::new(5, 5);
        let b = Tile::new(5, 7);
        let c = Tile::new(5, 9);
        let grid = grid_with(&[
            (a, TileKind::OwnAnt, SELF_OWNER),
            (b, TileKind::EnemyAnt, 1),
            (c, TileKind::OwnAnt, SELF_OWNER),
        ]);
        let index = NearbyEnemies::build(&grid, &attack_disc());
        assert_eq!(index.weakness(a), 1);
        assert_eq!(index.weakness(b), 2);
        assert!(survives(a, &index));
        assert!(survives(c, &index));
        assert!(!survives(b, &index));
    }

    #[test]
    fn test_equal_weakness_is_mutual_death() {
        let a = Tile::new(5, 5);
        let b = Tile::new(5, 7);
        let grid = grid_with(&[
            (a, TileKind::OwnAnt, SELF_OWNER),
            (b, TileKind::EnemyAnt, 1),
        ]);
        let index = NearbyEnemies::build(&grid, &attack_disc());
        assert_eq!(index.weakness(a), 1);
        assert_eq!(index.weakness(b), 1);
        assert!(!survives(a, &index));
        assert!(!survives(b, &index));
    }

    #[test]
    fn test_index_ignores_own_side() {
        let a = Tile::new(5, 5);
        let ally = Tile::new(5, 6);
        let grid = grid_with(&[
            (a, TileKind::OwnAnt, SELF_OWNER),
            (ally, TileKind::OwnAnt, SELF_OWNER),
        ]);
        let index = NearbyEnemies::build(&grid, &attack_disc());
        assert_eq!(index.weakness(a), 0);
        assert_eq!(index.weakness(ally), 0);
    }

    #[test]
    fn test_area_score_weighs_own_losses_double() {
        // In this 2v2 line the two middle units die (each touches an
        // opponent with fewer threats); an even trade still scores negative
        // because own losses count double.
        let grid = grid_with(&[
            (Tile::new(5, 5), TileKind::OwnAnt, SELF_OWNER),
            (Tile::new(5, 6), TileKind::OwnAnt, SELF_OWNER),
            (Tile::new(5, 7), TileKind::EnemyAnt, 1),
            (Tile::new(5, 8), TileKind::EnemyAnt, 1),
        ]);
        let index = NearbyEnemies::build(&grid, &attack_disc());
        let score = area_score(Tile::new(5, 6), &grid, &index, &attack_disc());
        assert_eq!(score, 1 - OWN_LOSS_WEIGHT);
    }

    #[test]
    fn test_area_score_respects_origin_disc() {
        // A losing fight far outside the scored disc does not affect the
        // score.
        let grid = grid_with(&[
            (Tile::new(1, 1), TileKind::OwnAnt, SELF_OWNER),
            (Tile::new(1, 2), TileKind::EnemyAnt, 1),
            (Tile::new(15, 15), TileKind::OwnAnt, SELF_OWNER),
        ]);
        let index = NearbyEnemies::build(&grid, &attack_disc());
        assert_eq!(area_score(Tile::new(15, 15), &grid, &index, &attack_disc()), 0);
    }

    #[test]
    fn test_predict_no_moves_is_identity() {
        let grid = grid_with(&[(Tile::new(3, 3), TileKind::OwnAnt, SELF_OWNER)]);
        let predicted = predict(&grid, &HashMap::new());
        assert_eq!(predicted, grid);
    }

    #[test]
    fn test_predict_single_move_relocates_record() {
        let src = Tile::new(3, 3);
        let dest = Tile::new(3, 4);
        let grid = grid_with(&[(src, TileKind::OwnAnt, SELF_OWNER)]);
        let moves = HashMap::from([(dest, src)]);
        let predicted = predict(&grid, &moves);
        assert_eq!(predicted.record(dest), TileRecord::new(TileKind::OwnAnt, SELF_OWNER));
        assert_eq!(predicted.record(src), TileRecord::LAND);
        for tile in grid.tiles() {
            if tile != src && tile != dest {
                assert_eq!(predicted.record(tile), grid.record(tile));
            }
        }
    }

    #[test]
    fn test_predict_chained_moves_keep_every_record() {
        // A steps into B's cell while B steps onward; neither record may be
        // lost or duplicated, whatever order the moves apply in.
        let a = Tile::new(3, 3);
        let b = Tile::new(3, 4);
        let c = Tile::new(3, 5);
        let grid = grid_with(&[
            (a, TileKind::OwnAnt, SELF_OWNER),
            (b, TileKind::OwnAnt, SELF_OWNER),
        ]);
        let moves = HashMap::from([(b, a), (c, b)]);
        let predicted = predict(&grid, &moves);
        assert_eq!(predicted.kind(a), TileKind::Land);
        assert_eq!(predicted.kind(b), TileKind::OwnAnt);
        assert_eq!(predicted.kind(c), TileKind::OwnAnt);
    }

    #[test]
    fn test_scoring_a_predicted_snapshot() {
        // Walking the lone own unit away from the enemy turns a mutual-death
        // area into a clean one.
        let own = Tile::new(5, 5);
        let enemy = Tile::new(5, 7);
        let grid = grid_with(&[
            (own, TileKind::OwnAnt, SELF_OWNER),
            (enemy, TileKind::EnemyAnt, 1),
        ]);
        let index = NearbyEnemies::build(&grid, &attack_disc());
        assert_eq!(area_score(enemy, &grid, &index, &attack_disc()), -1);

        let retreat = HashMap::from([(Tile::new(5, 4), own)]);
        let predicted = predict(&grid, &retreat);
        let predicted_index = NearbyEnemies::build(&predicted, &attack_disc());
        assert_eq!(
            area_score(enemy, &predicted, &predicted_index, &attack_disc()),
            0
        );
    }
}
