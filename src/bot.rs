//! The per-turn policy pipeline.
//!
//! Consumes the engine's fields and combat simulator to assign units to
//! harvesting, defense, exploration, and hill razing, then runs a
//! speculative combat pass that cancels orders walking into losing fights.
//! Re-ordering the passes changes their priority; earlier passes claim units
//! first: food, then defense, exploration, and razing.

use std::collections::BTreeSet;

use crate::engine::{
    DistanceField, ExplorationMemory, GameParams, Grid, NearbyEnemies, OrderBook, TurnClock,
    Direction, Tile, TileKind, area_score, build_combat_field, build_field, composite,
    nearest_of_kind, predict,
};

/// Tuning constants for the policy passes.
#[derive(Debug, Clone, Copy)]
pub struct BotConfig {
    /// Field cost below which a unit counts as close to an enemy hill and is
    /// reserved for razing.
    pub enemy_hill_proximity: i32,
    /// Maximum field cost from an own hill at which a unit may be drafted as
    /// a defender.
    pub defense_range: i32,
    /// Field cost below which an enemy counts as threatening an own hill.
    pub enemy_defense_range: i32,
    /// Cap on the per-cell "last seen" counter feeding the explore field.
    pub unseen_cap: i32,
    /// Own-ants field cost above which an enemy is too far away for combat
    /// analysis to bother with.
    pub combat_relevance: i32,
    /// Milliseconds of turn budget below which the speculative combat pass
    /// is skipped entirely.
    pub analysis_floor_ms: i64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            enemy_hill_proximity: 10,
            defense_range: 10,
            enemy_defense_range: 15,
            unseen_cap: 10,
            combat_relevance: 5,
            analysis_floor_ms: 50,
        }
    }
}

/// All distance fields computed for one turn.
///
/// Base fields come straight from the engine; the composites below them are
/// the role-specific decision signals.
#[derive(Debug)]
struct FieldSet {
    own_ants: DistanceField,
    own_hills: DistanceField,
    enemy_hills: DistanceField,
    food: DistanceField,
    explore: DistanceField,
    explorer: DistanceField,
    combat: DistanceField,
    defender: DistanceField,
}

/// The complete bot: world state, persistent memories, and policy.
#[derive(Debug)]
pub struct Bot {
    grid: Grid,
    orders: OrderBook,
    memory: ExplorationMemory,
    seen_food: BTreeSet<Tile>,
    seen_enemy_hills: BTreeSet<Tile>,
    config: BotConfig,
    turn: u32,
}

impl Bot {
    /// Create a bot for a game with the given parameters.
    #[must_use]
    pub fn new(params: GameParams, config: BotConfig) -> Self {
        Self {
            grid: Grid::new(params),
            orders: OrderBook::new(),
            memory: ExplorationMemory::new(params.rows, params.cols, config.unseen_cap),
            seen_food: BTreeSet::new(),
            seen_enemy_hills: BTreeSet::new(),
            config,
            turn: 0,
        }
    }

    /// The live world state.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Turns played so far.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Drop last turn's transient observations before applying new ones.
    pub fn begin_turn(&mut self) {
        self.grid.clear_own_ants();
        self.grid.clear_enemy_ants();
        self.grid.clear_food();
        self.grid.clear_hills();
        self.grid.clear_dead();
        self.grid.clear_vision();
    }

    /// Record one observation from this turn's update block.
    pub fn observe_water(&mut self, tile: Tile) {
        self.grid.update_unowned(TileKind::Water, tile);
    }

    /// Record a food sighting.
    pub fn observe_food(&mut self, tile: Tile) {
        self.grid.update_unowned(TileKind::Food, tile);
    }

    /// Record a live unit sighting.
    pub fn observe_ant(&mut self, tile: Tile, owner: i8) {
        let kind = if owner == 0 {
            TileKind::OwnAnt
        } else {
            TileKind::EnemyAnt
        };
        self.grid.update(kind, tile, owner);
    }

    /// Record a unit death.
    pub fn observe_dead(&mut self, tile: Tile, owner: i8) {
        self.grid.update(TileKind::Dead, tile, owner);
    }

    /// Record a hill sighting.
    pub fn observe_hill(&mut self, tile: Tile, owner: i8) {
        self.grid.update_hill(owner, tile);
    }

    /// Run the full decision pipeline and return this turn's committed
    /// moves, sorted by source tile.
    pub fn take_turn(&mut self, clock: &TurnClock) -> Vec<(Tile, Direction)> {
        self.turn += 1;
        self.orders.reset();
        self.grid.compute_vision();
        self.refresh_food_memory();
        self.refresh_hill_memory();

        let unseen = self.memory.observe(&self.grid);
        let fields = self.build_fields(&unseen);

        let mut pool: Vec<Tile> = self.grid.own_ants().iter().copied().collect();
        let total_ants = pool.len();

        self.food_pass(&fields, &mut pool);
        self.defense_pass(&fields, &mut pool);
        self.explore_pass(&fields, &mut pool, total_ants);
        self.raze_pass(&fields, &pool);
        if clock.remaining_ms() >= self.config.analysis_floor_ms {
            self.analysis_pass(&fields);
        }

        let mut moves: Vec<(Tile, Direction)> = self
            .orders
            .moves()
            .iter()
            .filter_map(|(&destination, &source)| {
                self.grid
                    .cells()
                    .direction_to(source, destination)
                    .map(|direction| (source, direction))
            })
            .collect();
        moves.sort_unstable_by_key(|&(source, _)| source);
        moves
    }

    /// Drop remembered food that is no longer there; remember new sightings.
    fn refresh_food_memory(&mut self) {
        let grid = &self.grid;
        self.seen_food
            .retain(|&food| grid.kind_at(food) == TileKind::Food || !grid.is_visible(food));
        self.seen_food.extend(grid.food().iter().copied());
    }

    /// Forget razed enemy hills; remember new sightings.
    fn refresh_hill_memory(&mut self) {
        let grid = &self.grid;
        self.seen_enemy_hills
            .retain(|hill| !grid.own_ants().contains(hill));
        self.seen_enemy_hills.extend(grid.enemy_hills().iter().copied());
    }

    fn build_fields(&self, unseen: &[Tile]) -> FieldSet {
        let cells = self.grid.cells();
        let own_sources: Vec<Tile> = self.grid.own_ants().iter().copied().collect();
        let hill_sources: Vec<Tile> = self.grid.own_hills().iter().copied().collect();
        let enemy_sources: Vec<Tile> = self.grid.enemy_ants().iter().copied().collect();
        let enemy_hill_sources: Vec<Tile> = self.seen_enemy_hills.iter().copied().collect();
        let food_sources: Vec<Tile> = self.seen_food.iter().copied().collect();

        let own_ants = build_field(cells, &own_sources, None);
        let own_hills = build_field(cells, &hill_sources, None);
        let enemy_ants = build_combat_field(cells, &enemy_sources, None);
        let enemy_hills = build_field(cells, &enemy_hill_sources, None);
        let food = build_field(cells, &food_sources, None);

        let weights = self.memory.explore_weights(unseen);
        let explore = build_field(cells, unseen, Some(&weights));

        let explorer = composite(&[&explore], &[1]);
        let combat = composite(&[&enemy_hills, &enemy_ants, &explorer], &[10, 0, 1]);
        let defender = composite(&[&enemy_ants, &own_hills], &[1, 1]);

        FieldSet {
            own_ants,
            own_hills,
            enemy_hills,
            food,
            explore,
            explorer,
            combat,
            defender,
        }
    }

    /// One harvester per remembered food tile: the nearest unit marches down
    /// the food field.
    fn food_pass(&mut self, fields: &FieldSet, pool: &mut Vec<Tile>) {
        for food in self.seen_food.clone() {
            if let Some(ant) = nearest_of_kind(self.grid.cells(), food, TileKind::OwnAnt) {
                self.orders
                    .move_along_field(&self.grid, &fields.food, ant, false);
                pool.retain(|&t| t != ant);
            }
        }
    }

    /// Draft units standing near an own hill, one and a half per enemy
    /// threatening it.
    fn defense_pass(&mut self, fields: &FieldSet, pool: &mut Vec<Tile>) {
        pool.sort_by_key(|&ant| fields.own_hills.get(ant));

        let threats = self
            .grid
            .enemy_ants()
            .iter()
            .filter(|&&enemy| fields.own_hills.get(enemy) < self.config.enemy_defense_range)
            .count();

        let mut allocated = 0usize;
        let mut index = 0;
        while index < pool.len() {
            #[allow(clippy::cast_precision_loss)]
            if allocated as f64 >= threats as f64 * 1.5 {
                break;
            }
            let ant = pool[index];
            if fields.own_hills.get(ant) > self.config.defense_range {
                index += 1;
                continue;
            }
            if self
                .orders
                .move_along_field(&self.grid, &fields.defender, ant, false)
            {
                pool.remove(index);
                allocated += 1;
            } else {
                index += 1;
            }
        }
    }

    /// Send a shrinking fraction of the colony toward long-unseen territory.
    fn explore_pass(&mut self, fields: &FieldSet, pool: &mut Vec<Tile>, total_ants: usize) {
        if total_ants == 0 {
            return;
        }
        // Allocation decays as the colony grows: n / (0.2 n)^0.35.
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let target = (total_ants as f64 / (total_ants as f64 * 0.2).powf(0.35)).ceil() as usize;

        pool.sort_by_key(|&ant| fields.explorer.get(ant));

        let mut allocated = 0usize;
        let mut index = 0;
        while index < pool.len() {
            if allocated >= target {
                break;
            }
            let ant = pool[index];
            // Units already closing on an enemy hill belong to the razing
            // pass instead.
            let hill_cost = fields.enemy_hills.get(ant);
            if hill_cost <= self.config.enemy_hill_proximity && hill_cost != 0 {
                index += 1;
                continue;
            }
            if self
                .orders
                .move_along_field(&self.grid, &fields.explore, ant, false)
            {
                pool.remove(index);
                allocated += 1;
            } else {
                index += 1;
            }
        }
    }

    /// Everyone left either storms a known enemy hill or follows the combat
    /// composite toward contested ground.
    fn raze_pass(&mut self, fields: &FieldSet, pool: &[Tile]) {
        for &ant in pool {
            let cost = fields.enemy_hills.get(ant);
            if cost > self.config.enemy_hill_proximity || cost == 0 {
                self.orders
                    .move_along_field(&self.grid, &fields.combat, ant, false);
            } else {
                self.orders
                    .move_along_field(&self.grid, &fields.enemy_hills, ant, false);
            }
        }
    }

    /// Score every nearby engagement on the predicted map and cancel the
    /// orders of own units caught in losing ones.
    fn analysis_pass(&mut self, fields: &FieldSet) {
        // The attack disc was computed once at startup; every index build and
        // area score this turn shares it.
        let offsets: Vec<_> = self.grid.combat_offsets().to_vec();
        let predicted = predict(self.grid.cells(), self.orders.moves());
        let index = NearbyEnemies::build(&predicted, &offsets);

        let enemies: Vec<Tile> = self.grid.enemy_ants().iter().copied().collect();
        for enemy in enemies {
            if fields.own_ants.get(enemy) > self.config.combat_relevance {
                continue;
            }
            let score = area_score(enemy, &predicted, &index, &offsets);
            if score < 0 {
                for &offset in &offsets {
                    let spot = predicted.offset_tile(enemy, offset);
                    if predicted.kind(spot) == TileKind::OwnAnt {
                        self.orders.retract(spot);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(rows: u16, cols: u16) -> GameParams {
        GameParams {
            rows,
            cols,
            view_radius2: 55,
            attack_radius2: 5,
            ..GameParams::default()
        }
    }

    fn run_turn(bot: &mut Bot) -> Vec<(Tile, Direction)> {
        let clock = TurnClock::start(1000);
        bot.take_turn(&clock)
    }

    #[test]
    fn test_lone_ant_gathers_food() {
        let mut bot = Bot::new(params(20, 20), BotConfig::default());
        bot.begin_turn();
        bot.observe_ant(Tile::new(10, 10), 0);
        bot.observe_food(Tile::new(10, 14));
        let moves = run_turn(&mut bot);
        assert_eq!(moves, vec![(Tile::new(10, 10), Direction::East)]);
    }

    #[test]
    fn test_orders_never_collide() {
        let mut bot = Bot::new(params(20, 20), BotConfig::default());
        bot.begin_turn();
        // Two ants flanking one food tile: only one may claim each cell.
        bot.observe_ant(Tile::new(10, 9), 0);
        bot.observe_ant(Tile::new(10, 11), 0);
        bot.observe_food(Tile::new(10, 10));
        let moves = run_turn(&mut bot);
        let mut destinations: Vec<Tile> = moves
            .iter()
            .map(|&(source, direction)| bot.grid().neighbor(source, direction))
            .collect();
        destinations.sort_unstable();
        destinations.dedup();
        assert_eq!(destinations.len(), moves.len());
    }

    #[test]
    fn test_food_memory_evicts_eaten_food() {
        let mut bot = Bot::new(params(20, 20), BotConfig::default());
        bot.begin_turn();
        bot.observe_ant(Tile::new(10, 10), 0);
        bot.observe_food(Tile::new(10, 12));
        run_turn(&mut bot);
        assert!(bot.seen_food.contains(&Tile::new(10, 12)));

        // Next turn the food is gone and the cell is visible: forget it.
        bot.begin_turn();
        bot.observe_ant(Tile::new(10, 11), 0);
        run_turn(&mut bot);
        assert!(!bot.seen_food.contains(&Tile::new(10, 12)));
    }

    #[test]
    fn test_hill_memory_evicts_razed_hill() {
        let mut bot = Bot::new(params(20, 20), BotConfig::default());
        bot.begin_turn();
        bot.observe_ant(Tile::new(5, 5), 0);
        bot.observe_hill(Tile::new(5, 8), 1);
        run_turn(&mut bot);
        assert!(bot.seen_enemy_hills.contains(&Tile::new(5, 8)));

        // An own ant standing on the hill means it has been razed.
        bot.begin_turn();
        bot.observe_ant(Tile::new(5, 8), 0);
        run_turn(&mut bot);
        assert!(!bot.seen_enemy_hills.contains(&Tile::new(5, 8)));
    }

    #[test]
    fn test_ant_marches_toward_known_enemy_hill() {
        let mut bot = Bot::new(params(20, 20), BotConfig::default());
        bot.begin_turn();
        bot.observe_ant(Tile::new(5, 5), 0);
        bot.observe_hill(Tile::new(5, 9), 1);
        let moves = run_turn(&mut bot);
        assert_eq!(moves, vec![(Tile::new(5, 5), Direction::East)]);
    }

    #[test]
    fn test_losing_engagement_is_cancelled() {
        let mut bot = Bot::new(params(20, 20), BotConfig::default());
        bot.begin_turn();
        // One own ant adjacent-ish to two enemies: any step toward them is a
        // losing 1v2, and standing ground keeps it out of range.
        bot.observe_ant(Tile::new(10, 10), 0);
        bot.observe_ant(Tile::new(10, 13), 1);
        bot.observe_ant(Tile::new(11, 13), 1);
        let moves = run_turn(&mut bot);
        // Whatever the earlier passes proposed, analysis must have retracted
        // any move that walks into the losing fight.
        for &(source, direction) in &moves {
            let destination = bot.grid().neighbor(source, direction);
            assert!(
                bot.grid().distance2(destination, Tile::new(10, 13)) > 5
                    && bot.grid().distance2(destination, Tile::new(11, 13)) > 5
            );
        }
    }

    #[test]
    fn test_turn_counter_advances() {
        let mut bot = Bot::new(params(10, 10), BotConfig::default());
        bot.begin_turn();
        run_turn(&mut bot);
        bot.begin_turn();
        run_turn(&mut bot);
        assert_eq!(bot.turn(), 2);
    }
}
