#![no_main]

//! Order arbitration fuzzer.
//!
//! Throws arbitrary proposal sequences at the order book and checks that the
//! committed set never violates arbitration invariants: one order per unit,
//! one unit per destination, and no destination on impassable ground.

use std::collections::HashSet;

use arbitrary::Arbitrary;
use formic::engine::{Direction, GameParams, Grid, Tile, TileKind};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct OrdersInput {
    rows: u8,
    cols: u8,
    water: Vec<(u8, u8)>,
    ants: Vec<(u8, u8)>,
    proposals: Vec<(u8, u8)>,
}

fuzz_target!(|input: OrdersInput| {
    let rows = u16::from(input.rows % 30) + 3;
    let cols = u16::from(input.cols % 30) + 3;
    let mut grid = Grid::new(GameParams {
        rows,
        cols,
        ..GameParams::default()
    });

    for &(row, col) in input.water.iter().take(64) {
        grid.update_unowned(
            TileKind::Water,
            Tile::new(u16::from(row) % rows, u16::from(col) % cols),
        );
    }
    let mut ants = Vec::new();
    for &(row, col) in input.ants.iter().take(64) {
        let tile = Tile::new(u16::from(row) % rows, u16::from(col) % cols);
        grid.update(TileKind::OwnAnt, tile, 0);
        ants.push(tile);
    }
    if ants.is_empty() {
        return;
    }

    let mut orders = formic::engine::OrderBook::new();
    for &(ant_index, dir_index) in input.proposals.iter().take(256) {
        let unit = ants[usize::from(ant_index) % ants.len()];
        let direction = Direction::ALL[usize::from(dir_index) % 4];
        let _ = orders.propose_move(&grid, unit, direction);
    }

    let committed = orders.committed_orders();
    let sources: HashSet<Tile> = committed.iter().map(|&(s, _)| s).collect();
    let destinations: HashSet<Tile> = committed.iter().map(|&(_, d)| d).collect();
    assert_eq!(sources.len(), committed.len(), "duplicate source committed");
    assert_eq!(
        destinations.len(),
        committed.len(),
        "duplicate destination committed"
    );
    for &(source, destination) in &committed {
        assert!(grid.kind_at(source) == TileKind::OwnAnt, "order without a unit");
        assert!(
            grid.kind_at(destination).is_passable(),
            "order into impassable ground"
        );
        assert_eq!(
            grid.distance2(source, destination),
            1,
            "order is not a single step"
        );
    }
});
