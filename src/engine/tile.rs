//! Tile coordinates, directions, and per-cell records.

use std::fmt;

/// Owner id used when a cell has no meaningful owner.
pub const NO_OWNER: i8 = -1;

/// Owner id of our own units and hills.
pub const SELF_OWNER: i8 = 0;

/// A location on the game map.
///
/// Coordinates are canonical: construction goes through the grid's toroidal
/// wrap, so `row` and `col` are always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    /// Row (y) coordinate.
    pub row: u16,
    /// Column (x) coordinate.
    pub col: u16,
}

impl Tile {
    /// Create a new tile.
    #[must_use]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A signed (row, col) offset relative to some tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    /// Row delta.
    pub dr: i16,
    /// Column delta.
    pub dc: i16,
}

impl Offset {
    /// Create a new offset.
    #[must_use]
    pub const fn new(dr: i16, dc: i16) -> Self {
        Self { dr, dc }
    }
}

/// One of the four cardinal movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Decreasing row.
    North,
    /// Increasing column.
    East,
    /// Increasing row.
    South,
    /// Decreasing column.
    West,
}

impl Direction {
    /// All four directions, in the fixed order field descent examines them.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The (row, col) delta of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> Offset {
        match self {
            Direction::North => Offset::new(-1, 0),
            Direction::East => Offset::new(0, 1),
            Direction::South => Offset::new(1, 0),
            Direction::West => Offset::new(0, -1),
        }
    }

    /// The opposite direction (the way a unit came from after stepping).
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Single-letter wire symbol used in order lines.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::East => 'E',
            Direction::South => 'S',
            Direction::West => 'W',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// What currently sits on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TileKind {
    /// Open ground.
    Land = 0,
    /// Impassable water.
    Water = 1,
    /// A food item waiting to be harvested.
    Food = 2,
    /// One of our own units.
    OwnAnt = 3,
    /// An opposing unit.
    EnemyAnt = 4,
    /// One of our own spawn hills.
    OwnHill = 5,
    /// An opposing spawn hill.
    EnemyHill = 6,
    /// A unit died here this turn.
    Dead = 7,
}

impl TileKind {
    /// Whether movement may ever route through this cell.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, TileKind::Water)
    }

    /// Whether a unit may step onto this cell this turn.
    ///
    /// Food blocks movement until harvested; live units block their cell.
    #[must_use]
    pub const fn is_unoccupied(self) -> bool {
        matches!(
            self,
            TileKind::Land | TileKind::Dead | TileKind::OwnHill | TileKind::EnemyHill
        )
    }

    /// Whether this cell holds a live unit of either side.
    #[must_use]
    pub const fn is_ant(self) -> bool {
        matches!(self, TileKind::OwnAnt | TileKind::EnemyAnt)
    }
}

/// The full record stored per grid cell: kind plus owner.
///
/// `owner` is only meaningful for units and hills; everywhere else it is
/// [`NO_OWNER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRecord {
    /// What occupies the cell.
    pub kind: TileKind,
    /// Owning player id, or [`NO_OWNER`].
    pub owner: i8,
}

impl TileRecord {
    /// Record for open land with no owner.
    pub const LAND: TileRecord = TileRecord {
        kind: TileKind::Land,
        owner: NO_OWNER,
    };

    /// Create a record with an explicit owner.
    #[must_use]
    pub const fn new(kind: TileKind, owner: i8) -> Self {
        Self { kind, owner }
    }

    /// Create an unowned record.
    #[must_use]
    pub const fn unowned(kind: TileKind) -> Self {
        Self::new(kind, NO_OWNER)
    }
}

impl Default for TileRecord {
    fn default() -> Self {
        Self::LAND
    }
}
