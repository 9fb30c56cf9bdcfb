use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Raw one-cell step, not wrapped onto the board.
    pub fn offset(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }
}

/// Serialized as the unit displacement vector `{x, y}`, matching the state
/// payload the view layer polls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DirectionVector", into = "DirectionVector")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    /// Screen coordinates: y grows downwards.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.delta() == (dx, dy))
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub fn is_opposite(&self, other: &Direction) -> bool {
        self.opposite() == *other
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionVector {
    pub x: i32,
    pub y: i32,
}

impl From<Direction> for DirectionVector {
    fn from(direction: Direction) -> Self {
        let (x, y) = direction.delta();
        Self { x, y }
    }
}

impl TryFrom<DirectionVector> for Direction {
    type Error = String;

    fn try_from(vector: DirectionVector) -> Result<Self, Self::Error> {
        Direction::from_delta(vector.x, vector.y)
            .ok_or_else(|| format!("({}, {}) is not a unit direction", vector.x, vector.y))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSize {
    pub width: i32,
    pub height: i32,
}

impl BoardSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Canonical toroidal representative of any integer pair. Requires
    /// positive dimensions, which settings validation guarantees.
    pub fn wrap(&self, pos: GridPosition) -> GridPosition {
        GridPosition::new(pos.x.rem_euclid(self.width), pos.y.rem_euclid(self.height))
    }

    pub fn step(&self, from: GridPosition, direction: Direction) -> GridPosition {
        self.wrap(from.offset(direction))
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    pub fn cell_count(&self) -> usize {
        usize::try_from(self.width).unwrap_or(0) * usize::try_from(self.height).unwrap_or(0)
    }

    pub fn cells(&self) -> impl Iterator<Item = GridPosition> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| GridPosition::new(x, y)))
    }
}

/// Per-direction counters, serialized as `{up, right, down, left}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionCounters {
    pub up: u64,
    pub right: u64,
    pub down: u64,
    pub left: u64,
}

impl DirectionCounters {
    pub fn get(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Up => self.up,
            Direction::Right => self.right,
            Direction::Down => self.down,
            Direction::Left => self.left,
        }
    }

    pub fn increment(&mut self, direction: Direction) {
        let slot = match direction {
            Direction::Up => &mut self.up,
            Direction::Right => &mut self.right,
            Direction::Down => &mut self.down,
            Direction::Left => &mut self.left,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        Direction::ALL.iter().map(|d| self.get(*d)).sum()
    }
}
