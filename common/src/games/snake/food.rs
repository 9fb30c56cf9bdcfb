use crate::games::SessionRng;
use super::snake::Snake;
use super::types::{BoardSize, GridPosition};

/// Food positions in spawn order; positions are unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FoodSet {
    items: Vec<GridPosition>,
}

impl FoodSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        self.items.contains(&pos)
    }

    /// Returns false if the position is already present.
    pub fn insert(&mut self, pos: GridPosition) -> bool {
        if self.contains(pos) {
            return false;
        }
        self.items.push(pos);
        true
    }

    pub fn remove(&mut self, pos: GridPosition) -> bool {
        match self.items.iter().position(|item| *item == pos) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridPosition> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<GridPosition> {
        self.items.clone()
    }
}

/// Decides when and where food appears.
#[derive(Clone, Copy, Debug)]
pub struct FoodManager {
    pub board: BoardSize,
    pub max_foods: usize,
    pub food_interval_ms: i64,
    pub retry_limit: u32,
}

impl FoodManager {
    /// Level-triggered: an empty board always qualifies, otherwise the interval
    /// must have elapsed and there must be room.
    pub fn should_spawn(&self, foods: &FoodSet, last_food_time: i64, now: i64) -> bool {
        if foods.is_empty() {
            return true;
        }
        now.saturating_sub(last_food_time) >= self.food_interval_ms && foods.len() < self.max_foods
    }

    /// Picks a free cell, or `None` when at capacity or the board is full.
    ///
    /// Uniform random draws are tried `retry_limit` times; after that the free
    /// cells are enumerated and one is chosen uniformly, so a crowded board
    /// cannot stall the caller.
    pub fn pick_position(
        &self,
        foods: &FoodSet,
        snake: &Snake,
        rng: &mut SessionRng,
    ) -> Option<GridPosition> {
        if foods.len() >= self.max_foods {
            return None;
        }

        let is_free = |pos: GridPosition| !snake.contains(pos) && !foods.contains(pos);

        for _ in 0..self.retry_limit {
            let pos = GridPosition::new(
                rng.random_range(0..self.board.width),
                rng.random_range(0..self.board.height),
            );
            if is_free(pos) {
                return Some(pos);
            }
        }

        let free_cells: Vec<GridPosition> = self.board.cells().filter(|pos| is_free(*pos)).collect();
        rng.choose(&free_cells)
    }
}
