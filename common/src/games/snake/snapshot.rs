use serde::{Deserialize, Serialize};

use crate::EngineError;
use super::settings::EngineSettings;
use super::types::{Direction, DirectionCounters, GridPosition};

/// Read-only copy of the whole game state, as served to the view layer and
/// written by the persistence store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub snake: Vec<GridPosition>,
    pub foods: Vec<GridPosition>,
    pub direction: Direction,
    pub score: u64,
    pub deaths: u64,
    pub direction_scores: DirectionCounters,
    pub direction_attempts: DirectionCounters,
    pub direction_changes: u64,
    pub last_change_time: i64,
    pub start_time: i64,
    pub last_food_time: i64,
    pub last_move_time: i64,
    pub pending_moves: u64,
    pub board_width: i32,
    pub board_height: i32,
    pub max_moves_per_second: u32,
    pub max_foods: usize,
    pub food_interval: i64,
}

impl GameSnapshot {
    pub fn validate_against(&self, settings: &EngineSettings) -> Result<(), EngineError> {
        let invalid = |reason: String| Err(EngineError::InvalidSnapshot(reason));

        if self.board_width != settings.board_width || self.board_height != settings.board_height {
            return invalid(format!(
                "board {}x{} does not match configured {}x{}",
                self.board_width, self.board_height, settings.board_width, settings.board_height
            ));
        }

        let board = settings.board();

        if self.snake.is_empty() {
            return invalid("snake must not be empty".to_string());
        }
        if let Some(segment) = self.snake.iter().find(|s| !board.contains(**s)) {
            return invalid(format!("snake segment ({}, {}) is off the board", segment.x, segment.y));
        }
        if self.snake.len() >= 2 && board.step(self.snake[0], self.direction) == self.snake[1] {
            return invalid(format!(
                "direction {} points back into the body",
                self.direction.name()
            ));
        }

        if self.foods.len() > settings.max_foods {
            return invalid(format!(
                "{} foods exceed the maximum of {}",
                self.foods.len(),
                settings.max_foods
            ));
        }
        for (idx, food) in self.foods.iter().enumerate() {
            if !board.contains(*food) {
                return invalid(format!("food ({}, {}) is off the board", food.x, food.y));
            }
            if self.foods.iter().skip(idx + 1).any(|other| other == food) {
                return invalid(format!("duplicate food at ({}, {})", food.x, food.y));
            }
            if self.snake.contains(food) {
                return invalid(format!("food ({}, {}) overlaps the snake", food.x, food.y));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::snake::GameState;

    fn snapshot() -> (GameSnapshot, EngineSettings) {
        let settings = EngineSettings::default();
        let state = GameState::new(settings.clone(), 0).unwrap();
        (state.snapshot(), settings)
    }

    #[test]
    fn test_fresh_snapshot_is_valid() {
        let (snapshot, settings) = snapshot();
        assert!(snapshot.validate_against(&settings).is_ok());
    }

    #[test]
    fn test_rejects_board_mismatch() {
        let (mut snapshot, settings) = snapshot();
        snapshot.board_width = 41;
        assert!(snapshot.validate_against(&settings).is_err());
    }

    #[test]
    fn test_rejects_empty_snake() {
        let (mut snapshot, settings) = snapshot();
        snapshot.snake.clear();
        assert!(snapshot.validate_against(&settings).is_err());
    }

    #[test]
    fn test_rejects_duplicate_food() {
        let (mut snapshot, settings) = snapshot();
        snapshot.foods = vec![GridPosition::new(1, 1), GridPosition::new(1, 1)];
        assert!(snapshot.validate_against(&settings).is_err());
    }

    #[test]
    fn test_rejects_too_many_foods() {
        let (mut snapshot, settings) = snapshot();
        snapshot.foods = (0..11).map(|x| GridPosition::new(x, 0)).collect();
        assert!(snapshot.validate_against(&settings).is_err());
    }

    #[test]
    fn test_rejects_off_board_segment() {
        let (mut snapshot, settings) = snapshot();
        snapshot.snake.push(GridPosition::new(-1, 0));
        assert!(snapshot.validate_against(&settings).is_err());
    }

    #[test]
    fn test_rejects_direction_into_neck() {
        let (mut snapshot, settings) = snapshot();
        snapshot.snake = vec![GridPosition::new(5, 1), GridPosition::new(6, 1)];
        snapshot.direction = Direction::Right;
        assert!(matches!(
            snapshot.validate_against(&settings),
            Err(EngineError::InvalidSnapshot(_))
        ));

        snapshot.direction = Direction::Left;
        assert!(snapshot.validate_against(&settings).is_ok());
    }

    #[test]
    fn test_json_uses_view_field_names() {
        let (snapshot, _) = snapshot();
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["snake"][0]["x"], 20);
        assert_eq!(value["direction"]["x"], 1);
        assert_eq!(value["pendingMoves"], 0);
        assert_eq!(value["directionScores"]["up"], 0);
        assert_eq!(value["boardWidth"], 40);
    }

    #[test]
    fn test_negative_pending_moves_fail_to_parse() {
        let (snapshot, _) = snapshot();
        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["pendingMoves"] = serde_json::json!(-1);
        assert!(serde_json::from_value::<GameSnapshot>(value).is_err());
    }
}
