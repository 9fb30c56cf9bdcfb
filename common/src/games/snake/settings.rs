use serde::{Deserialize, Serialize};

use crate::config::Validate;
use crate::EngineError;
use super::direction_policy::{DirectionPolicy, DirectionPolicyMode};
use super::food::FoodManager;
use super::types::{BoardSize, Direction, GridPosition};

/// Leading segments that may be exempt from the self-collision check.
pub const MAX_COLLISION_SKIP_SEGMENTS: usize = 2;

/// Engine configuration, fixed for the lifetime of the process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub board_width: i32,
    pub board_height: i32,
    /// Where the snake starts and respawns.
    pub origin: GridPosition,
    pub initial_direction: Direction,
    pub initial_food: Option<GridPosition>,
    pub max_foods: usize,
    pub food_interval_ms: i64,
    pub max_moves_per_second: u32,
    pub direction_change_interval_ms: i64,
    /// Scheduler poll cadence; independent of the move rate.
    pub poll_interval_ms: u64,
    /// Segments nearest the head ignored by the self-collision check
    /// (0 = strict). Also used by the safe direction policy.
    pub collision_skip_segments: usize,
    pub direction_policy: DirectionPolicyMode,
    pub spawn_retry_limit: u32,
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            board_width: 40,
            board_height: 30,
            origin: GridPosition::new(20, 15),
            initial_direction: Direction::Right,
            initial_food: Some(GridPosition::new(10, 10)),
            max_foods: 10,
            food_interval_ms: 30_000,
            max_moves_per_second: 1,
            direction_change_interval_ms: 5_000,
            poll_interval_ms: 50,
            collision_skip_segments: 1,
            direction_policy: DirectionPolicyMode::Random,
            spawn_retry_limit: 100,
            seed: None,
        }
    }
}

impl EngineSettings {
    pub fn board(&self) -> BoardSize {
        BoardSize::new(self.board_width, self.board_height)
    }

    pub fn food_manager(&self) -> FoodManager {
        FoodManager {
            board: self.board(),
            max_foods: self.max_foods,
            food_interval_ms: self.food_interval_ms,
            retry_limit: self.spawn_retry_limit,
        }
    }

    pub fn direction_policy(&self) -> DirectionPolicy {
        DirectionPolicy {
            mode: self.direction_policy,
            interval_ms: self.direction_change_interval_ms,
            collision_skip: self.collision_skip_segments,
            board: self.board(),
        }
    }

    /// Minimum spacing between two moves.
    pub fn min_move_interval_ms(&self) -> i64 {
        1_000 / i64::from(self.max_moves_per_second.max(1))
    }

    pub fn check(&self) -> Result<(), EngineError> {
        self.validate().map_err(EngineError::InvalidSettings)
    }
}

impl Validate for EngineSettings {
    fn validate(&self) -> Result<(), String> {
        if self.board_width <= 0 || self.board_height <= 0 {
            return Err(format!(
                "Board dimensions must be positive, got {}x{}",
                self.board_width, self.board_height
            ));
        }
        let board = self.board();
        if !board.contains(self.origin) {
            return Err(format!(
                "Origin ({}, {}) is outside the board",
                self.origin.x, self.origin.y
            ));
        }
        if let Some(food) = self.initial_food {
            if !board.contains(food) {
                return Err(format!("Initial food ({}, {}) is outside the board", food.x, food.y));
            }
            if food == self.origin {
                return Err("Initial food must not overlap the origin".to_string());
            }
        }
        if self.max_foods < 1 || self.max_foods >= board.cell_count() {
            return Err(format!(
                "Max foods must be between 1 and {}",
                board.cell_count().saturating_sub(1)
            ));
        }
        if self.food_interval_ms <= 0 {
            return Err("Food interval must be positive".to_string());
        }
        if self.max_moves_per_second == 0 {
            return Err("Max moves per second must be at least 1".to_string());
        }
        if self.direction_change_interval_ms <= 0 {
            return Err("Direction change interval must be positive".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("Poll interval must be positive".to_string());
        }
        if self.collision_skip_segments > MAX_COLLISION_SKIP_SEGMENTS {
            return Err(format!(
                "Collision skip segments must be at most {}",
                MAX_COLLISION_SKIP_SEGMENTS
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(EngineSettings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_board() {
        let settings = EngineSettings {
            board_width: 0,
            ..EngineSettings::default()
        };
        assert!(matches!(settings.check(), Err(EngineError::InvalidSettings(_))));
    }

    #[test]
    fn test_rejects_zero_move_rate() {
        let settings = EngineSettings {
            max_moves_per_second: 0,
            ..EngineSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_origin_outside_board() {
        let settings = EngineSettings {
            origin: GridPosition::new(40, 0),
            ..EngineSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_excessive_collision_skip() {
        let settings = EngineSettings {
            collision_skip_segments: 3,
            ..EngineSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_min_move_interval() {
        let settings = EngineSettings {
            max_moves_per_second: 4,
            ..EngineSettings::default()
        };
        assert_eq!(settings.min_move_interval_ms(), 250);
        assert_eq!(EngineSettings::default().min_move_interval_ms(), 1_000);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let settings: EngineSettings =
            serde_yaml_ng::from_str("board_width: 12\nboard_height: 8\norigin: {x: 3, y: 3}\n").unwrap();
        assert_eq!(settings.board_width, 12);
        assert_eq!(settings.max_foods, 10);
        assert_eq!(settings.initial_direction, Direction::Right);
    }
}
