use serde::{Deserialize, Serialize};

use crate::games::SessionRng;
use super::snake::Snake;
use super::types::{BoardSize, Direction};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionPolicyMode {
    /// Any direction other than the current one.
    #[default]
    Random,
    /// Prefer directions whose next cell is not occupied by the body.
    Safe,
}

/// Periodic random turn. Candidates are the three directions other than the
/// current one; the reverse is left in the draw and rejected later by the
/// anti-reversal rule of the setter.
#[derive(Clone, Copy, Debug)]
pub struct DirectionPolicy {
    pub mode: DirectionPolicyMode,
    pub interval_ms: i64,
    pub collision_skip: usize,
    pub board: BoardSize,
}

impl DirectionPolicy {
    pub fn is_due(&self, last_change_time: i64, now: i64) -> bool {
        now.saturating_sub(last_change_time) >= self.interval_ms
    }

    pub fn candidates(current: Direction) -> Vec<Direction> {
        Direction::ALL.into_iter().filter(|d| *d != current).collect()
    }

    /// `None` only when there is nothing to choose from.
    pub fn choose(&self, snake: &Snake, current: Direction, rng: &mut SessionRng) -> Option<Direction> {
        let candidates = Self::candidates(current);

        if self.mode == DirectionPolicyMode::Safe {
            let safe: Vec<Direction> = candidates
                .iter()
                .copied()
                .filter(|d| self.is_safe(snake, *d))
                .collect();
            if let Some(direction) = rng.choose(&safe) {
                return Some(direction);
            }
        }

        rng.choose(&candidates)
    }

    pub fn is_safe(&self, snake: &Snake, direction: Direction) -> bool {
        let next = self.board.step(snake.head(), direction);
        !snake.collides_with(next, self.collision_skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::snake::types::GridPosition;

    fn policy(mode: DirectionPolicyMode) -> DirectionPolicy {
        DirectionPolicy {
            mode,
            interval_ms: 5_000,
            collision_skip: 1,
            board: BoardSize::new(40, 30),
        }
    }

    #[test]
    fn test_candidates_exclude_only_current() {
        let candidates = DirectionPolicy::candidates(Direction::Right);
        assert_eq!(candidates.len(), 3);
        assert!(!candidates.contains(&Direction::Right));
        assert!(candidates.contains(&Direction::Left));
    }

    #[test]
    fn test_is_due_after_interval() {
        let policy = policy(DirectionPolicyMode::Random);
        assert!(!policy.is_due(10_000, 14_999));
        assert!(policy.is_due(10_000, 15_000));
    }

    #[test]
    fn test_random_choice_never_current() {
        let policy = policy(DirectionPolicyMode::Random);
        let snake = Snake::new(GridPosition::new(20, 15));
        let mut rng = SessionRng::new(11);
        for _ in 0..50 {
            let choice = policy.choose(&snake, Direction::Up, &mut rng).unwrap();
            assert_ne!(choice, Direction::Up);
        }
    }

    #[test]
    fn test_safe_choice_avoids_body() {
        let policy = policy(DirectionPolicyMode::Safe);
        // Heading right; the neck is to the left and the body wraps above the head.
        let snake = Snake::from_segments(vec![
            GridPosition::new(5, 5),
            GridPosition::new(4, 5),
            GridPosition::new(4, 4),
            GridPosition::new(5, 4),
            GridPosition::new(6, 4),
        ])
        .unwrap();
        let mut rng = SessionRng::new(2);
        for _ in 0..50 {
            let choice = policy.choose(&snake, Direction::Right, &mut rng).unwrap();
            assert_eq!(choice, Direction::Down);
        }
    }

    #[test]
    fn test_safe_choice_falls_back_when_boxed_in() {
        let policy = policy(DirectionPolicyMode::Safe);
        let snake = Snake::from_segments(vec![
            GridPosition::new(5, 5),
            GridPosition::new(4, 5),
            GridPosition::new(4, 4),
            GridPosition::new(5, 4),
            GridPosition::new(6, 4),
            GridPosition::new(6, 5),
            GridPosition::new(6, 6),
            GridPosition::new(5, 6),
        ])
        .unwrap();
        let mut rng = SessionRng::new(2);
        let choice = policy.choose(&snake, Direction::Right, &mut rng).unwrap();
        assert_ne!(choice, Direction::Right);
    }
}
