use crate::games::SessionRng;
use crate::{log, log_warn, EngineError};
use super::remote::RemoteAction;
use super::settings::EngineSettings;
use super::snake::Snake;
use super::food::FoodSet;
use super::snapshot::GameSnapshot;
use super::types::{BoardSize, Direction, DirectionCounters, GridPosition};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub collided: bool,
    pub ate: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Moved { ate: bool },
    Died { deaths: u64 },
}

/// The whole simulation. Created once and only ever mutated in place; resets
/// keep score, deaths and per-direction statistics.
#[derive(Clone, Debug)]
pub struct GameState {
    settings: EngineSettings,
    snake: Snake,
    foods: FoodSet,
    direction: Direction,
    score: u64,
    deaths: u64,
    direction_scores: DirectionCounters,
    direction_attempts: DirectionCounters,
    direction_changes: u64,
    last_change_time: i64,
    start_time: i64,
    last_food_time: i64,
    last_move_time: i64,
    pending_moves: u64,
}

impl GameState {
    pub fn new(settings: EngineSettings, now: i64) -> Result<Self, EngineError> {
        settings.check()?;

        let mut foods = FoodSet::new();
        if let Some(food) = settings.initial_food {
            foods.insert(food);
        }

        Ok(Self {
            snake: Snake::new(settings.origin),
            direction: settings.initial_direction,
            settings,
            foods,
            score: 0,
            deaths: 0,
            direction_scores: DirectionCounters::default(),
            direction_attempts: DirectionCounters::default(),
            direction_changes: 0,
            last_change_time: now,
            start_time: now,
            last_food_time: now,
            last_move_time: now,
            pending_moves: 0,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn board(&self) -> BoardSize {
        self.settings.board()
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn foods(&self) -> &FoodSet {
        &self.foods
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn deaths(&self) -> u64 {
        self.deaths
    }

    pub fn direction_scores(&self) -> &DirectionCounters {
        &self.direction_scores
    }

    pub fn direction_attempts(&self) -> &DirectionCounters {
        &self.direction_attempts
    }

    pub fn direction_changes(&self) -> u64 {
        self.direction_changes
    }

    pub fn last_move_time(&self) -> i64 {
        self.last_move_time
    }

    pub fn last_change_time(&self) -> i64 {
        self.last_change_time
    }

    pub fn last_food_time(&self) -> i64 {
        self.last_food_time
    }

    pub fn pending_moves(&self) -> u64 {
        self.pending_moves
    }

    pub fn wrap(&self, pos: GridPosition) -> GridPosition {
        self.board().wrap(pos)
    }

    /// The only external write path into the simulation.
    pub fn enqueue_moves(&mut self, count: u64) -> u64 {
        self.pending_moves = self.pending_moves.saturating_add(count);
        self.pending_moves
    }

    /// Anti-reversal setter; returns whether the direction was accepted.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if direction.is_opposite(&self.direction) {
            return false;
        }
        self.direction = direction;
        true
    }

    pub fn try_spawn_food(&mut self, now: i64, rng: &mut SessionRng) -> Option<GridPosition> {
        let pos = self
            .settings
            .food_manager()
            .pick_position(&self.foods, &self.snake, rng);

        match pos {
            Some(pos) => {
                self.foods.insert(pos);
                self.last_food_time = now;
                log!("Food spawned at ({}, {})", pos.x, pos.y);
            }
            None if self.foods.len() < self.settings.max_foods => {
                log_warn!("No free cell for food, skipping spawn");
            }
            None => {}
        }
        pos
    }

    pub fn run_food_spawn_check(&mut self, now: i64, rng: &mut SessionRng) -> Option<GridPosition> {
        if !self
            .settings
            .food_manager()
            .should_spawn(&self.foods, self.last_food_time, now)
        {
            return None;
        }
        self.try_spawn_food(now, rng)
    }

    /// Moves the head one cell. On collision nothing is mutated; the caller
    /// decides what dying means.
    pub fn advance(&mut self) -> AdvanceOutcome {
        let new_head = self.board().step(self.snake.head(), self.direction);

        if self
            .snake
            .collides_with(new_head, self.settings.collision_skip_segments)
        {
            return AdvanceOutcome {
                collided: true,
                ate: false,
            };
        }

        let ate = self.foods.remove(new_head);
        if ate {
            self.snake.grow_to(new_head);
            self.score = self.score.saturating_add(1);
            self.direction_scores.increment(self.direction);
            log!(
                "Ate food at ({}, {}). Score: {}, length: {}",
                new_head.x,
                new_head.y,
                self.score,
                self.snake.len()
            );
        } else {
            self.snake.slither_to(new_head);
        }

        AdvanceOutcome {
            collided: false,
            ate,
        }
    }

    /// Periodic random turn. Returns the direction actually applied, if any.
    /// The change timer restarts whenever the interval has elapsed, even if
    /// the draw was rejected.
    pub fn maybe_change_direction(&mut self, now: i64, rng: &mut SessionRng) -> Option<Direction> {
        let policy = self.settings.direction_policy();
        if !policy.is_due(self.last_change_time, now) {
            return None;
        }
        self.last_change_time = now;

        let choice = policy.choose(&self.snake, self.direction, rng)?;
        self.direction_attempts.increment(choice);
        self.direction_changes = self.direction_changes.saturating_add(1);

        if self.set_direction(choice) {
            log!("Direction changed to {}", choice.name());
            Some(choice)
        } else {
            None
        }
    }

    /// One scheduled move: spawn check, advance, death handling, periodic
    /// turn, then consume the pending move. A collision consumes the move too.
    pub fn simulation_step(&mut self, now: i64, rng: &mut SessionRng) -> StepOutcome {
        self.run_food_spawn_check(now, rng);

        let advance = self.advance();
        let outcome = if advance.collided {
            self.reset_after_death(now, rng);
            StepOutcome::Died { deaths: self.deaths }
        } else {
            if advance.ate && self.foods.is_empty() {
                self.try_spawn_food(now, rng);
            }
            StepOutcome::Moved { ate: advance.ate }
        };

        self.maybe_change_direction(now, rng);
        self.last_move_time = now;
        self.pending_moves = self.pending_moves.saturating_sub(1);

        outcome
    }

    /// Back to a single segment at the origin. Score, deaths and direction
    /// statistics carry over; the per-life direction change count does not.
    pub fn reset_after_death(&mut self, now: i64, rng: &mut SessionRng) {
        self.deaths = self.deaths.saturating_add(1);
        self.snake = Snake::new(self.settings.origin);
        self.direction = self.settings.initial_direction;
        self.direction_changes = 0;
        self.last_change_time = now;

        if self.foods.is_empty() {
            self.try_spawn_food(now, rng);
        }

        log!("Snake died. Deaths: {}, score: {}", self.deaths, self.score);
    }

    /// Halves the body (rounding up) in place, counting it as a death.
    /// The initial direction is restored unless it would steer into the
    /// shortened body; then the current direction, or any safe one, is kept.
    pub fn shrink(&mut self, now: i64) {
        let new_len = self.snake.len().div_ceil(2);
        self.snake.truncate(new_len);
        self.deaths = self.deaths.saturating_add(1);
        self.direction = self.direction_after_shrink();
        self.last_change_time = now;

        log!("Snake shrunk to {}. Deaths: {}", self.snake.len(), self.deaths);
    }

    fn direction_after_shrink(&self) -> Direction {
        let policy = self.settings.direction_policy();
        let board = self.board();
        let head = self.snake.head();
        let neck = self.snake.neck();

        [self.settings.initial_direction, self.direction]
            .into_iter()
            .chain(Direction::ALL)
            .find(|d| Some(board.step(head, *d)) != neck && policy.is_safe(&self.snake, *d))
            .unwrap_or(self.direction)
    }

    pub fn apply_remote_action(&mut self, action: RemoteAction, now: i64, rng: &mut SessionRng) {
        log!("Remote action: {}", action);
        match action {
            RemoteAction::Suicide => self.reset_after_death(now, rng),
            RemoteAction::Shrink => self.shrink(now),
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            snake: self.snake.to_vec(),
            foods: self.foods.to_vec(),
            direction: self.direction,
            score: self.score,
            deaths: self.deaths,
            direction_scores: self.direction_scores,
            direction_attempts: self.direction_attempts,
            direction_changes: self.direction_changes,
            last_change_time: self.last_change_time,
            start_time: self.start_time,
            last_food_time: self.last_food_time,
            last_move_time: self.last_move_time,
            pending_moves: self.pending_moves,
            board_width: self.settings.board_width,
            board_height: self.settings.board_height,
            max_moves_per_second: self.settings.max_moves_per_second,
            max_foods: self.settings.max_foods,
            food_interval: self.settings.food_interval_ms,
        }
    }

    /// Replaces every live field with the snapshot's. Validated first; on
    /// error the state is untouched. Rate and food limits stay those of the
    /// running settings. Timestamps later than `now` are clamped to `now`,
    /// otherwise the interval checks would stall until the clock caught up.
    pub fn restore(&mut self, snapshot: &GameSnapshot, now: i64) -> Result<(), EngineError> {
        snapshot.validate_against(&self.settings)?;

        let snake = Snake::from_segments(snapshot.snake.clone())
            .ok_or_else(|| EngineError::InvalidSnapshot("snake must not be empty".to_string()))?;
        let mut foods = FoodSet::new();
        for food in &snapshot.foods {
            foods.insert(*food);
        }

        self.snake = snake;
        self.foods = foods;
        self.direction = snapshot.direction;
        self.score = snapshot.score;
        self.deaths = snapshot.deaths;
        self.direction_scores = snapshot.direction_scores;
        self.direction_attempts = snapshot.direction_attempts;
        self.direction_changes = snapshot.direction_changes;
        self.last_change_time = snapshot.last_change_time.min(now);
        self.start_time = snapshot.start_time.min(now);
        self.last_food_time = snapshot.last_food_time.min(now);
        self.last_move_time = snapshot.last_move_time.min(now);
        self.pending_moves = snapshot.pending_moves;

        let latest = snapshot
            .last_change_time
            .max(snapshot.start_time)
            .max(snapshot.last_food_time)
            .max(snapshot.last_move_time);
        if latest > now {
            log_warn!("Restored timestamps were ahead of the clock by {}ms, clamped", latest - now);
        }

        log!(
            "State restored: length {}, score {}, deaths {}",
            self.snake.len(),
            self.score,
            self.deaths
        );
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_layout(&mut self, snake: Vec<GridPosition>, foods: Vec<GridPosition>, direction: Direction) {
        self.snake = Snake::from_segments(snake).unwrap();
        self.foods = FoodSet::new();
        for food in foods {
            self.foods.insert(food);
        }
        self.direction = direction;
    }
}
