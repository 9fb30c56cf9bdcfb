use crate::games::SessionRng;
use super::game_state::{GameState, StepOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Moved { ate: bool },
    Died { deaths: u64 },
}

impl TickOutcome {
    pub fn changed_state(&self) -> bool {
        !matches!(self, TickOutcome::Idle)
    }
}

impl From<StepOutcome> for TickOutcome {
    fn from(outcome: StepOutcome) -> Self {
        match outcome {
            StepOutcome::Moved { ate } => TickOutcome::Moved { ate },
            StepOutcome::Died { deaths } => TickOutcome::Died { deaths },
        }
    }
}

/// Turns queued pending moves into simulation steps, at most one per tick and
/// never faster than the configured rate. Idle and cooling down are not
/// stored; both fall out of comparing `now` with the last move time.
#[derive(Clone, Copy, Debug)]
pub struct MoveScheduler {
    min_move_interval_ms: i64,
}

impl MoveScheduler {
    pub fn new(min_move_interval_ms: i64) -> Self {
        Self {
            min_move_interval_ms,
        }
    }

    pub fn for_state(state: &GameState) -> Self {
        Self::new(state.settings().min_move_interval_ms())
    }

    pub fn min_move_interval_ms(&self) -> i64 {
        self.min_move_interval_ms
    }

    pub fn is_due(&self, state: &GameState, now: i64) -> bool {
        state.pending_moves() > 0
            && now.saturating_sub(state.last_move_time()) >= self.min_move_interval_ms
    }

    pub fn tick(&self, state: &mut GameState, now: i64, rng: &mut SessionRng) -> TickOutcome {
        if !self.is_due(state, now) {
            return TickOutcome::Idle;
        }
        state.simulation_step(now, rng).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::snake::EngineSettings;

    const START: i64 = 50_000;

    fn create() -> (GameState, MoveScheduler, SessionRng) {
        let state = GameState::new(EngineSettings::default(), START).unwrap();
        let scheduler = MoveScheduler::for_state(&state);
        (state, scheduler, SessionRng::new(4))
    }

    #[test]
    fn test_idle_without_pending_moves() {
        let (mut state, scheduler, mut rng) = create();
        assert_eq!(scheduler.tick(&mut state, START + 10_000, &mut rng), TickOutcome::Idle);
        assert_eq!(state.snake().head().x, 20);
    }

    #[test]
    fn test_waits_for_rate_limit() {
        let (mut state, scheduler, mut rng) = create();
        state.enqueue_moves(1);
        assert_eq!(scheduler.tick(&mut state, START + 999, &mut rng), TickOutcome::Idle);
        assert_eq!(state.pending_moves(), 1);
        assert!(scheduler.tick(&mut state, START + 1_000, &mut rng).changed_state());
        assert_eq!(state.pending_moves(), 0);
    }

    #[test]
    fn test_burst_is_throttled_to_one_move_per_second() {
        let (mut state, scheduler, mut rng) = create();
        state.enqueue_moves(5);

        let mut moves = 0;
        let mut now = START;
        // Poll every 50ms for five seconds.
        for _ in 0..100 {
            now += 50;
            if scheduler.tick(&mut state, now, &mut rng).changed_state() {
                moves += 1;
            }
        }

        assert_eq!(moves, 5);
        assert_eq!(state.pending_moves(), 0);
    }

    #[test]
    fn test_burst_consumes_at_most_one_per_window() {
        let (mut state, scheduler, mut rng) = create();
        state.enqueue_moves(5);

        let mut now = START;
        let mut last_move: Option<i64> = None;
        for _ in 0..70 {
            now += 50;
            if scheduler.tick(&mut state, now, &mut rng).changed_state() {
                if let Some(previous) = last_move {
                    assert!(now - previous >= 1_000);
                }
                last_move = Some(now);
            }
        }

        assert_eq!(state.pending_moves(), 2);
    }

    #[test]
    fn test_higher_rate_allows_more_moves() {
        let settings = EngineSettings {
            max_moves_per_second: 4,
            ..EngineSettings::default()
        };
        let mut state = GameState::new(settings, START).unwrap();
        let scheduler = MoveScheduler::for_state(&state);
        let mut rng = SessionRng::new(4);
        state.enqueue_moves(10);

        let mut now = START;
        for _ in 0..20 {
            now += 50;
            scheduler.tick(&mut state, now, &mut rng);
        }

        assert_eq!(state.pending_moves(), 6);
    }
}
