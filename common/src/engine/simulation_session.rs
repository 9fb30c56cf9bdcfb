use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use crate::games::snake::{
    EngineSettings, GameSnapshot, GameState, MoveScheduler, RemoteAction, TickOutcome,
};
use crate::games::{Clock, SessionRng};
use crate::{log, EngineError};
use super::tick_source::TickSource;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

struct SessionInner {
    game_state: GameState,
    rng: SessionRng,
}

/// Owns the single live `GameState`. Every operation takes the one lock, so a
/// tick and an external enqueue or read never interleave. Clones share the
/// same state.
#[derive(Clone)]
pub struct SimulationSession {
    inner: Arc<Mutex<SessionInner>>,
    clock: Arc<dyn Clock>,
    scheduler: MoveScheduler,
    updates: broadcast::Sender<GameSnapshot>,
}

impl SimulationSession {
    pub fn new(settings: EngineSettings, clock: Arc<dyn Clock>) -> Result<Self, EngineError> {
        let rng = match settings.seed {
            Some(seed) => SessionRng::new(seed),
            None => SessionRng::from_random(),
        };
        let game_state = GameState::new(settings, clock.now_ms())?;
        let scheduler = MoveScheduler::for_state(&game_state);
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        log!(
            "Simulation created: board {}x{}, seed {}, min move interval {}ms",
            game_state.settings().board_width,
            game_state.settings().board_height,
            rng.seed(),
            scheduler.min_move_interval_ms()
        );

        Ok(Self {
            inner: Arc::new(Mutex::new(SessionInner { game_state, rng })),
            clock,
            scheduler,
            updates,
        })
    }

    /// Receives a snapshot after every change to the state.
    pub fn subscribe(&self) -> broadcast::Receiver<GameSnapshot> {
        self.updates.subscribe()
    }

    /// Adds `count` pending moves and returns the new total.
    pub async fn enqueue_move(&self, count: u64) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.game_state.enqueue_moves(count)
    }

    pub async fn pending_moves(&self) -> u64 {
        self.inner.lock().await.game_state.pending_moves()
    }

    /// Snapshots and publishes only when the tick changed the state.
    pub async fn tick(&self) -> TickOutcome {
        let (outcome, changed) = {
            let mut inner = self.inner.lock().await;
            let outcome = self.tick_locked(&mut inner);
            let changed = outcome
                .changed_state()
                .then(|| inner.game_state.snapshot());
            (outcome, changed)
        };

        if let Some(snapshot) = changed {
            self.publish(snapshot);
        }
        outcome
    }

    /// One scheduler evaluation on demand; rate limit and pending count still
    /// apply. Returns the state after the evaluation.
    pub async fn force_update(&self) -> GameSnapshot {
        let (outcome, snapshot) = {
            let mut inner = self.inner.lock().await;
            let outcome = self.tick_locked(&mut inner);
            (outcome, inner.game_state.snapshot())
        };

        if outcome.changed_state() {
            self.publish(snapshot.clone());
        }
        snapshot
    }

    fn tick_locked(&self, inner: &mut SessionInner) -> TickOutcome {
        let now = self.clock.now_ms();
        let SessionInner { game_state, rng } = inner;
        self.scheduler.tick(game_state, now, rng)
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.inner.lock().await.game_state.snapshot()
    }

    pub async fn restore(&self, snapshot: &GameSnapshot) -> Result<GameSnapshot, EngineError> {
        let restored = {
            let mut inner = self.inner.lock().await;
            inner.game_state.restore(snapshot, self.clock.now_ms())?;
            inner.game_state.snapshot()
        };
        self.publish(restored.clone());
        Ok(restored)
    }

    pub async fn remote_control(&self, action: RemoteAction) -> GameSnapshot {
        let snapshot = {
            let mut inner = self.inner.lock().await;
            let now = self.clock.now_ms();
            let SessionInner { game_state, rng } = &mut *inner;
            game_state.apply_remote_action(action, now, rng);
            game_state.snapshot()
        };
        self.publish(snapshot.clone());
        snapshot
    }

    /// Scheduler loop; returns once the tick source is exhausted.
    pub async fn run<T: TickSource>(&self, mut ticks: T) {
        while ticks.next_tick().await {
            self.tick().await;
        }
        log!("Simulation loop stopped");
    }

    fn publish(&self, snapshot: GameSnapshot) {
        // No subscribers is not an error.
        let _ = self.updates.send(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelTickSource;
    use crate::games::snake::GridPosition;
    use crate::games::ManualClock;

    const START: i64 = 10_000;

    fn create_session() -> (SimulationSession, ManualClock) {
        let clock = ManualClock::new(START);
        let settings = EngineSettings {
            seed: Some(17),
            ..EngineSettings::default()
        };
        let session = SimulationSession::new(settings, Arc::new(clock.clone())).unwrap();
        (session, clock)
    }

    #[test]
    fn test_invalid_settings_prevent_start() {
        let settings = EngineSettings {
            max_moves_per_second: 0,
            ..EngineSettings::default()
        };
        let result = SimulationSession::new(settings, Arc::new(ManualClock::new(0)));
        assert!(matches!(result, Err(EngineError::InvalidSettings(_))));
    }

    #[tokio::test]
    async fn test_enqueue_then_tick_moves_once() {
        let (session, clock) = create_session();
        assert_eq!(session.enqueue_move(3).await, 3);

        clock.advance(1_000);
        assert!(session.tick().await.changed_state());
        assert_eq!(session.tick().await, TickOutcome::Idle);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.pending_moves, 2);
        assert_eq!(snapshot.snake[0], GridPosition::new(21, 15));
    }

    #[tokio::test]
    async fn test_force_update_respects_rate_limit() {
        let (session, clock) = create_session();
        session.enqueue_move(1).await;

        let snapshot = session.force_update().await;
        assert_eq!(snapshot.pending_moves, 1);

        clock.advance(1_000);
        let snapshot = session.force_update().await;
        assert_eq!(snapshot.pending_moves, 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_changes_only() {
        let (session, clock) = create_session();
        let mut updates = session.subscribe();

        session.tick().await;
        assert!(updates.try_recv().is_err());

        session.enqueue_move(1).await;
        clock.advance(1_000);
        session.tick().await;
        let update = updates.try_recv().unwrap();
        assert_eq!(update.pending_moves, 0);
    }

    #[tokio::test]
    async fn test_remote_shrink_and_suicide() {
        let (session, _) = create_session();

        let snapshot = session.remote_control(RemoteAction::Shrink).await;
        assert_eq!(snapshot.deaths, 1);
        assert_eq!(snapshot.snake.len(), 1);

        let snapshot = session.remote_control(RemoteAction::Suicide).await;
        assert_eq!(snapshot.deaths, 2);
        assert_eq!(snapshot.snake, vec![GridPosition::new(20, 15)]);
    }

    #[tokio::test]
    async fn test_restore_rejection_keeps_state() {
        let (session, _) = create_session();
        let before = session.snapshot().await;
        let mut bad = before.clone();
        bad.snake.clear();

        assert!(session.restore(&bad).await.is_err());
        assert_eq!(session.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_force_update_when_idle_returns_state_without_publishing() {
        let (session, _) = create_session();
        let mut updates = session.subscribe();
        session.enqueue_move(1).await;
        let before = session.snapshot().await;

        assert_eq!(session.force_update().await, before);
        assert!(updates.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_restore_from_the_future_still_moves() {
        let (session, clock) = create_session();
        let mut snapshot = session.snapshot().await;
        snapshot.last_move_time = i64::MAX;
        snapshot.pending_moves = 5;

        let restored = session.restore(&snapshot).await.unwrap();
        assert_eq!(restored.last_move_time, START);

        for _ in 0..5 {
            clock.advance(1_000);
            assert!(session.tick().await.changed_state());
        }
        assert_eq!(session.pending_moves().await, 0);
    }

    struct SteppingTicks {
        clock: ManualClock,
        remaining: u32,
    }

    impl TickSource for SteppingTicks {
        async fn next_tick(&mut self) -> bool {
            if self.remaining == 0 {
                return false;
            }
            self.remaining -= 1;
            self.clock.advance(1_000);
            true
        }
    }

    #[tokio::test]
    async fn test_run_consumes_one_move_per_tick() {
        let (session, clock) = create_session();
        session.enqueue_move(5).await;

        session.run(SteppingTicks { clock, remaining: 3 }).await;

        assert_eq!(session.pending_moves().await, 2);
    }

    #[tokio::test]
    async fn test_run_stops_when_channel_closes() {
        let (session, clock) = create_session();
        session.enqueue_move(5).await;
        let (sender, ticks) = ChannelTickSource::new(16);

        clock.advance(1_000);
        sender.send(()).await.unwrap();
        sender.send(()).await.unwrap();
        drop(sender);
        session.run(ticks).await;

        // Both ticks land in the same millisecond; the second is rate limited.
        assert_eq!(session.pending_moves().await, 4);
    }
}
