use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Drives the scheduler loop. Resolves to `false` when no more ticks will come.
pub trait TickSource: Send {
    fn next_tick(&mut self) -> impl Future<Output = bool> + Send;
}

/// Fixed wall-clock cadence. Must be created inside a tokio runtime.
pub struct IntervalTickSource {
    interval: Interval,
}

impl IntervalTickSource {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl TickSource for IntervalTickSource {
    async fn next_tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// One tick per message; ends when every sender is dropped.
pub struct ChannelTickSource {
    receiver: mpsc::Receiver<()>,
}

impl ChannelTickSource {
    pub fn new(capacity: usize) -> (mpsc::Sender<()>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self { receiver })
    }
}

impl TickSource for ChannelTickSource {
    async fn next_tick(&mut self) -> bool {
        self.receiver.recv().await.is_some()
    }
}
