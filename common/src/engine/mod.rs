mod simulation_session;
mod tick_source;

pub use simulation_session::SimulationSession;
pub use tick_source::{ChannelTickSource, IntervalTickSource, TickSource};
