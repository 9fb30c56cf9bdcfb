mod direction_policy;
mod food;
mod game_state;
mod remote;
mod scheduler;
mod settings;
mod snake;
mod snapshot;
mod types;

pub use direction_policy::{DirectionPolicy, DirectionPolicyMode};
pub use food::{FoodManager, FoodSet};
pub use game_state::{AdvanceOutcome, GameState, StepOutcome};
pub use remote::RemoteAction;
pub use scheduler::{MoveScheduler, TickOutcome};
pub use settings::{EngineSettings, MAX_COLLISION_SKIP_SEGMENTS};
pub use snake::Snake;
pub use snapshot::GameSnapshot;
pub use types::{BoardSize, Direction, DirectionCounters, DirectionVector, GridPosition};
