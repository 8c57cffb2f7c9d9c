mod game_state;
mod map;
mod placement;
mod rules;
mod settings;
mod snake;
mod types;

pub use game_state::{SimulationStatus, SnakeGameState, SpawnPoint, TickOutcome};
pub use map::{MapGenerator, SAFE_ZONE_HALF_EXTENT, SPAWN_CLEARANCE};
pub use placement::RandomPlacement;
pub use rules::{
    CAMPAIGN_MILESTONE, GRACE_PERIOD_TICKS, MIN_TICK_INTERVAL_MS, POISON_PENALTY, RulePolicy,
    RuleTable,
};
pub use settings::{Difficulty, GridSize, MapType, Mode, SettingKind, Settings, Theme, TimeLimit};
pub use snake::{INITIAL_SNAKE_LENGTH, Snake};
pub use types::{DeathReason, Direction, FieldSize, Point};
