mod clock;
mod controller;
mod error;
mod score_store;

pub use clock::{ClockEvent, ClockKind, SimulationClock};
pub use controller::{GameSession, RenderSnapshot, SessionController, SessionResult, format_remaining};
pub use error::SessionError;
pub use score_store::{
    FileScoreStore, InMemoryScoreStore, LEADERBOARD_CAPACITY, LeaderboardEntry, ScoreStore, StoredScores,
};
