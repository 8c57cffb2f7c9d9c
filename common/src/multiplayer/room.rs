use serde::{Deserialize, Serialize};

use crate::games::snake::{Difficulty, GridSize, MapType, Mode, Point, Settings, TimeLimit};

/// The part of [`Settings`] the room creator imposes on the joiner. Theme stays local.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub mode: Mode,
    pub map: MapType,
    pub difficulty: Difficulty,
    pub grid_size: GridSize,
    pub time_limit: TimeLimit,
}

impl RoomSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            mode: settings.mode,
            map: settings.map,
            difficulty: settings.difficulty,
            grid_size: settings.grid_size,
            time_limit: settings.time_limit,
        }
    }

    pub fn apply_to(&self, settings: &mut Settings) {
        settings.mode = self.mode;
        settings.map = self.map;
        settings.difficulty = self.difficulty;
        settings.grid_size = self.grid_size;
        settings.time_limit = self.time_limit;
    }
}

/// What one player publishes about itself after every tick.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub segments: Vec<Point>,
    pub score: u32,
    pub active: bool,
}

impl PlayerSnapshot {
    /// Written into a slot when it is claimed, before the first tick.
    pub fn joined() -> Self {
        Self {
            segments: Vec::new(),
            score: 0,
            active: true,
        }
    }
}

/// Read-only mirror of the peer's last published snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteOpponentView {
    pub segments: Vec<Point>,
    pub score: u32,
    pub active: bool,
}

impl From<Option<&PlayerSnapshot>> for RemoteOpponentView {
    fn from(snapshot: Option<&PlayerSnapshot>) -> Self {
        match snapshot {
            Some(snapshot) => Self {
                segments: snapshot.segments.clone(),
                score: snapshot.score,
                active: snapshot.active,
            },
            None => Self::default(),
        }
    }
}
