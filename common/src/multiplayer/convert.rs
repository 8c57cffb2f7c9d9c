use crate::games::snake::{Difficulty, GridSize, MapType, Mode, Point, TimeLimit};
use crate::{PlayerSlot, RoomCode, proto};
use super::channel::ChannelError;
use super::room::{PlayerSnapshot, RoomSettings};

impl From<PlayerSlot> for proto::PlayerSlot {
    fn from(slot: PlayerSlot) -> Self {
        match slot {
            PlayerSlot::PlayerOne => proto::PlayerSlot::PlayerOne,
            PlayerSlot::PlayerTwo => proto::PlayerSlot::PlayerTwo,
        }
    }
}

pub fn slot_to_proto(slot: PlayerSlot) -> i32 {
    proto::PlayerSlot::from(slot) as i32
}

pub fn slot_from_proto(value: i32) -> Option<PlayerSlot> {
    match proto::PlayerSlot::try_from(value).ok()? {
        proto::PlayerSlot::PlayerOne => Some(PlayerSlot::PlayerOne),
        proto::PlayerSlot::PlayerTwo => Some(PlayerSlot::PlayerTwo),
        proto::PlayerSlot::Unspecified => None,
    }
}

impl From<RoomSettings> for proto::RoomSettings {
    fn from(settings: RoomSettings) -> Self {
        proto::RoomSettings {
            mode: settings.mode.index() as u32,
            map: settings.map.index() as u32,
            difficulty: settings.difficulty.index() as u32,
            grid_size: settings.grid_size.index() as u32,
            time_limit: settings.time_limit.index() as u32,
        }
    }
}

/// `None` when any index is outside its option list.
pub fn settings_from_proto(settings: &proto::RoomSettings) -> Option<RoomSettings> {
    Some(RoomSettings {
        mode: Mode::from_index(settings.mode as usize)?,
        map: MapType::from_index(settings.map as usize)?,
        difficulty: Difficulty::from_index(settings.difficulty as usize)?,
        grid_size: GridSize::from_index(settings.grid_size as usize)?,
        time_limit: TimeLimit::from_index(settings.time_limit as usize)?,
    })
}

impl From<&PlayerSnapshot> for proto::PlayerSnapshot {
    fn from(snapshot: &PlayerSnapshot) -> Self {
        proto::PlayerSnapshot {
            segments: snapshot
                .segments
                .iter()
                .map(|p| proto::GridPosition { x: p.x, y: p.y })
                .collect(),
            score: snapshot.score,
            active: snapshot.active,
        }
    }
}

impl From<proto::PlayerSnapshot> for PlayerSnapshot {
    fn from(snapshot: proto::PlayerSnapshot) -> Self {
        PlayerSnapshot {
            segments: snapshot.segments.iter().map(|p| Point::new(p.x, p.y)).collect(),
            score: snapshot.score,
            active: snapshot.active,
        }
    }
}

impl From<&ChannelError> for proto::RoomError {
    fn from(error: &ChannelError) -> Self {
        let code = match error {
            ChannelError::InvalidRoomCode(_) => proto::RoomErrorCode::InvalidCode,
            ChannelError::RoomAlreadyExists(_) => proto::RoomErrorCode::AlreadyExists,
            ChannelError::RoomNotFound(_) => proto::RoomErrorCode::NotFound,
            ChannelError::RoomFull(_) => proto::RoomErrorCode::Full,
            ChannelError::Unavailable(_) => proto::RoomErrorCode::Unavailable,
        };
        proto::RoomError {
            code: code.into(),
            message: error.to_string(),
        }
    }
}

/// Rebuilds the typed error. `code` is the room the failed request was about.
pub fn error_from_proto(error: &proto::RoomError, code: &str) -> ChannelError {
    let room = RoomCode::parse(code);
    match (error.code(), room) {
        (proto::RoomErrorCode::AlreadyExists, Some(room)) => ChannelError::RoomAlreadyExists(room),
        (proto::RoomErrorCode::NotFound, Some(room)) => ChannelError::RoomNotFound(room),
        (proto::RoomErrorCode::Full, Some(room)) => ChannelError::RoomFull(room),
        (proto::RoomErrorCode::InvalidCode, _) => ChannelError::InvalidRoomCode(code.to_string()),
        _ => ChannelError::Unavailable(error.message.clone()),
    }
}
