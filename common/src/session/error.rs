use std::fmt;

use crate::multiplayer::ChannelError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Settings changes and new starts are refused while a session is running.
    SessionActive,
    NotInRoom,
    /// Room rules are fixed by the host; only the theme may change until the room is left.
    InRoom,
    Channel(ChannelError),
    Storage(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::SessionActive => write!(f, "A session is already running"),
            SessionError::NotInRoom => write!(f, "Not in a multiplayer room"),
            SessionError::InRoom => write!(f, "Room settings can't be changed while in a room"),
            SessionError::Channel(e) => write!(f, "Multiplayer error: {}", e),
            SessionError::Storage(e) => write!(f, "Score storage error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Channel(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChannelError> for SessionError {
    fn from(e: ChannelError) -> Self {
        SessionError::Channel(e)
    }
}
