use std::fmt;

pub const ROOM_CODE_LENGTH: usize = 5;

/// Five character room identifier shared out of band between the two players.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(String);

impl RoomCode {
    /// Accepts exactly [`ROOM_CODE_LENGTH`] non-whitespace characters.
    pub fn parse(code: &str) -> Option<Self> {
        let valid = code.chars().count() == ROOM_CODE_LENGTH
            && code.chars().all(|c| !c.is_whitespace() && !c.is_control());
        valid.then(|| Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    PlayerOne,
    PlayerTwo,
}

impl PlayerSlot {
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::PlayerOne, PlayerSlot::PlayerTwo];

    pub fn other(self) -> PlayerSlot {
        match self {
            PlayerSlot::PlayerOne => PlayerSlot::PlayerTwo,
            PlayerSlot::PlayerTwo => PlayerSlot::PlayerOne,
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlayerSlot::PlayerOne => 0,
            PlayerSlot::PlayerTwo => 1,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerSlot::PlayerOne => write!(f, "p1"),
            PlayerSlot::PlayerTwo => write!(f, "p2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_requires_five_characters() {
        assert!(RoomCode::parse("12345").is_some());
        assert!(RoomCode::parse("ab3Z9").is_some());
        assert!(RoomCode::parse("1234").is_none());
        assert!(RoomCode::parse("123456").is_none());
        assert!(RoomCode::parse("12 45").is_none());
        assert!(RoomCode::parse("").is_none());
    }

    #[test]
    fn test_player_slot_other() {
        assert_eq!(PlayerSlot::PlayerOne.other(), PlayerSlot::PlayerTwo);
        assert_eq!(PlayerSlot::PlayerTwo.other(), PlayerSlot::PlayerOne);
        assert_eq!(PlayerSlot::PlayerTwo.to_string(), "p2");
    }
}
