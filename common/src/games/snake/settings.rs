use serde::{Deserialize, Serialize};

use super::types::FieldSize;

/// Declares a closed option list that menus step through with `next`/`previous`, wrapping at both ends.
macro_rules! option_list {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn index(self) -> usize {
                self as usize
            }

            pub fn from_index(index: usize) -> Option<Self> {
                Self::ALL.get(index).copied()
            }

            pub fn next(self) -> Self {
                Self::ALL[(self.index() + 1) % Self::ALL.len()]
            }

            pub fn previous(self) -> Self {
                Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
            }
        }
    };
}

option_list!(
    /// Cosmetic palette, only carried through to the render snapshot.
    Theme {
        Neon => "NEON",
        Classic => "CLASSIC",
        Minimal => "MINIMAL",
        BioHazard => "BIO-HAZARD",
        Matrix => "MATRIX",
        Sunset => "SUNSET",
        Candy => "CANDY",
        Gameboy => "GAMEBOY",
        Ocean => "OCEAN",
        Hell => "HELL",
        Forest => "FOREST",
        Void => "VOID",
        Space => "SPACE",
    }
);

option_list!(Mode {
    Classic => "CLASSIC",
    Speed => "SPEED",
    Survival => "SURVIVAL",
    Campaign => "CAMPAIGN",
    Portal => "PORTAL",
    Poison => "POISON",
});

option_list!(MapType {
    Box => "BOX",
    Infinite => "INFINITE",
    Maze => "MAZE",
    Obstacles => "OBSTACLES",
});

option_list!(Difficulty {
    Easy => "EASY",
    Medium => "MEDIUM",
    Hard => "HARD",
    Extreme => "EXTREME",
});

option_list!(GridSize {
    Size10 => "10x10",
    Size15 => "15x15",
    Size20 => "20x20",
    Size25 => "25x25",
    Size30 => "30x30",
    Size40 => "40x40",
});

option_list!(TimeLimit {
    Unbounded => "∞",
    OneMinute => "1 MIN",
    TwoMinutes => "2 MIN",
    ThreeMinutes => "3 MIN",
    FiveMinutes => "5 MIN",
});

impl GridSize {
    pub fn field_size(self) -> FieldSize {
        let side = match self {
            GridSize::Size10 => 10,
            GridSize::Size15 => 15,
            GridSize::Size20 => 20,
            GridSize::Size25 => 25,
            GridSize::Size30 => 30,
            GridSize::Size40 => 40,
        };
        FieldSize::new(side, side)
    }
}

impl TimeLimit {
    /// `None` for an unbounded session.
    pub fn seconds(self) -> Option<u32> {
        match self {
            TimeLimit::Unbounded => None,
            TimeLimit::OneMinute => Some(60),
            TimeLimit::TwoMinutes => Some(120),
            TimeLimit::ThreeMinutes => Some(180),
            TimeLimit::FiveMinutes => Some(300),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKind {
    Theme,
    Mode,
    Map,
    Difficulty,
    TimeLimit,
    GridSize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    pub mode: Mode,
    pub map: MapType,
    pub difficulty: Difficulty,
    pub time_limit: TimeLimit,
    pub grid_size: GridSize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Neon,
            mode: Mode::Classic,
            map: MapType::Box,
            difficulty: Difficulty::Medium,
            time_limit: TimeLimit::Unbounded,
            grid_size: GridSize::Size25,
        }
    }
}

impl Settings {
    pub fn advance(&mut self, kind: SettingKind) {
        match kind {
            SettingKind::Theme => self.theme = self.theme.next(),
            SettingKind::Mode => self.mode = self.mode.next(),
            SettingKind::Map => self.map = self.map.next(),
            SettingKind::Difficulty => self.difficulty = self.difficulty.next(),
            SettingKind::TimeLimit => self.time_limit = self.time_limit.next(),
            SettingKind::GridSize => self.grid_size = self.grid_size.next(),
        }
    }

    pub fn retreat(&mut self, kind: SettingKind) {
        match kind {
            SettingKind::Theme => self.theme = self.theme.previous(),
            SettingKind::Mode => self.mode = self.mode.previous(),
            SettingKind::Map => self.map = self.map.previous(),
            SettingKind::Difficulty => self.difficulty = self.difficulty.previous(),
            SettingKind::TimeLimit => self.time_limit = self.time_limit.previous(),
            SettingKind::GridSize => self.grid_size = self.grid_size.previous(),
        }
    }

    pub fn field_size(&self) -> FieldSize {
        self.grid_size.field_size()
    }

    /// Leaderboard tag, e.g. `MEDIUM - 20x20`.
    pub fn leaderboard_details(&self) -> String {
        format!("{} - {}", self.difficulty.label(), self.grid_size.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_lists_wrap_at_both_ends() {
        assert_eq!(Mode::Poison.next(), Mode::Classic);
        assert_eq!(Mode::Classic.previous(), Mode::Poison);
        assert_eq!(Theme::Space.next(), Theme::Neon);
        assert_eq!(GridSize::Size10.previous(), GridSize::Size40);
        assert_eq!(Difficulty::Hard.next(), Difficulty::Extreme);
    }

    #[test]
    fn test_advance_and_retreat_touch_only_one_option() {
        let mut settings = Settings::default();
        settings.advance(SettingKind::Map);
        assert_eq!(settings.map, MapType::Infinite);
        assert_eq!(settings.mode, Mode::Classic);

        settings.retreat(SettingKind::TimeLimit);
        assert_eq!(settings.time_limit, TimeLimit::FiveMinutes);
        settings.advance(SettingKind::TimeLimit);
        assert_eq!(settings.time_limit, TimeLimit::Unbounded);
    }

    #[test]
    fn test_index_round_trips_through_from_index() {
        for mode in Mode::ALL {
            assert_eq!(Mode::from_index(mode.index()), Some(*mode));
        }
        assert_eq!(Difficulty::from_index(4), None);
    }

    #[test]
    fn test_leaderboard_details_label() {
        let settings = Settings {
            grid_size: GridSize::Size20,
            ..Settings::default()
        };
        assert_eq!(settings.leaderboard_details(), "MEDIUM - 20x20");
    }

    #[test]
    fn test_time_limit_seconds() {
        assert_eq!(TimeLimit::Unbounded.seconds(), None);
        assert_eq!(TimeLimit::TwoMinutes.seconds(), Some(120));
    }
}
