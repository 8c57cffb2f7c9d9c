use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Point {
        let (dx, dy) = direction.delta();
        Point::new(self.x + dx, self.y + dy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Unit vector in grid coordinates; y grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn is_opposite(&self, other: &Direction) -> bool {
        self.opposite() == *other
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSize {
    pub width: i32,
    pub height: i32,
}

impl FieldSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, point: Point) -> bool {
        (0..self.width).contains(&point.x) && (0..self.height).contains(&point.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2, self.height / 2)
    }

    pub fn cell_count(&self) -> usize {
        (self.width.max(0) * self.height.max(0)) as usize
    }

    /// Re-enters from the opposite edge when `point` left the field by one cell.
    pub fn wrap(&self, point: Point) -> Point {
        let x = if point.x < 0 {
            self.width - 1
        } else if point.x >= self.width {
            0
        } else {
            point.x
        };
        let y = if point.y < 0 {
            self.height - 1
        } else if point.y >= self.height {
            0
        } else {
            point.y
        };
        Point::new(x, y)
    }
}

/// Why a session stopped. Kept on the simulation as the last termination reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathReason {
    WallCollision,
    SelfCollision,
    ObstacleCollision,
    TimeExpired,
    Exited,
}

impl DeathReason {
    pub fn label(self) -> &'static str {
        match self {
            DeathReason::WallCollision => "Hit the wall",
            DeathReason::SelfCollision => "Bit itself",
            DeathReason::ObstacleCollision => "Hit an obstacle",
            DeathReason::TimeExpired => "Time is up",
            DeathReason::Exited => "Left the game",
        }
    }
}
