use std::collections::HashSet;

use crate::games::SessionRng;
use super::settings::MapType;
use super::types::{FieldSize, Point};

/// Cells with |dx| < 3 and |dy| < 3 from the field center never receive generated walls.
pub const SAFE_ZONE_HALF_EXTENT: i32 = 3;
/// Radius of the post-generation sweep around the spawn point.
pub const SPAWN_CLEARANCE: i32 = 4;

const MAZE_STRIDE: usize = 4;
const MAZE_MARGIN: i32 = 4;
const OBSTACLE_PERCENT: usize = 5;

pub struct MapGenerator;

impl MapGenerator {
    pub fn generate(map_type: MapType, field: &FieldSize, rng: &mut SessionRng) -> HashSet<Point> {
        match map_type {
            MapType::Box | MapType::Infinite => HashSet::new(),
            MapType::Maze => Self::maze(field),
            MapType::Obstacles => Self::scattered(field, rng),
        }
    }

    pub fn in_safe_zone(point: Point, field: &FieldSize) -> bool {
        let center = field.center();
        (point.x - center.x).abs() < SAFE_ZONE_HALF_EXTENT
            && (point.y - center.y).abs() < SAFE_ZONE_HALF_EXTENT
    }

    /// Removes every obstacle within [`SPAWN_CLEARANCE`] of the center on both axes.
    pub fn clear_spawn_area(obstacles: &mut HashSet<Point>, field: &FieldSize) {
        let center = field.center();
        obstacles.retain(|o| {
            (o.x - center.x).abs() > SPAWN_CLEARANCE || (o.y - center.y).abs() > SPAWN_CLEARANCE
        });
    }

    fn maze(field: &FieldSize) -> HashSet<Point> {
        let mut walls = HashSet::new();
        for x in (MAZE_MARGIN..field.width - MAZE_MARGIN).step_by(MAZE_STRIDE) {
            for y in MAZE_MARGIN..field.height - MAZE_MARGIN {
                let point = Point::new(x, y);
                if !Self::in_safe_zone(point, field) {
                    walls.insert(point);
                }
            }
        }
        walls
    }

    /// Duplicate samples collapse, so the final density can land slightly under the target.
    fn scattered(field: &FieldSize, rng: &mut SessionRng) -> HashSet<Point> {
        let attempts = field.cell_count() * OBSTACLE_PERCENT / 100;
        let mut blocks = HashSet::with_capacity(attempts);
        for _ in 0..attempts {
            let point = Point::new(
                rng.random_range(0..field.width),
                rng.random_range(0..field.height),
            );
            if !Self::in_safe_zone(point, field) {
                blocks.insert(point);
            }
        }
        blocks
    }
}
