use std::collections::HashSet;

use crate::games::SessionRng;
use crate::log_warn;
use super::types::{FieldSize, Point};

pub struct RandomPlacement;

impl RandomPlacement {
    /// Rejection-samples uniform cells until one falls outside `excluded`.
    ///
    /// There is no retry cap: on a nearly full field this can spin for a long
    /// time. A completely full field is detected up front and yields `None`.
    pub fn place(excluded: &HashSet<Point>, field: &FieldSize, rng: &mut SessionRng) -> Option<Point> {
        let blocked = excluded.iter().filter(|p| field.contains(**p)).count();
        if blocked >= field.cell_count() {
            log_warn!(
                "No free cell left on {}x{} field ({} blocked)",
                field.width,
                field.height,
                blocked
            );
            return None;
        }

        loop {
            let candidate = Point::new(
                rng.random_range(0..field.width),
                rng.random_range(0..field.height),
            );
            if !excluded.contains(&candidate) {
                return Some(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_returns_excluded_cell_at_half_occupancy() {
        let field = FieldSize::new(20, 20);
        let mut rng = SessionRng::new(42);
        let excluded: HashSet<Point> = (0..field.width)
            .flat_map(|x| (0..field.height).map(move |y| Point::new(x, y)))
            .filter(|p| (p.x + p.y) % 2 == 0)
            .collect();
        assert_eq!(excluded.len(), field.cell_count() / 2);

        for _ in 0..10_000 {
            let placed = RandomPlacement::place(&excluded, &field, &mut rng).unwrap();
            assert!(field.contains(placed));
            assert!(!excluded.contains(&placed));
        }
    }

    #[test]
    fn test_finds_the_single_free_cell() {
        let field = FieldSize::new(4, 4);
        let mut rng = SessionRng::new(3);
        let free = Point::new(2, 1);
        let excluded: HashSet<Point> = (0..4)
            .flat_map(|x| (0..4).map(move |y| Point::new(x, y)))
            .filter(|p| *p != free)
            .collect();

        assert_eq!(RandomPlacement::place(&excluded, &field, &mut rng), Some(free));
    }

    #[test]
    fn test_full_field_yields_none() {
        let field = FieldSize::new(3, 3);
        let mut rng = SessionRng::new(1);
        let excluded: HashSet<Point> = (0..3)
            .flat_map(|x| (0..3).map(move |y| Point::new(x, y)))
            .collect();

        assert_eq!(RandomPlacement::place(&excluded, &field, &mut rng), None);
    }

    #[test]
    fn test_out_of_field_exclusions_do_not_count_as_blocking() {
        let field = FieldSize::new(1, 1);
        let mut rng = SessionRng::new(1);
        let excluded: HashSet<Point> = [Point::new(-1, 0), Point::new(1, 0)].into_iter().collect();

        assert_eq!(RandomPlacement::place(&excluded, &field, &mut rng), Some(Point::new(0, 0)));
    }
}
