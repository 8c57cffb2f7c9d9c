use std::collections::VecDeque;

use super::types::{Direction, Point};

pub const INITIAL_SNAKE_LENGTH: usize = 3;

/// Segment sequence, head first. Never empty.
#[derive(Clone, Debug)]
pub struct Snake {
    pub body: VecDeque<Point>,
    pub direction: Direction,
    pub pending_direction: Option<Direction>,
}

impl Snake {
    /// Lays the body out behind `head`, opposite to `direction`.
    pub fn new(head: Point, direction: Direction) -> Self {
        let trailing = direction.opposite();
        let mut body = VecDeque::with_capacity(INITIAL_SNAKE_LENGTH);
        let mut segment = head;
        for _ in 0..INITIAL_SNAKE_LENGTH {
            body.push_back(segment);
            segment = segment.step(trailing);
        }

        Self {
            body,
            direction,
            pending_direction: Some(direction),
        }
    }

    pub fn head(&self) -> Point {
        *self.body.front().expect("Snake body should never be empty")
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn occupies(&self, point: Point) -> bool {
        self.body.contains(&point)
    }

    /// Buffers the next turn. A later call before the next tick overwrites it.
    pub fn buffer_direction(&mut self, direction: Direction) {
        self.pending_direction = Some(direction);
    }

    /// Applies the buffered turn unless it reverses the snake. The buffer is cleared either way.
    pub fn commit_direction(&mut self) {
        if let Some(next) = self.pending_direction.take()
            && !next.is_opposite(&self.direction)
        {
            self.direction = next;
        }
    }

    pub fn push_head(&mut self, head: Point) {
        self.body.push_front(head);
    }

    pub fn pop_tail(&mut self) -> Option<Point> {
        if self.body.len() <= 1 {
            return None;
        }
        self.body.pop_back()
    }

    /// Drops the last segment while the snake is longer than its spawn length.
    pub fn shrink(&mut self) -> bool {
        if self.body.len() > INITIAL_SNAKE_LENGTH {
            self.body.pop_back();
            true
        } else {
            false
        }
    }

    pub fn segments(&self) -> Vec<Point> {
        self.body.iter().copied().collect()
    }
}
