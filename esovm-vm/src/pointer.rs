//! # 2D Pointer
//!
//! Position plus direction on a grid whose y axis points down, as used by the
//! grid and geometric machines. "Clockwise" is clockwise on screen:
//! right, down, left, up.

use serde::Serialize;
use std::fmt;

/// One of the four axis-aligned directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    /// All directions in clockwise order starting at Right
    pub const ALL: [Direction; 4] = [Direction::Right, Direction::Down, Direction::Left, Direction::Up];

    pub fn delta(&self) -> (i64, i64) {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
        }
    }

    pub fn from_delta(dx: i64, dy: i64) -> Option<Self> {
        match (dx, dy) {
            (1, 0) => Some(Direction::Right),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (0, -1) => Some(Direction::Up),
            _ => None,
        }
    }

    fn index(&self) -> i64 {
        match self {
            Direction::Right => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Up => 3,
        }
    }

    /// Rotate clockwise by `steps` quarter turns; negative steps turn
    /// counter-clockwise
    pub fn rotated(&self, steps: i64) -> Self {
        Self::ALL[(self.index() + steps).rem_euclid(4) as usize]
    }

    pub fn clockwise(&self) -> Self {
        self.rotated(1)
    }

    pub fn counter_clockwise(&self) -> Self {
        self.rotated(-1)
    }

    pub fn reversed(&self) -> Self {
        self.rotated(2)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Up => "up",
        };
        f.write_str(name)
    }
}

/// A position and a direction vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Pointer2D {
    pub x: i64,
    pub y: i64,
    pub dx: i64,
    pub dy: i64,
}

impl Default for Pointer2D {
    fn default() -> Self {
        Self::new(0, 0, Direction::Right)
    }
}

impl Pointer2D {
    pub fn new(x: i64, y: i64, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self { x, y, dx, dy }
    }

    pub fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    /// The direction, if the delta is a unit axis vector
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_delta(self.dx, self.dy)
    }

    pub fn set_direction(&mut self, direction: Direction) {
        let (dx, dy) = direction.delta();
        self.dx = dx;
        self.dy = dy;
    }

    pub fn set_delta(&mut self, dx: i64, dy: i64) {
        self.dx = dx;
        self.dy = dy;
    }

    /// Position one step ahead, without moving. None if the step leaves
    /// the addressable plane.
    pub fn next(&self) -> Option<(i64, i64)> {
        Some((self.x.checked_add(self.dx)?, self.y.checked_add(self.dy)?))
    }

    /// Take one step. Returns false, leaving the pointer in place, if the
    /// step would overflow.
    pub fn advance(&mut self) -> bool {
        match self.next() {
            Some((x, y)) => {
                self.x = x;
                self.y = y;
                true
            }
            None => false,
        }
    }

    pub fn move_to(&mut self, x: i64, y: i64) {
        self.x = x;
        self.y = y;
    }

    /// Quarter turn clockwise on screen
    pub fn rotate_clockwise(&mut self) {
        let (dx, dy) = (self.dx, self.dy);
        self.dx = dy.wrapping_neg();
        self.dy = dx;
    }

    /// Quarter turn counter-clockwise on screen
    pub fn rotate_counter_clockwise(&mut self) {
        let (dx, dy) = (self.dx, self.dy);
        self.dx = dy;
        self.dy = dx.wrapping_neg();
    }

    /// Reverse the direction
    pub fn reflect(&mut self) {
        self.dx = self.dx.wrapping_neg();
        self.dy = self.dy.wrapping_neg();
    }

    /// Whether `(x, y)` lies inside a grid whose row `y` is `width(y)` wide
    /// and which has `height` rows
    pub fn in_bounds<F>(x: i64, y: i64, height: usize, width: F) -> bool
    where
        F: Fn(usize) -> usize,
    {
        y >= 0 && (y as usize) < height && x >= 0 && (x as usize) < width(y as usize)
    }
}

impl fmt::Display for Pointer2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) -> ({}, {})", self.x, self.y, self.dx, self.dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_rotation() {
        assert_eq!(Direction::Right.clockwise(), Direction::Down);
        assert_eq!(Direction::Up.clockwise(), Direction::Right);
        assert_eq!(Direction::Right.counter_clockwise(), Direction::Up);
        assert_eq!(Direction::Left.rotated(-5), Direction::Down);
        assert_eq!(Direction::Down.reversed(), Direction::Up);
    }

    #[test]
    fn test_pointer_rotation_matches_direction() {
        let mut p = Pointer2D::new(0, 0, Direction::Right);
        for expected in [Direction::Down, Direction::Left, Direction::Up, Direction::Right] {
            p.rotate_clockwise();
            assert_eq!(p.direction(), Some(expected));
        }
        p.rotate_counter_clockwise();
        assert_eq!(p.direction(), Some(Direction::Up));
    }

    #[test]
    fn test_next_and_advance() {
        let mut p = Pointer2D::new(2, 3, Direction::Left);
        assert_eq!(p.next(), Some((1, 3)));
        assert!(p.advance());
        assert_eq!(p.position(), (1, 3));
        p.reflect();
        assert_eq!(p.direction(), Some(Direction::Right));
    }

    #[test]
    fn test_extreme_delta_does_not_overflow() {
        let mut p = Pointer2D::new(5, 0, Direction::Right);
        p.set_delta(i64::MAX, 0);
        assert_eq!(p.next(), None);
        assert!(!p.advance());
        assert_eq!(p.position(), (5, 0));

        p.set_delta(i64::MIN, i64::MIN);
        p.reflect();
        assert_eq!((p.dx, p.dy), (i64::MIN, i64::MIN));
        p.rotate_clockwise();
        p.rotate_counter_clockwise();
        assert_eq!((p.dx, p.dy), (i64::MIN, i64::MIN));
    }

    #[test]
    fn test_in_bounds_ragged() {
        let widths = [3usize, 1];
        let width = |row: usize| widths[row];
        assert!(Pointer2D::in_bounds(2, 0, 2, width));
        assert!(!Pointer2D::in_bounds(2, 1, 2, width));
        assert!(!Pointer2D::in_bounds(0, 2, 2, width));
        assert!(!Pointer2D::in_bounds(-1, 0, 2, width));
    }
}
