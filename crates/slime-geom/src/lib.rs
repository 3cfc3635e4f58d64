//! Minimal 2-D grid types shared by the search, io and render crates.
#![forbid(unsafe_code)]

mod position;

pub use position::{ParsePositionError, Position, CHUNK_WIDTH};

use core::ops::{Add, Sub};

/// Integer coordinate on the x/z plane. Used both for chunk coordinates and
/// for block offsets inside a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Point {
    pub x: i32,
    pub z: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Point `count` steps away in direction `dir`.
    #[inline]
    pub fn step(self, dir: Direction, count: i32) -> Point {
        Point::new(self.x + count * dir.dx(), self.z + count * dir.dz())
    }

    #[inline]
    pub fn distance_sq(self, other: Point) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dz = i64::from(self.z - other.z);
        dx * dx + dz * dz
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl From<(i32, i32)> for Point {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<Point> for (i32, i32) {
    fn from(value: Point) -> Self {
        (value.x, value.z)
    }
}

impl core::fmt::Display for Point {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

/// The four cardinal directions. South is +z, east is +x.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    East,
    South,
    West,
    North,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::North,
    ];

    #[inline]
    pub const fn dx(self) -> i32 {
        match self {
            Direction::East => 1,
            Direction::West => -1,
            Direction::South | Direction::North => 0,
        }
    }

    #[inline]
    pub const fn dz(self) -> i32 {
        match self {
            Direction::South => 1,
            Direction::North => -1,
            Direction::East | Direction::West => 0,
        }
    }

    /// Quarter turn clockwise when looking down on the x/z plane.
    #[inline]
    pub const fn clockwise(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Direction of a single cardinal step from `from` to `to`, or `None` if
    /// the points are not edge-adjacent.
    #[inline]
    pub fn between(from: Point, to: Point) -> Option<Direction> {
        match (to.x - from.x, to.z - from.z) {
            (1, 0) => Some(Direction::East),
            (-1, 0) => Some(Direction::West),
            (0, 1) => Some(Direction::South),
            (0, -1) => Some(Direction::North),
            _ => None,
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::North => "north",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clockwise_cycles_through_all_directions() {
        let mut dir = Direction::North;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(dir);
            dir = dir.clockwise();
        }
        assert_eq!(dir, Direction::North);
        assert_eq!(
            seen,
            vec![
                Direction::North,
                Direction::East,
                Direction::South,
                Direction::West
            ]
        );
    }

    proptest! {
        #[test]
        fn step_then_opposite_is_identity(
            x in -1_000_000i32..1_000_000,
            z in -1_000_000i32..1_000_000,
            n in -1000i32..1000,
        ) {
            let p = Point::new(x, z);
            for dir in Direction::ALL {
                prop_assert_eq!(p.step(dir, n).step(dir.opposite(), n), p);
            }
        }

        #[test]
        fn between_recovers_unit_steps(p: Point) {
            let p = Point::new(p.x / 2, p.z / 2);
            for dir in Direction::ALL {
                prop_assert_eq!(Direction::between(p, p.step(dir, 1)), Some(dir));
            }
            prop_assert_eq!(Direction::between(p, p), None);
        }
    }
}
