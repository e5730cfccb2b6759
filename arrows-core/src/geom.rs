//! Grid coordinates and compass directions.

use std::fmt;
use std::ops::{Add, Index, IndexMut, Sub};

/// A 0-based grid coordinate, row first, column second.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Point {
    pub row: i32,
    pub col: i32,
}

impl Point {
    #[inline]
    pub fn new(row: i32, col: i32) -> Point {
        Point { row, col }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A row/column displacement.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Delta {
    pub dr: i32,
    pub dc: i32,
}

impl Add<Delta> for Point {
    type Output = Point;

    #[inline]
    fn add(self, d: Delta) -> Point {
        Point::new(self.row + d.dr, self.col + d.dc)
    }
}

impl Sub<Point> for Point {
    type Output = Delta;

    #[inline]
    fn sub(self, other: Point) -> Delta {
        Delta { dr: self.row - other.row, dc: self.col - other.col }
    }
}

/// One of the eight compass directions a cell's arrow can point.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// The four directions usable in a non-diagonal puzzle.
    pub const CARDINAL: [Direction; 4] =
        [Direction::North, Direction::East, Direction::South, Direction::West];

    /// All eight directions usable in a diagonal puzzle.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The row/column delta of one step in this direction.
    #[inline]
    pub fn delta(self) -> Delta {
        match self {
            Direction::North => Delta { dr: -1, dc: 0 },
            Direction::NorthEast => Delta { dr: -1, dc: 1 },
            Direction::East => Delta { dr: 0, dc: 1 },
            Direction::SouthEast => Delta { dr: 1, dc: 1 },
            Direction::South => Delta { dr: 1, dc: 0 },
            Direction::SouthWest => Delta { dr: 1, dc: -1 },
            Direction::West => Delta { dr: 0, dc: -1 },
            Direction::NorthWest => Delta { dr: -1, dc: -1 },
        }
    }

    /// The opposite compass direction.
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }

    /// The Unicode arrow glyph used by the puzzle text format.
    #[inline]
    pub fn glyph(self) -> char {
        match self {
            Direction::North => '↑',
            Direction::NorthEast => '↗',
            Direction::East => '→',
            Direction::SouthEast => '↘',
            Direction::South => '↓',
            Direction::SouthWest => '↙',
            Direction::West => '←',
            Direction::NorthWest => '↖',
        }
    }

    /// Parses a direction back from its glyph.
    #[inline]
    pub fn from_glyph(c: char) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.glyph() == c)
    }

    /// The next direction in the allowed set, used by the generator's
    /// arrow-rotation step.
    pub fn rotate_within(self, allowed: &[Direction]) -> Direction {
        let idx = allowed.iter().position(|&d| d == self).unwrap_or(0);
        allowed[(idx + 1) % allowed.len()]
    }
}

/// Grid extent, rows first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Size {
    pub rows: usize,
    pub cols: usize,
}

impl Size {
    #[inline]
    pub fn new(rows: usize, cols: usize) -> Size {
        Size { rows, cols }
    }

    #[inline]
    pub fn contains(self, p: Point) -> bool {
        p.row >= 0 && p.col >= 0 && (p.row as usize) < self.rows && (p.col as usize) < self.cols
    }

    #[inline]
    pub fn index_of(self, p: Point) -> usize {
        debug_assert!(self.contains(p));
        p.row as usize * self.cols + p.col as usize
    }

    #[inline]
    pub fn points(self) -> Points {
        Points { size: self, next: 0 }
    }
}

/// Iterates every point of a grid in row-major order.
#[derive(Copy, Clone, Debug)]
pub struct Points {
    size: Size,
    next: usize,
}

impl Iterator for Points {
    type Item = Point;

    #[inline]
    fn next(&mut self) -> Option<Point> {
        let total = self.size.rows * self.size.cols;
        if self.next >= total {
            return None;
        }
        let r = self.next / self.size.cols;
        let c = self.next % self.size.cols;
        self.next += 1;
        Some(Point::new(r as i32, c as i32))
    }
}

/// A dense row-major grid of `T`, indexed by [`Point`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Grid<T> {
    size: Size,
    data: Vec<T>,
}

impl<T> Grid<T> {
    #[inline]
    pub fn new(size: Size, data: Vec<T>) -> Grid<T> {
        assert_eq!(size.rows * size.cols, data.len());
        Grid { size, data }
    }

    #[inline]
    pub fn filled(size: Size, value: T) -> Grid<T>
    where
        T: Clone,
    {
        Grid::new(size, vec![value; size.rows * size.cols])
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn get(&self, p: Point) -> Option<&T> {
        self.size.contains(p).then(|| &self.data[self.size.index_of(p)])
    }

    #[inline]
    pub fn get_mut(&mut self, p: Point) -> Option<&mut T> {
        if !self.size.contains(p) {
            return None;
        }
        let idx = self.size.index_of(p);
        Some(&mut self.data[idx])
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Point, &T)> {
        self.size.points().map(move |p| (p, &self[p]))
    }
}

impl<T> Index<Point> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, p: Point) -> &T {
        &self.data[self.size.index_of(p)]
    }
}

impl<T> IndexMut<Point> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, p: Point) -> &mut T {
        let idx = self.size.index_of(p);
        &mut self.data[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_row_major() {
        let size = Size::new(2, 3);
        let pts: Vec<_> = size.points().collect();
        assert_eq!(
            pts,
            vec![
                Point::new(0, 0),
                Point::new(0, 1),
                Point::new(0, 2),
                Point::new(1, 0),
                Point::new(1, 1),
                Point::new(1, 2),
            ]
        );
    }

    #[test]
    fn direction_opposite_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn direction_glyph_round_trip() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_glyph(d.glyph()), Some(d));
        }
    }

    #[test]
    fn rotate_within_cardinal_wraps() {
        let allowed = Direction::CARDINAL;
        assert_eq!(Direction::West.rotate_within(&allowed), Direction::North);
    }
}
