//! Japanese Arrows puzzle data structure.

use std::collections::BTreeSet;
use std::fmt;

use crate::geom::{Direction, Grid, Point, Size};

/// The set of values still possible for a pending cell.
///
/// Kept as a `BTreeSet` (rather than a `HashSet`) so that iteration is
/// deterministic in ascending order, which the witness evaluator and the
/// `min_candidate`/`max_candidate` universe functions rely on.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Candidates(BTreeSet<u32>);

impl Candidates {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Candidates {
        Candidates(values.into_iter().collect())
    }

    pub fn full(limit: usize) -> Candidates {
        Candidates((0..limit as u32).collect())
    }

    pub fn singleton(v: u32) -> Candidates {
        Candidates(BTreeSet::from([v]))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn contains(&self, v: u32) -> bool {
        self.0.contains(&v)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    #[inline]
    pub fn min(&self) -> Option<u32> {
        self.0.iter().next().copied()
    }

    #[inline]
    pub fn max(&self) -> Option<u32> {
        self.0.iter().next_back().copied()
    }

    /// The single element, if the set is a singleton.
    #[inline]
    pub fn as_single(&self) -> Option<u32> {
        let mut it = self.0.iter();
        match (it.next(), it.next()) {
            (Some(&v), None) => Some(v),
            _ => None,
        }
    }

    pub fn intersect_singleton(&mut self, v: u32) {
        self.0.retain(|&c| c == v);
    }

    pub fn intersect_set(&mut self, other: &Candidates) {
        self.0.retain(|c| other.0.contains(c));
    }

    pub fn retain(&mut self, mut keep: impl FnMut(u32) -> bool) {
        self.0.retain(|&c| keep(c));
    }
}

impl FromIterator<u32> for Candidates {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Candidates {
        Candidates(iter.into_iter().collect())
    }
}

/// A cell's value state: either derived/given, or still open.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CellState {
    Committed(u32),
    Pending(Candidates),
}

impl CellState {
    pub fn pending_full(limit: usize) -> CellState {
        CellState::Pending(Candidates::full(limit))
    }

    /// The candidate set the cell currently allows: `{value}` if committed,
    /// or the explicit pending set otherwise.
    pub fn effective_candidates(&self) -> Candidates {
        match self {
            CellState::Committed(v) => Candidates::singleton(*v),
            CellState::Pending(c) => c.clone(),
        }
    }

    pub fn value(&self) -> Option<u32> {
        match self {
            CellState::Committed(v) => Some(*v),
            CellState::Pending(_) => None,
        }
    }
}

/// A single grid cell: a fixed direction and a value state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cell {
    pub direction: Direction,
    pub state: CellState,
}

impl Cell {
    pub fn new(direction: Direction, state: CellState) -> Cell {
        Cell { direction, state }
    }

    pub fn given(direction: Direction, value: u32) -> Cell {
        Cell { direction, state: CellState::Committed(value) }
    }
}

/// An error from parsing puzzle text (see [`crate::text`]).
#[derive(Debug, thiserror::Error)]
pub enum ParsePuzzleError {
    #[error("cannot parse puzzle from empty text")]
    Empty,
    #[error("line {line}: expected a border line of the form \"+----+...\"")]
    MalformedBorder { line: usize },
    #[error("line {line}: expected a content line starting and ending with '|'")]
    MalformedContent { line: usize },
    #[error("line {line}, cell {col}: {reason}")]
    InvalidCell { line: usize, col: usize, reason: String },
    #[error("rows have inconsistent column counts")]
    RaggedGrid,
}

/// Japanese Arrows puzzle: a fixed direction and optional given value per
/// cell.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Puzzle {
    size: Size,
    cells: Grid<Cell>,
}

impl Puzzle {
    /// Builds a puzzle from a row-major list of cells.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<Cell>) -> Puzzle {
        let size = Size::new(rows, cols);
        Puzzle { size, cells: Grid::new(size, cells) }
    }

    /// Builds a puzzle of the given size where every cell has `direction`
    /// and is pending with a full candidate set.
    pub fn blank(rows: usize, cols: usize, direction: Direction) -> Puzzle {
        let limit = rows.max(cols);
        let cells = vec![Cell::new(direction, CellState::pending_full(limit)); rows * cols];
        Puzzle::from_cells(rows, cols, cells)
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.size.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.size.cols
    }

    #[inline]
    pub fn cell(&self, p: Point) -> &Cell {
        &self.cells[p]
    }

    #[inline]
    pub fn cell_mut(&mut self, p: Point) -> &mut Cell {
        &mut self.cells[p]
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Point, &Cell)> {
        self.cells.iter()
    }

    pub fn set_direction(&mut self, p: Point, direction: Direction) {
        self.cells[p].direction = direction;
    }

    /// Every cell committed, and each cell's value equal to the number of
    /// distinct committed values on its ray (spec.md §3/§8 `validate()`).
    pub fn validate(&self, path_cache: &crate::path_cache::PathCache) -> bool {
        self.size.points().all(|p| {
            let Some(value) = self.cell(p).state.value() else { return false };
            let distinct: BTreeSet<u32> = path_cache
                .ray(p)
                .iter()
                .filter_map(|&q| self.cell(q).state.value())
                .collect();
            distinct.len() as u32 == value
        })
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::text::write_puzzle(f, self)
    }
}

impl std::str::FromStr for Puzzle {
    type Err = ParsePuzzleError;

    fn from_str(s: &str) -> Result<Puzzle, ParsePuzzleError> {
        crate::text::parse_puzzle(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_intersect_singleton() {
        let mut c = Candidates::new([0, 1, 2, 3]);
        c.intersect_singleton(2);
        assert_eq!(c.as_single(), Some(2));
    }

    #[test]
    fn candidates_only_keeps_listed_values() {
        let mut c = Candidates::new([0, 1, 2, 3]);
        c.intersect_set(&Candidates::new([1, 2]));
        assert_eq!(c, Candidates::new([1, 2]));
    }

    #[test]
    fn committed_cell_effective_candidates_is_singleton() {
        let cell = Cell::given(Direction::East, 3);
        assert_eq!(cell.state.effective_candidates(), Candidates::singleton(3));
    }

    #[test]
    fn validate_requires_every_cell_committed() {
        let puzzle = Puzzle::from_cells(
            1,
            2,
            vec![
                Cell::given(Direction::East, 1),
                Cell::new(Direction::West, CellState::pending_full(2)),
            ],
        );
        let cache = crate::path_cache::PathCache::build(&puzzle);
        assert!(!puzzle.validate(&cache));
    }

    #[test]
    fn validate_already_solved_1x2() {
        // [→1, →0]: cell 0 sees {0} ahead (one distinct value) -> needs 1.
        // cell 1 sees nothing ahead -> needs 0.
        let puzzle = Puzzle::from_cells(
            1,
            2,
            vec![Cell::given(Direction::East, 1), Cell::given(Direction::East, 0)],
        );
        let cache = crate::path_cache::PathCache::build(&puzzle);
        assert!(puzzle.validate(&cache));
    }
}
