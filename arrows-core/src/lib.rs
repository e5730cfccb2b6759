//! Grid, direction and candidate-set data model for the Japanese Arrows
//! puzzle family.

#![warn(missing_debug_implementations)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unused)]
#![warn(unused_import_braces)]
#![warn(unused_qualifications)]

pub mod geom;
pub mod path_cache;
pub mod puzzle;
pub mod text;

pub use geom::{Delta, Direction, Grid, Point, Size};
pub use path_cache::PathCache;
pub use puzzle::{Candidates, Cell, CellState, ParsePuzzleError, Puzzle};
