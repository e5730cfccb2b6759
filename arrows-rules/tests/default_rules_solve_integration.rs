//! Solves real puzzles with the shipped rule pack, exercising the DSL
//! frontend (`load_str` via `default_rules`) together with the
//! `arrows-logic` solver it feeds.

use arrows_core::{Cell, CellState, Direction, Point, Puzzle};
use arrows_logic::{solve, SolverStatus};
use arrows_rules::default_rules;

#[test]
fn default_rules_solve_a_fully_pending_row() {
    let puzzle = Puzzle::from_cells(
        1,
        3,
        vec![Cell::new(Direction::East, CellState::pending_full(3)); 3],
    );
    let result = solve(&puzzle, &default_rules(), false).unwrap();
    assert_eq!(result.status, SolverStatus::Solved);
    assert_eq!(result.puzzle.cell(Point::new(0, 0)).state.value(), Some(2));
    assert_eq!(result.puzzle.cell(Point::new(0, 1)).state.value(), Some(1));
    assert_eq!(result.puzzle.cell(Point::new(0, 2)).state.value(), Some(0));
}

#[test]
fn default_rules_detect_a_contradictory_given() {
    // A single cell pointing off the grid must be given 0; 1 is impossible.
    let puzzle = Puzzle::from_cells(1, 1, vec![Cell::given(Direction::East, 1)]);
    let result = solve(&puzzle, &default_rules(), false).unwrap();
    assert_eq!(result.status, SolverStatus::NoSolution);
    assert_eq!(result.contradiction_location, Some(Point::new(0, 0)));
}

#[test]
fn default_rules_solve_a_row_with_one_cell_already_given() {
    // cell1 is given 0; cell0 and cell2 start pending and must resolve to
    // 1 and 0 respectively once the forcing rule propagates end-to-start.
    let puzzle = Puzzle::from_cells(
        1,
        3,
        vec![
            Cell::new(Direction::East, CellState::pending_full(3)),
            Cell::given(Direction::East, 0),
            Cell::new(Direction::East, CellState::pending_full(3)),
        ],
    );
    let result = solve(&puzzle, &default_rules(), false).unwrap();
    assert_eq!(result.status, SolverStatus::Solved);
    assert_eq!(result.puzzle.cell(Point::new(0, 0)).state.value(), Some(1));
    assert_eq!(result.puzzle.cell(Point::new(0, 2)).state.value(), Some(0));
}
