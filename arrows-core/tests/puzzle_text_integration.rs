//! Round-trips a puzzle through the text format and checks it validates,
//! exercising `Display`/`FromStr`/`PathCache`/`Puzzle::validate` together
//! the way a real caller (the CLI's `solve` command) would.

use arrows_core::{Cell, Direction, PathCache, Point, Puzzle};

#[test]
fn already_solved_row_round_trips_and_validates() {
    // [→2, →1, →0]: cell 0 sees {cell1=1, cell2=0} (2 distinct values ahead),
    // cell 1 sees {cell2=0} (1 distinct value ahead), cell 2 sees nothing.
    let puzzle = Puzzle::from_cells(
        1,
        3,
        vec![
            Cell::given(Direction::East, 2),
            Cell::given(Direction::East, 1),
            Cell::given(Direction::East, 0),
        ],
    );

    let cache = PathCache::build(&puzzle);
    assert!(puzzle.validate(&cache));

    let text = puzzle.to_string();
    let parsed: Puzzle = text.parse().expect("round-trip parse should succeed");
    assert_eq!(parsed, puzzle);

    let reparsed_cache = PathCache::build(&parsed);
    assert!(parsed.validate(&reparsed_cache));
}

#[test]
fn a_single_cell_pointing_off_grid_has_an_empty_ray() {
    let puzzle = Puzzle::from_cells(1, 1, vec![Cell::given(Direction::East, 0)]);
    let cache = PathCache::build(&puzzle);
    assert!(cache.ray(Point::new(0, 0)).is_empty());
    assert!(puzzle.validate(&cache));
}
