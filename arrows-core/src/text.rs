//! The bit-exact puzzle text format: alternating border and content lines,
//! each cell rendered as a compass arrow glyph followed by a digit or `.`.

use std::fmt;

use crate::geom::{Direction, Point};
use crate::puzzle::{Cell, CellState, ParsePuzzleError, Puzzle};

fn cell_string(cell: &Cell) -> String {
    let glyph = cell.direction.glyph();
    // Values above a single digit cannot round-trip through this format;
    // callers are expected to keep puzzles within single-digit rays.
    match cell.state.value() {
        Some(v) => format!("{glyph}{v}"),
        None => format!("{glyph}."),
    }
}

pub(crate) fn write_puzzle(f: &mut fmt::Formatter<'_>, puzzle: &Puzzle) -> fmt::Result {
    let cols = puzzle.cols();
    let border = || "+".to_string() + &"----+".repeat(cols);

    for r in 0..puzzle.rows() {
        writeln!(f, "{}", border())?;
        write!(f, "|")?;
        for c in 0..cols {
            let cell = puzzle.cell(Point::new(r as i32, c as i32));
            write!(f, " {} |", cell_string(cell))?;
        }
        writeln!(f)?;
    }
    writeln!(f, "{}", border())?;
    Ok(())
}

fn parse_border_cols(line: &str, lineno: usize) -> Result<usize, ParsePuzzleError> {
    let bytes: Vec<char> = line.chars().collect();
    if bytes.first() != Some(&'+') || (bytes.len() - 1) % 5 != 0 {
        return Err(ParsePuzzleError::MalformedBorder { line: lineno });
    }
    let cols = (bytes.len() - 1) / 5;
    for i in 0..cols {
        let seg: String = bytes[1 + i * 5..1 + i * 5 + 5].iter().collect();
        if seg != "----+" {
            return Err(ParsePuzzleError::MalformedBorder { line: lineno });
        }
    }
    Ok(cols)
}

fn parse_content_row(
    line: &str,
    cols: usize,
    lineno: usize,
) -> Result<Vec<Cell>, ParsePuzzleError> {
    let chars: Vec<char> = line.chars().collect();
    if chars.first() != Some(&'|') || chars.last() != Some(&'|') {
        return Err(ParsePuzzleError::MalformedContent { line: lineno });
    }
    let parts: Vec<&[char]> = line_split_on_pipe(&chars);
    if parts.len() != cols {
        return Err(ParsePuzzleError::MalformedContent { line: lineno });
    }

    parts
        .into_iter()
        .enumerate()
        .map(|(col, seg)| {
            if seg.len() != 4 || seg[0] != ' ' || seg[3] != ' ' {
                return Err(ParsePuzzleError::InvalidCell {
                    line: lineno,
                    col,
                    reason: "expected \" XY \"".to_string(),
                });
            }
            let glyph = seg[1];
            let direction = Direction::from_glyph(glyph).ok_or_else(|| ParsePuzzleError::InvalidCell {
                line: lineno,
                col,
                reason: format!("'{glyph}' is not a compass arrow glyph"),
            })?;
            let state = match seg[2] {
                // Re-derived to the grid's real candidate limit by the caller.
                '.' => CellState::Pending(crate::puzzle::Candidates::new([])),
                d if d.is_ascii_digit() => CellState::Committed(d.to_digit(10).unwrap()),
                other => {
                    return Err(ParsePuzzleError::InvalidCell {
                        line: lineno,
                        col,
                        reason: format!("'{other}' is neither a digit nor '.'"),
                    })
                }
            };
            Ok(Cell::new(direction, state))
        })
        .collect()
}

/// Splits a content line's chars on `|`, dropping the empty leading/trailing
/// pieces produced by the line's own delimiters.
fn line_split_on_pipe(chars: &[char]) -> Vec<&[char]> {
    let mut parts = Vec::new();
    let mut start = 1; // skip leading '|'
    for (i, &c) in chars.iter().enumerate().skip(1) {
        if c == '|' {
            parts.push(&chars[start..i]);
            start = i + 1;
        }
    }
    parts
}

pub(crate) fn parse_puzzle(s: &str) -> Result<Puzzle, ParsePuzzleError> {
    let lines: Vec<&str> = s.lines().collect();
    if lines.is_empty() {
        return Err(ParsePuzzleError::Empty);
    }

    let cols = parse_border_cols(lines[0], 1)?;
    let mut rows_cells = Vec::new();
    let mut i = 1;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            break;
        }
        let row = parse_content_row(lines[i], cols, i + 1)?;
        rows_cells.push(row);
        let border_line = i + 1;
        if border_line >= lines.len() {
            return Err(ParsePuzzleError::MalformedBorder { line: border_line + 1 });
        }
        let border_cols = parse_border_cols(lines[border_line], border_line + 1)?;
        if border_cols != cols {
            return Err(ParsePuzzleError::RaggedGrid);
        }
        i += 2;
    }

    if rows_cells.is_empty() {
        return Err(ParsePuzzleError::Empty);
    }

    let rows = rows_cells.len();
    // Candidates get re-derived by the solver's initialisation step; parsed
    // pending cells just need a placeholder candidate set sized to the
    // grid, matching `Solver::_initialize_candidates` in spirit.
    let limit = rows.max(cols).max(1);
    let cells: Vec<Cell> = rows_cells
        .into_iter()
        .flatten()
        .map(|cell| match cell.state {
            CellState::Pending(_) => Cell::new(cell.direction, CellState::pending_full(limit)),
            committed => Cell::new(cell.direction, committed),
        })
        .collect();

    Ok(Puzzle::from_cells(rows, cols, cells))
}
