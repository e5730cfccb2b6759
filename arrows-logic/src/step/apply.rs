// Copyright (c) 2016 arrows-logic developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Applies a single conclusion to a witness, mutating per-cell candidates.
//!
//! Evaluating a conclusion's terms needs a read-only [`Universe`] borrowing
//! the puzzle; writing the result needs `&mut Puzzle` on the very same
//! value, which the borrow checker will not allow at once. The applier is
//! therefore split into a pure decision phase ([`apply_conclusion`], reading
//! through the `Universe`) and a commit phase ([`commit`] /
//! [`commit_with_undo`], writing through `&mut Puzzle` after the `Universe`
//! borrow has ended) — the solver rebuilds its `Universe` once per step
//! anyway, since a commit changes the very state the next witness search
//! reads.

use arrows_core::{Candidates, CellState, Point, Puzzle};

use crate::error::LogicError;
use crate::model::fol::Value;
use crate::model::rule::Conclusion;
use crate::model::universe::Universe;
use crate::step::evaluate::{eval_term, Assignment};

/// The result of deciding a conclusion against one witness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConclusionOutcome {
    Progress(Point, CellState),
    NoProgress,
    Contradiction(Point),
}

/// Decides what a conclusion would do to the puzzle under `assignment`,
/// without mutating anything.
pub fn apply_conclusion(
    universe: &Universe,
    conclusion: &Conclusion,
    assignment: &Assignment,
) -> Result<ConclusionOutcome, LogicError> {
    let pos = eval_term(universe, conclusion.position_term(), assignment)?;
    let p = match pos {
        Value::Position(p) => p,
        _ => return Ok(ConclusionOutcome::NoProgress),
    };
    let current = universe.puzzle().cell(p).state.effective_candidates();

    let new_candidates = match conclusion {
        Conclusion::Set(_, value_term) => match eval_term(universe, value_term, assignment)? {
            Value::Number(n) if n >= 0 => {
                let mut c = current.clone();
                c.intersect_singleton(n as u32);
                c
            }
            _ => return Ok(ConclusionOutcome::Contradiction(p)),
        },
        Conclusion::Exclude(_, op, value_term) => match eval_term(universe, value_term, assignment)? {
            Value::Number(n) => {
                let mut c = current.clone();
                c.retain(|cand| !op.holds(cand as i64, n));
                c
            }
            // A non-integer exclusion target excludes nothing.
            _ => current.clone(),
        },
        Conclusion::Only(_, value_terms) => {
            let mut target = Vec::new();
            for t in value_terms {
                if let Value::Number(n) = eval_term(universe, t, assignment)? {
                    if n >= 0 {
                        target.push(n as u32);
                    }
                }
            }
            let mut c = current.clone();
            c.intersect_set(&Candidates::new(target));
            c
        }
    };

    if new_candidates.is_empty() {
        return Ok(ConclusionOutcome::Contradiction(p));
    }
    if new_candidates == current {
        return Ok(ConclusionOutcome::NoProgress);
    }
    let state = match new_candidates.as_single() {
        Some(v) => CellState::Committed(v),
        None => CellState::Pending(new_candidates),
    };
    Ok(ConclusionOutcome::Progress(p, state))
}

/// Writes a decided outcome to the puzzle, discarding the prior state.
pub fn commit(puzzle: &mut Puzzle, outcome: &ConclusionOutcome) {
    if let ConclusionOutcome::Progress(p, state) = outcome {
        puzzle.cell_mut(*p).state = state.clone();
    }
}

/// A stack of prior cell states, restorable in LIFO order.
///
/// A `Vec` of snapshots rather than a closure-based undo handle, avoiding a
/// boxed `FnOnce` allocation per hypothesis step in the backtrack rule's hot
/// loop.
#[derive(Clone, Debug, Default)]
pub struct UndoJournal(Vec<(Point, CellState)>);

impl UndoJournal {
    pub fn new() -> UndoJournal {
        UndoJournal(Vec::new())
    }

    pub fn mark(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn record(&mut self, p: Point, prior: CellState) {
        self.0.push((p, prior));
    }

    pub fn undo_last(&mut self, puzzle: &mut Puzzle) {
        if let Some((p, prior)) = self.0.pop() {
            puzzle.cell_mut(p).state = prior;
        }
    }

    pub fn undo_to(&mut self, puzzle: &mut Puzzle, mark: usize) {
        while self.0.len() > mark {
            self.undo_last(puzzle);
        }
    }
}

/// Writes a decided outcome to the puzzle, recording a restoration entry.
pub fn commit_with_undo(puzzle: &mut Puzzle, outcome: &ConclusionOutcome, journal: &mut UndoJournal) {
    if let ConclusionOutcome::Progress(p, state) = outcome {
        journal.record(*p, puzzle.cell(*p).state.clone());
        puzzle.cell_mut(*p).state = state.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rule::CompareOp;
    use arrows_core::{Cell, Direction, PathCache};

    fn puzzle_with_candidates(values: impl IntoIterator<Item = u32>) -> Puzzle {
        Puzzle::from_cells(
            1,
            1,
            vec![Cell::new(Direction::East, CellState::Pending(Candidates::new(values)))],
        )
    }

    #[test]
    fn only_restricts_candidates_then_no_progress_on_repeat() {
        let mut puzzle = puzzle_with_candidates([0, 1, 2, 3]);
        let cache = PathCache::build(&puzzle);
        let universe = Universe::new(&puzzle, &cache);
        let conclusion = Conclusion::Only(
            crate::model::fol::Term::var("p"),
            vec![crate::model::fol::Term::int(1), crate::model::fol::Term::int(2)],
        );
        let mut assignment = Assignment::new();
        assignment.insert("p".to_string(), Value::Position(Point::new(0, 0)));

        let outcome = apply_conclusion(&universe, &conclusion, &assignment).unwrap();
        assert!(matches!(outcome, ConclusionOutcome::Progress(_, _)));
        commit(&mut puzzle, &outcome);
        assert_eq!(puzzle.cell(Point::new(0, 0)).state, CellState::Pending(Candidates::new([1, 2])));

        let cache = PathCache::build(&puzzle);
        let universe = Universe::new(&puzzle, &cache);
        let outcome = apply_conclusion(&universe, &conclusion, &assignment).unwrap();
        assert_eq!(outcome, ConclusionOutcome::NoProgress);
    }

    #[test]
    fn exclude_to_empty_is_contradiction() {
        let puzzle = puzzle_with_candidates([1]);
        let cache = PathCache::build(&puzzle);
        let universe = Universe::new(&puzzle, &cache);
        let conclusion =
            Conclusion::Exclude(crate::model::fol::Term::var("p"), CompareOp::Eq, crate::model::fol::Term::int(1));
        let mut assignment = Assignment::new();
        assignment.insert("p".to_string(), Value::Position(Point::new(0, 0)));

        let outcome = apply_conclusion(&universe, &conclusion, &assignment).unwrap();
        assert_eq!(outcome, ConclusionOutcome::Contradiction(Point::new(0, 0)));
    }

    #[test]
    fn undo_restores_prior_candidates() {
        let mut puzzle = puzzle_with_candidates([0, 1]);
        let mut journal = UndoJournal::new();
        let cache = PathCache::build(&puzzle);
        let universe = Universe::new(&puzzle, &cache);
        let conclusion = Conclusion::Set(crate::model::fol::Term::var("p"), crate::model::fol::Term::int(0));
        let mut assignment = Assignment::new();
        assignment.insert("p".to_string(), Value::Position(Point::new(0, 0)));
        let outcome = apply_conclusion(&universe, &conclusion, &assignment).unwrap();
        commit_with_undo(&mut puzzle, &outcome, &mut journal);
        assert_eq!(puzzle.cell(Point::new(0, 0)).state, CellState::Committed(0));

        journal.undo_last(&mut puzzle);
        assert_eq!(puzzle.cell(Point::new(0, 0)).state, CellState::Pending(Candidates::new([0, 1])));
    }
}
