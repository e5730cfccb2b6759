// Copyright (c) 2016 arrows-logic developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Interpretation layer: maps function and relation symbols onto
//! computations over the current puzzle state.

use std::collections::{BTreeSet, HashMap};

use arrows_core::{Candidates, Point, PathCache, Puzzle};

use crate::error::LogicError;
use crate::model::fol::{Sort, Value};

/// Borrows a puzzle and its path cache for the lifetime of one `solve` call;
/// it never owns puzzle state (spec'd ownership contract).
#[derive(Debug)]
pub struct Universe<'p> {
    puzzle: &'p Puzzle,
    path_cache: &'p PathCache,
    constants: HashMap<String, Value>,
}

impl<'p> Universe<'p> {
    pub fn new(puzzle: &'p Puzzle, path_cache: &'p PathCache) -> Universe<'p> {
        Universe { puzzle, path_cache, constants: HashMap::new() }
    }

    pub fn puzzle(&self) -> &'p Puzzle {
        self.puzzle
    }

    pub fn path_cache(&self) -> &'p PathCache {
        self.path_cache
    }

    /// Declares a named constant, looked up by [`crate::model::fol::Term::Variable`]
    /// resolution is not used for this; reserved for rule-set-level constants.
    pub fn declare_constant(&mut self, name: impl Into<String>, value: Value) {
        self.constants.insert(name.into(), value);
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// The element domain for a quantifier over `sort`, already excluding the
    /// sort's sentinel ("OOB" / "nil"): the finite set of real grid points or
    /// real numbers in range.
    pub fn domain(&self, sort: Sort) -> Vec<Value> {
        match sort {
            Sort::Position => self.puzzle.size().points().map(Value::Position).collect(),
            Sort::Number => {
                let limit = self.puzzle.rows().max(self.puzzle.cols()).max(1) as i64;
                (0..limit).map(Value::Number).collect()
            }
            Sort::Direction | Sort::Unknown => Vec::new(),
        }
    }

    fn effective_candidates(&self, p: Point) -> Candidates {
        self.puzzle.cell(p).state.effective_candidates()
    }

    fn ray_behind(&self, p: Point) -> Vec<Point> {
        let opposite = self.puzzle.cell(p).direction.opposite().delta();
        let size = self.puzzle.size();
        let mut ray = Vec::new();
        let mut cur = p + opposite;
        while size.contains(cur) {
            ray.push(cur);
            cur = cur + opposite;
        }
        ray
    }

    fn distinct_committed(&self, ray: &[Point]) -> BTreeSet<u32> {
        ray.iter().filter_map(|&q| self.puzzle.cell(q).state.value()).collect()
    }

    /// Dispatches a built-in function by name. Unknown names are the caller's
    /// responsibility to reject (the type checker never lets one through).
    pub fn call_function(&self, name: &str, args: &[Value]) -> Result<Value, LogicError> {
        match (name, args) {
            ("next", [Value::Position(p)]) => {
                let d = self.puzzle.cell(*p).direction.delta();
                let np = *p + d;
                if self.puzzle.size().contains(np) {
                    Ok(Value::Position(np))
                } else {
                    Ok(Value::Oob)
                }
            }
            ("next", [Value::Oob]) => Ok(Value::Oob),
            ("val", [Value::Position(p)]) => {
                Ok(self.puzzle.cell(*p).state.value().map(|v| Value::Number(v as i64)).unwrap_or(Value::Nil))
            }
            ("val", [Value::Oob]) => Ok(Value::Nil),
            ("ahead", [Value::Position(p)]) => Ok(Value::Number(self.path_cache.ahead(*p) as i64)),
            ("ahead", [Value::Oob]) => Ok(Value::Number(0)),
            ("behind", [Value::Position(p)]) => Ok(Value::Number(self.ray_behind(*p).len() as i64)),
            ("behind", [Value::Oob]) => Ok(Value::Number(0)),
            ("ahead_free", [Value::Position(p)]) => {
                let n = self
                    .path_cache
                    .ray(*p)
                    .iter()
                    .filter(|&&q| self.puzzle.cell(q).state.value().is_none())
                    .count();
                Ok(Value::Number(n as i64))
            }
            ("ahead_free", [Value::Oob]) => Ok(Value::Number(0)),
            ("between_free", [Value::Position(p), Value::Position(q)]) => {
                let ray = self.path_cache.ray(*p);
                match ray.iter().position(|&r| r == *q) {
                    Some(idx) => {
                        let n = ray[..idx].iter().filter(|&&r| self.puzzle.cell(r).state.value().is_none()).count();
                        Ok(Value::Number(n as i64))
                    }
                    None => Ok(Value::Nil),
                }
            }
            ("between_free", [_, _]) => Ok(Value::Nil),
            ("dir", [Value::Position(p)]) => Ok(Value::Direction(self.puzzle.cell(*p).direction)),
            ("sees_distinct", [Value::Position(p)]) => {
                Ok(Value::Number(self.distinct_committed(self.path_cache.ray(*p)).len() as i64))
            }
            ("sees_distinct", [Value::Oob]) => Ok(Value::Number(0)),
            ("sees_distinct_candidates", [Value::Position(p)]) => {
                let mut values: BTreeSet<u32> = BTreeSet::new();
                for &q in self.path_cache.ray(*p) {
                    values.extend(self.effective_candidates(q).iter());
                }
                Ok(Value::Number(values.len() as i64))
            }
            ("sees_distinct_candidates", [Value::Oob]) => Ok(Value::Number(0)),
            ("min_candidate", [Value::Position(p)]) => {
                Ok(self.effective_candidates(*p).min().map(|v| Value::Number(v as i64)).unwrap_or(Value::Nil))
            }
            ("max_candidate", [Value::Position(p)]) => {
                Ok(self.effective_candidates(*p).max().map(|v| Value::Number(v as i64)).unwrap_or(Value::Nil))
            }
            ("+", [Value::Number(a), Value::Number(b)]) => Ok(Value::Number(a + b)),
            ("+", [_, _]) => Ok(Value::Nil),
            ("-", [Value::Number(a), Value::Number(b)]) => Ok(Value::Number(a - b)),
            ("-", [_, _]) => Ok(Value::Nil),
            _ => Err(LogicError::UnknownSymbol(name.to_string())),
        }
    }

    /// Dispatches a built-in relation by name.
    pub fn call_relation(&self, name: &str, args: &[Value]) -> Result<bool, LogicError> {
        match (name, args) {
            ("points_at", [Value::Position(p), Value::Position(q)]) => {
                Ok(self.path_cache.points_at(*p, *q))
            }
            ("points_at", [_, _]) => Ok(false),
            ("candidate", [Value::Position(p), Value::Number(i)]) => {
                Ok(*i >= 0 && self.effective_candidates(*p).contains(*i as u32))
            }
            ("candidate", [_, _]) => Ok(false),
            ("sees_value", [Value::Position(p), Value::Number(i)]) => {
                Ok(*i >= 0 && self.distinct_committed(self.path_cache.ray(*p)).contains(&(*i as u32)))
            }
            ("sees_value", [_, _]) => Ok(false),
            ("<", [Value::Number(a), Value::Number(b)]) => Ok(a < b),
            (">", [Value::Number(a), Value::Number(b)]) => Ok(a > b),
            ("<=", [Value::Number(a), Value::Number(b)]) => Ok(a <= b),
            (">=", [Value::Number(a), Value::Number(b)]) => Ok(a >= b),
            ("<" | ">" | "<=" | ">=", [_, _]) => Ok(false),
            _ => Err(LogicError::UnknownSymbol(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrows_core::{Cell, CellState, Direction};

    fn puzzle() -> Puzzle {
        Puzzle::from_cells(
            1,
            2,
            vec![Cell::given(Direction::East, 1), Cell::given(Direction::East, 0)],
        )
    }

    #[test]
    fn next_at_edge_is_oob() {
        let puzzle = puzzle();
        let cache = PathCache::build(&puzzle);
        let universe = Universe::new(&puzzle, &cache);
        let result = universe.call_function("next", &[Value::Position(Point::new(0, 1))]).unwrap();
        assert_eq!(result, Value::Oob);
    }

    #[test]
    fn sees_distinct_counts_ray_values() {
        let puzzle = puzzle();
        let cache = PathCache::build(&puzzle);
        let universe = Universe::new(&puzzle, &cache);
        let result = universe.call_function("sees_distinct", &[Value::Position(Point::new(0, 0))]).unwrap();
        assert_eq!(result, Value::Number(1));
    }

    #[test]
    fn candidate_relation_checks_effective_set() {
        let mut puzzle = puzzle();
        *puzzle.cell_mut(Point::new(0, 0)) = Cell::new(Direction::East, CellState::pending_full(3));
        let cache = PathCache::build(&puzzle);
        let universe = Universe::new(&puzzle, &cache);
        assert!(universe
            .call_relation("candidate", &[Value::Position(Point::new(0, 0)), Value::Number(1)])
            .unwrap());
    }
}
