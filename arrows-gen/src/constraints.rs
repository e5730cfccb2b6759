//! Acceptance predicates applied to a finished generation attempt.
//!
//! A [`Constraint`] may reject an attempt early, from arrow directions alone
//! (`pre_check`), or only after the solver has produced a full
//! [`SolverResult`] (`check`). Grounded in the condition/threshold shape of
//! `arrows_logic`'s rule conclusions: each constraint is a small predicate
//! object over counts and fractions, not a general scripting surface.

use std::collections::BTreeSet;

use arrows_core::{PathCache, Puzzle};
use arrows_logic::SolverResult;

/// An inclusive bound pairing an absolute count and a fraction of the grid;
/// either half may be left unset.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bound {
    pub min_fraction: Option<f64>,
    pub max_fraction: Option<f64>,
    pub min_count: Option<u32>,
    pub max_count: Option<u32>,
}

impl Bound {
    pub fn fraction(min: Option<f64>, max: Option<f64>) -> Bound {
        Bound { min_fraction: min, max_fraction: max, ..Bound::default() }
    }

    fn holds(&self, count: u32, total: usize) -> bool {
        let fraction = if total == 0 { 0.0 } else { count as f64 / total as f64 };
        self.min_fraction.map_or(true, |m| fraction >= m)
            && self.max_fraction.map_or(true, |m| fraction <= m)
            && self.min_count.map_or(true, |m| count >= m)
            && self.max_count.map_or(true, |m| count <= m)
    }
}

/// A predicate over a generation attempt: arrow-only `pre_check` before
/// solving, full `check` after a SOLVED trace.
pub trait Constraint: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Arrow-only rejection, run before the (expensive) solve. The default
    /// accepts everything; constraints with no geometric bound leave it.
    fn pre_check(&self, _puzzle: &Puzzle, _path_cache: &PathCache) -> bool {
        true
    }

    fn check(&self, trace: &SolverResult) -> bool;
}

/// Accepts traces where the fraction (or count) of steps driven by a rule of
/// exactly complexity `k` falls inside `bound`.
#[derive(Clone, Debug)]
pub struct RuleComplexityFraction {
    pub name: String,
    pub complexity: u32,
    pub bound: Bound,
}

impl RuleComplexityFraction {
    pub fn new(complexity: u32, bound: Bound) -> RuleComplexityFraction {
        RuleComplexityFraction { name: format!("rule-complexity-fraction({complexity})"), complexity, bound }
    }
}

impl Constraint for RuleComplexityFraction {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, trace: &SolverResult) -> bool {
        let count = trace.steps.iter().filter(|s| s.rule_complexity == self.complexity).count() as u32;
        self.bound.holds(count, trace.steps.len())
    }
}

/// Accepts traces where the fraction of cells committed to value `n` (in the
/// final puzzle) falls inside `bound`. The geometric pre-check bounds this
/// fraction from ray lengths alone, before any solving happens.
#[derive(Clone, Debug)]
pub struct NumberFraction {
    pub name: String,
    pub n: u32,
    pub bound: Bound,
}

impl NumberFraction {
    pub fn new(n: u32, bound: Bound) -> NumberFraction {
        NumberFraction { name: format!("number-fraction({n})"), n, bound }
    }
}

impl Constraint for NumberFraction {
    fn name(&self) -> &str {
        &self.name
    }

    fn pre_check(&self, puzzle: &Puzzle, path_cache: &PathCache) -> bool {
        let total = puzzle.rows() * puzzle.cols();
        let ray_lens: Vec<usize> = puzzle.size().points().map(|p| path_cache.ahead(p)).collect();
        match self.n {
            0 => {
                let exact = ray_lens.iter().filter(|&&l| l == 0).count() as u32;
                self.bound.holds(exact, total)
            }
            1 => {
                let lower = ray_lens.iter().filter(|&&l| l == 1).count() as u32;
                let upper = ray_lens.iter().filter(|&&l| l >= 1).count() as u32;
                self.bound.min_fraction.map_or(true, |m| total == 0 || (lower as f64 / total as f64) >= m)
                    && self.bound.max_fraction.map_or(true, |m| (upper as f64 / total.max(1) as f64) <= m)
            }
            n => {
                let upper = ray_lens.iter().filter(|&&l| l >= n as usize).count() as u32;
                self.bound.max_fraction.map_or(true, |m| (upper as f64 / total.max(1) as f64) <= m)
            }
        }
    }

    fn check(&self, trace: &SolverResult) -> bool {
        let total = trace.puzzle.rows() * trace.puzzle.cols();
        let count = trace.puzzle.size().points().filter(|&p| trace.puzzle.cell(p).state.value() == Some(self.n)).count() as u32;
        self.bound.holds(count, total)
    }
}

/// Accepts traces in which a named rule fired at least `min_count` times (or
/// at least `min_fraction` of all steps).
#[derive(Clone, Debug)]
pub struct UsesRule {
    pub rule_name: String,
    pub min_count: Option<u32>,
    pub min_fraction: Option<f64>,
}

impl UsesRule {
    pub fn new(rule_name: impl Into<String>, min_count: Option<u32>, min_fraction: Option<f64>) -> UsesRule {
        UsesRule { rule_name: rule_name.into(), min_count, min_fraction }
    }
}

impl Constraint for UsesRule {
    fn name(&self) -> &str {
        &self.rule_name
    }

    fn check(&self, trace: &SolverResult) -> bool {
        let count = *trace.rule_counts.get(&self.rule_name).unwrap_or(&0);
        let fraction_ok = match self.min_fraction {
            Some(m) if !trace.steps.is_empty() => count as f64 / trace.steps.len() as f64 >= m,
            Some(_) => false,
            None => true,
        };
        let count_ok = self.min_count.map_or(true, |m| count >= m);
        count_ok && fraction_ok
    }
}

/// Accepts traces where the fraction of cells whose immediate next cell
/// shares the same direction falls inside `bound`.
#[derive(Clone, Debug)]
pub struct FollowingArrowsFraction {
    pub bound: Bound,
}

impl FollowingArrowsFraction {
    pub fn new(bound: Bound) -> FollowingArrowsFraction {
        FollowingArrowsFraction { bound }
    }
}

impl Constraint for FollowingArrowsFraction {
    fn name(&self) -> &str {
        "following-arrows-fraction"
    }

    fn check(&self, trace: &SolverResult) -> bool {
        let puzzle = &trace.puzzle;
        let total = puzzle.rows() * puzzle.cols();
        let count = puzzle
            .size()
            .points()
            .filter(|&p| {
                let next = p + puzzle.cell(p).direction.delta();
                puzzle.size().contains(next) && puzzle.cell(next).direction == puzzle.cell(p).direction
            })
            .count() as u32;
        self.bound.holds(count, total)
    }
}

/// Accepts traces where the fraction of committed cells in the *initial*
/// puzzle (the givens handed to the solver, before any derivation) falls
/// inside `bound`.
#[derive(Clone, Debug)]
pub struct PrefilledCellsFraction {
    pub bound: Bound,
}

impl PrefilledCellsFraction {
    pub fn new(bound: Bound) -> PrefilledCellsFraction {
        PrefilledCellsFraction { bound }
    }
}

impl Constraint for PrefilledCellsFraction {
    fn name(&self) -> &str {
        "prefilled-cells-fraction"
    }

    fn check(&self, trace: &SolverResult) -> bool {
        let puzzle = &trace.initial_puzzle;
        let total = puzzle.rows() * puzzle.cols();
        let count = puzzle.size().points().filter(|&p| puzzle.cell(p).state.value().is_some()).count() as u32;
        self.bound.holds(count, total)
    }
}

/// Rules actually used across a trace, for diagnostics (`rules check
/// --explain`-style output): every rule name with a nonzero step count.
pub fn rules_used(trace: &SolverResult) -> BTreeSet<String> {
    trace.steps.iter().map(|s| s.rule_name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrows_core::{Cell, CellState, Direction};
    use arrows_logic::SolverStatus;

    fn solved_trace() -> SolverResult {
        let puzzle = Puzzle::from_cells(
            1,
            2,
            vec![Cell::given(Direction::East, 1), Cell::given(Direction::East, 0)],
        );
        SolverResult {
            status: SolverStatus::Solved,
            puzzle: puzzle.clone(),
            initial_puzzle: puzzle,
            max_complexity_used: 1,
            rule_counts: [("force".to_string(), 2)].into_iter().collect(),
            rule_self_time: Default::default(),
            steps: vec![],
            contradiction_location: None,
        }
    }

    #[test]
    fn bound_accepts_within_fraction_window() {
        let bound = Bound::fraction(Some(0.25), Some(0.75));
        assert!(bound.holds(2, 4));
        assert!(!bound.holds(0, 4));
    }

    #[test]
    fn number_fraction_counts_committed_values() {
        let trace = solved_trace();
        let constraint = NumberFraction::new(0, Bound::fraction(Some(0.4), Some(0.6)));
        assert!(constraint.check(&trace));
    }

    #[test]
    fn uses_rule_checks_min_count() {
        let trace = solved_trace();
        let constraint = UsesRule::new("force", Some(2), None);
        assert!(constraint.check(&trace));
        let constraint = UsesRule::new("force", Some(3), None);
        assert!(!constraint.check(&trace));
    }

    #[test]
    fn prefilled_cells_fraction_uses_initial_puzzle() {
        let trace = solved_trace();
        let constraint = PrefilledCellsFraction::new(Bound::fraction(Some(1.0), None));
        assert!(constraint.check(&trace));
    }

    #[test]
    fn number_fraction_pre_check_zero_ray_length_is_exact() {
        let puzzle = Puzzle::from_cells(
            1,
            1,
            vec![Cell::new(Direction::East, CellState::pending_full(1))],
        );
        let cache = PathCache::build(&puzzle);
        let constraint = NumberFraction::new(0, Bound::fraction(Some(1.0), Some(1.0)));
        assert!(constraint.pre_check(&puzzle, &cache));
    }
}
