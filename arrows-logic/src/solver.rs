// Copyright (c) 2016 arrows-logic developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! The fixpoint solver: drives FO rules and backtrack rules to a fixpoint,
//! producing a step trace and timing/usage statistics.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use arrows_core::{CellState, PathCache, Point, Puzzle};

use crate::error::LogicError;
use crate::model::fol::Value;
use crate::model::rule::{BacktrackRule, FoRule, Rule, RuleSet};
use crate::model::universe::Universe;
use crate::step::apply::{apply_conclusion, commit, commit_with_undo, ConclusionOutcome, UndoJournal};
use crate::step::evaluate::{enumerate, Assignment, ControlFlow};

/// The overall outcome of a `solve` call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SolverStatus {
    Solved,
    NoSolution,
    Underconstrained,
}

/// A record of one successful rule application.
#[derive(Clone, Debug)]
pub struct SolverStep {
    pub rule_name: String,
    pub rule_complexity: u32,
    pub witness: BTreeMap<String, Value>,
    pub progressed_cells: Vec<Point>,
    pub puzzle_snapshot: Puzzle,
    pub contradiction_trace: Option<Vec<String>>,
}

/// The full observable result of a `solve` call.
#[derive(Clone, Debug)]
pub struct SolverResult {
    pub status: SolverStatus,
    pub puzzle: Puzzle,
    pub initial_puzzle: Puzzle,
    pub max_complexity_used: u32,
    pub rule_counts: HashMap<String, u32>,
    pub rule_self_time: HashMap<String, Duration>,
    pub steps: Vec<SolverStep>,
    pub contradiction_location: Option<Point>,
}

/// Per-rule wall time minus time recursively attributed to rules invoked
/// beneath it (a backtrack rule's hypothesis search invokes other rules).
#[derive(Default)]
struct TimingStack {
    child_time: Vec<Duration>,
}

impl TimingStack {
    fn enter(&mut self) {
        self.child_time.push(Duration::ZERO);
    }

    fn exit(&mut self, total: Duration) -> Duration {
        let child = self.child_time.pop().unwrap_or(Duration::ZERO);
        let self_time = total.saturating_sub(child);
        if let Some(parent) = self.child_time.last_mut() {
            *parent += total;
        }
        self_time
    }
}

struct SolveState {
    puzzle: Puzzle,
    path_cache: PathCache,
    rule_counts: HashMap<String, u32>,
    rule_self_time: HashMap<String, Duration>,
    steps: Vec<SolverStep>,
    timing: TimingStack,
}

enum RuleOutcome {
    Progress,
    NoProgress,
    Contradiction(Point),
}

fn witness_snapshot(assignment: &Assignment) -> BTreeMap<String, Value> {
    assignment.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn is_consistent(state: &SolveState) -> bool {
    state.puzzle.size().points().all(|p| match &state.puzzle.cell(p).state {
        CellState::Pending(c) => !c.is_empty(),
        CellState::Committed(v) => {
            let distinct: BTreeSet<u32> = state
                .path_cache
                .ray(p)
                .iter()
                .filter_map(|&q| state.puzzle.cell(q).state.value())
                .collect();
            (distinct.len() as u32) <= *v
        }
    })
}

fn collect_witnesses(state: &SolveState, condition: &crate::model::fol::Formula) -> Result<Vec<Assignment>, LogicError> {
    let universe = Universe::new(&state.puzzle, &state.path_cache);
    let mut witnesses = Vec::new();
    enumerate(&universe, condition, &Assignment::new(), &mut |w| {
        witnesses.push(w.clone());
        Ok(ControlFlow::Continue)
    })?;
    Ok(witnesses)
}

fn exclude_value_directly(state: &SolveState, p: Point, value: u32) -> ConclusionOutcome {
    let current = state.puzzle.cell(p).state.effective_candidates();
    let mut new_set = current.clone();
    new_set.retain(|c| c != value);
    if new_set.is_empty() {
        ConclusionOutcome::Contradiction(p)
    } else if new_set == current {
        ConclusionOutcome::NoProgress
    } else {
        let new_state = match new_set.as_single() {
            Some(v) => CellState::Committed(v),
            None => CellState::Pending(new_set),
        };
        ConclusionOutcome::Progress(p, new_state)
    }
}

/// Runs a single FO rule: finds the first witness with at least one
/// progressing (or contradicting) conclusion and commits it.
///
/// A witness's conclusions are applied one at a time, each against the
/// puzzle as left by the ones before it, rather than all against one frozen
/// pre-witness snapshot: `Set(p, 5)` followed by `Exclude(p, =, 5)` must see
/// its own `Set` take effect first, so the `Exclude` empties the singleton
/// candidate set it just created instead of being judged against the
/// original (wider) candidates.
fn run_fo_rule(rule: &FoRule, state: &mut SolveState) -> Result<RuleOutcome, LogicError> {
    let witnesses = collect_witnesses(state, &rule.condition)?;

    let mut journal = UndoJournal::new();
    for witness in witnesses {
        let mark = journal.mark();
        let mut progressed_cells = Vec::new();
        let mut contradiction = None;

        for c in &rule.conclusions {
            let outcome = {
                let universe = Universe::new(&state.puzzle, &state.path_cache);
                apply_conclusion(&universe, c, &witness)?
            };
            match outcome {
                ConclusionOutcome::Progress(p, _) => {
                    progressed_cells.push(p);
                    commit_with_undo(&mut state.puzzle, &outcome, &mut journal);
                }
                ConclusionOutcome::Contradiction(p) => {
                    contradiction = Some(p);
                    break;
                }
                ConclusionOutcome::NoProgress => {}
            }
        }

        if let Some(p) = contradiction {
            log::debug!("rule {} contradicted at {p}", rule.name);
            journal.undo_to(&mut state.puzzle, mark);
            return Ok(RuleOutcome::Contradiction(p));
        }

        if progressed_cells.is_empty() {
            journal.undo_to(&mut state.puzzle, mark);
            continue;
        }

        log::trace!("rule {} fired on witness {witness:?}", rule.name);
        state.steps.push(SolverStep {
            rule_name: rule.name.clone(),
            rule_complexity: rule.complexity,
            witness: witness_snapshot(&witness),
            progressed_cells,
            puzzle_snapshot: state.puzzle.clone(),
            contradiction_trace: None,
        });
        return Ok(RuleOutcome::Progress);
    }

    Ok(RuleOutcome::NoProgress)
}

/// Bounded hypothetical search for a contradiction. Always performs its
/// consistency check first, regardless of `depth`; `depth == 0` then stops
/// without recursing further.
fn find_contradiction(
    depth: u32,
    hypothesis_rules: &[FoRule],
    state: &mut SolveState,
    journal: &mut UndoJournal,
) -> Result<Option<Vec<String>>, LogicError> {
    if !is_consistent(state) {
        return Ok(Some(vec!["inconsistent: a cell's ray or candidate set is already violated".to_string()]));
    }
    if depth == 0 {
        return Ok(None);
    }

    for rule in hypothesis_rules {
        let witnesses = collect_witnesses(state, &rule.condition)?;
        for witness in witnesses {
            for conclusion in &rule.conclusions {
                let outcome = {
                    let universe = Universe::new(&state.puzzle, &state.path_cache);
                    apply_conclusion(&universe, conclusion, &witness)?
                };
                match outcome {
                    ConclusionOutcome::Contradiction(p) => {
                        return Ok(Some(vec![format!("{} contradicts at {p} under {witness:?}", rule.name)]));
                    }
                    ConclusionOutcome::NoProgress => continue,
                    ConclusionOutcome::Progress(..) => {
                        let mark = journal.mark();
                        commit_with_undo(&mut state.puzzle, &outcome, journal);
                        let sub_trace = find_contradiction(depth - 1, hypothesis_rules, state, journal)?;
                        journal.undo_to(&mut state.puzzle, mark);
                        if let Some(mut trace) = sub_trace {
                            trace.insert(0, format!("{} fires under {witness:?}", rule.name));
                            return Ok(Some(trace));
                        }
                    }
                }
            }
        }
    }
    Ok(None)
}

fn run_backtrack_rule(name: &str, rule: &BacktrackRule, rules: &RuleSet, state: &mut SolveState) -> Result<RuleOutcome, LogicError> {
    let hypothesis_rules: Vec<FoRule> = rules
        .filtered(Some(rule.max_rule_complexity))
        .rules()
        .iter()
        .filter_map(|r| match r {
            Rule::Fo(fo) => Some(fo.clone()),
            Rule::Backtrack(..) => None,
        })
        .collect();

    let mut pending: Vec<Point> = state
        .puzzle
        .size()
        .points()
        .filter(|&p| matches!(state.puzzle.cell(p).state, CellState::Pending(_)))
        .collect();
    pending.sort_by_key(|&p| match &state.puzzle.cell(p).state {
        CellState::Pending(c) => c.len(),
        CellState::Committed(_) => 0,
    });

    let mut journal = UndoJournal::new();
    for p in pending {
        let candidates = match &state.puzzle.cell(p).state {
            CellState::Pending(c) => c.clone(),
            CellState::Committed(_) => continue,
        };
        for value in candidates.iter() {
            let mark = journal.mark();
            commit_with_undo(&mut state.puzzle, &ConclusionOutcome::Progress(p, CellState::Committed(value)), &mut journal);
            let trace = find_contradiction(rule.rule_depth, &hypothesis_rules, state, &mut journal)?;
            journal.undo_to(&mut state.puzzle, mark);

            if let Some(trace) = trace {
                log::debug!("backtrack rule {name} excludes {p}={value}");
                let outcome = exclude_value_directly(state, p, value);
                if let ConclusionOutcome::Contradiction(cp) = outcome {
                    return Ok(RuleOutcome::Contradiction(cp));
                }
                commit(&mut state.puzzle, &outcome);
                state.steps.push(SolverStep {
                    rule_name: name.to_string(),
                    rule_complexity: rule.complexity,
                    witness: BTreeMap::new(),
                    progressed_cells: vec![p],
                    puzzle_snapshot: state.puzzle.clone(),
                    contradiction_trace: Some(trace),
                });
                return Ok(RuleOutcome::Progress);
            }
        }
    }
    Ok(RuleOutcome::NoProgress)
}

/// Solves `puzzle` against `rules`, initialising candidates fresh unless
/// `reuse_candidates` is set.
pub fn solve(puzzle: &Puzzle, rules: &RuleSet, reuse_candidates: bool) -> Result<SolverResult, LogicError> {
    let initial_puzzle = puzzle.clone();
    let mut working = puzzle.clone();
    if !reuse_candidates {
        let limit = working.rows().max(working.cols()).max(1);
        for p in working.size().points() {
            if matches!(working.cell(p).state, CellState::Pending(_)) {
                working.cell_mut(p).state = CellState::pending_full(limit);
            }
        }
    }
    let path_cache = PathCache::build(&working);

    let mut state = SolveState {
        puzzle: working,
        path_cache,
        rule_counts: HashMap::new(),
        rule_self_time: HashMap::new(),
        steps: Vec::new(),
        timing: TimingStack::default(),
    };
    let mut max_complexity_used = 0;

    'fixpoint: loop {
        for rule in rules.rules() {
            state.timing.enter();
            let start = Instant::now();
            let outcome = match rule {
                Rule::Fo(fo) => run_fo_rule(fo, &mut state),
                Rule::Backtrack(name, br) => run_backtrack_rule(name, br, rules, &mut state),
            };
            let elapsed = start.elapsed();
            let self_time = state.timing.exit(elapsed);
            *state.rule_self_time.entry(rule.name().to_string()).or_default() += self_time;

            match outcome? {
                RuleOutcome::Progress => {
                    max_complexity_used = max_complexity_used.max(rule.complexity());
                    *state.rule_counts.entry(rule.name().to_string()).or_default() += 1;
                    continue 'fixpoint;
                }
                RuleOutcome::NoProgress => continue,
                RuleOutcome::Contradiction(p) => {
                    log::info!("solve: no solution, contradiction at {p}");
                    return Ok(SolverResult {
                        status: SolverStatus::NoSolution,
                        puzzle: state.puzzle,
                        initial_puzzle,
                        max_complexity_used,
                        rule_counts: state.rule_counts,
                        rule_self_time: state.rule_self_time,
                        steps: state.steps,
                        contradiction_location: Some(p),
                    });
                }
            }
        }
        break;
    }

    let status = if state.puzzle.validate(&state.path_cache) {
        SolverStatus::Solved
    } else {
        SolverStatus::Underconstrained
    };
    log::info!("solve: {status:?} after {} step(s)", state.steps.len());
    Ok(SolverResult {
        status,
        puzzle: state.puzzle,
        initial_puzzle,
        max_complexity_used,
        rule_counts: state.rule_counts,
        rule_self_time: state.rule_self_time,
        steps: state.steps,
        contradiction_location: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fol::{ConstantLit, Formula, Term};
    use crate::model::rule::{CompareOp, Conclusion};
    use arrows_core::{Cell, Direction};

    #[test]
    fn already_solved_returns_immediately() {
        let puzzle = Puzzle::from_cells(
            1,
            2,
            vec![Cell::given(Direction::East, 1), Cell::given(Direction::East, 0)],
        );
        let result = solve(&puzzle, &RuleSet::new(vec![]), false).unwrap();
        assert_eq!(result.status, SolverStatus::Solved);
        assert!(result.steps.is_empty());
        assert_eq!(result.max_complexity_used, 0);
    }

    #[test]
    fn single_rule_forces_every_pending_cell() {
        let puzzle = Puzzle::from_cells(
            2,
            2,
            vec![Cell::new(Direction::South, CellState::pending_full(2)); 4],
        );
        let rule = Rule::Fo(FoRule {
            name: "force-one".to_string(),
            condition: Formula::ExistsPosition(
                vec!["p".to_string()],
                Box::new(Formula::Equality(
                    Term::call("val", vec![Term::var("p")]),
                    Term::Constant(ConstantLit::Nil),
                )),
            ),
            conclusions: vec![Conclusion::Set(Term::var("p"), Term::int(1))],
            complexity: 1,
        });
        let result = solve(&puzzle, &RuleSet::new(vec![rule]), false).unwrap();
        for p in result.puzzle.size().points() {
            assert_eq!(result.puzzle.cell(p).state.value(), Some(1));
        }
    }

    #[test]
    fn immediate_contradiction_reports_location() {
        let puzzle = Puzzle::from_cells(1, 1, vec![Cell::given(Direction::South, 1)]);
        let rule = Rule::Fo(FoRule {
            name: "bad".to_string(),
            condition: Formula::ExistsPosition(
                vec!["p".to_string()],
                Box::new(Formula::Equality(Term::call("val", vec![Term::var("p")]), Term::int(1))),
            ),
            conclusions: vec![Conclusion::Set(Term::var("p"), Term::int(0))],
            complexity: 1,
        });
        let result = solve(&puzzle, &RuleSet::new(vec![rule]), false).unwrap();
        assert_eq!(result.status, SolverStatus::NoSolution);
        assert_eq!(result.contradiction_location, Some(Point::new(0, 0)));
    }

    #[test]
    fn backtrack_rule_eliminates_candidate_via_hypothesis() {
        let puzzle = Puzzle::from_cells(
            1,
            2,
            vec![
                Cell::new(Direction::South, CellState::pending_full(2)),
                Cell::given(Direction::South, 0),
            ],
        );
        let eliminator = Rule::Fo(FoRule {
            name: "eliminate-one".to_string(),
            condition: Formula::ExistsPosition(
                vec!["p".to_string()],
                Box::new(Formula::Equality(Term::call("val", vec![Term::var("p")]), Term::int(1))),
            ),
            conclusions: vec![Conclusion::Exclude(Term::var("p"), CompareOp::Eq, Term::int(1))],
            complexity: 1,
        });
        let backtrack = Rule::Backtrack(
            "try-values".to_string(),
            BacktrackRule { complexity: 2, backtrack_depth: 8, rule_depth: 1, max_rule_complexity: 1 },
        );
        let result = solve(&puzzle, &RuleSet::new(vec![eliminator, backtrack]), false).unwrap();
        assert_eq!(result.status, SolverStatus::Solved);
        assert_eq!(result.puzzle.cell(Point::new(0, 0)).state.value(), Some(0));
        assert!(result.steps.iter().any(|s| s.rule_name == "try-values"));
    }
}
