//! Single-attempt puzzle generation: random arrows, outward-arrow damping,
//! solver-driven completion with random guessing, and arrow rotation on
//! contradiction.

use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use arrows_core::{Cell, CellState, Direction, PathCache, Point, Puzzle, Size};
use arrows_logic::{solve, LogicError, RuleSet, SolverResult, SolverStatus};

use crate::constraints::Constraint;

const OUTWARD_THRESHOLD: f64 = 0.10;
const MAX_GUESSES_FRACTION: f64 = 0.15;
const MAX_MODIFICATIONS_FRACTION: f64 = 0.10;

/// Parameters of a single generation attempt. Batch-level knobs
/// (`n_jobs`, `timeout_seconds`, `max_attempts`) live in [`crate::batch`],
/// since they govern how many attempts run, not what one attempt looks like.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub rows: usize,
    pub cols: usize,
    pub allow_diagonals: bool,
    pub max_complexity: Option<u32>,
}

impl Default for GeneratorConfig {
    fn default() -> GeneratorConfig {
        GeneratorConfig { rows: 10, cols: 10, allow_diagonals: false, max_complexity: None }
    }
}

/// A `GeneratorConfig` that fails to describe any grid at all.
#[derive(Debug, Error)]
pub enum GeneratorConfigError {
    #[error("grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), GeneratorConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GeneratorConfigError::EmptyGrid { rows: self.rows, cols: self.cols });
        }
        Ok(())
    }

    fn allowed_directions(&self) -> &'static [Direction] {
        if self.allow_diagonals {
            &Direction::ALL
        } else {
            &Direction::CARDINAL
        }
    }
}

/// The outcome of one `generate` call.
#[derive(Debug)]
pub enum AttemptOutcome {
    Accepted { puzzle: Puzzle, trace: SolverResult },
    RejectedPreCheck { constraint: String },
    RejectedConstraint { constraint: String },
    NoSolution,
    ExcessiveGuessing,
    ExcessiveModifications,
    Timeout,
}

fn caps(cell_count: usize) -> (u32, u32) {
    let guesses = ((cell_count as f64 * MAX_GUESSES_FRACTION).ceil() as u32).max(3);
    let modifications = ((cell_count as f64 * MAX_MODIFICATIONS_FRACTION).ceil() as u32).max(3);
    (guesses, modifications)
}

fn points_out(size: Size, directions: &[(Point, Direction)]) -> Vec<usize> {
    directions
        .iter()
        .enumerate()
        .filter(|(_, &(p, d))| !size.contains(p + d.delta()))
        .map(|(idx, _)| idx)
        .collect()
}

fn random_arrow_puzzle(config: &GeneratorConfig, rng: &mut impl Rng) -> Puzzle {
    let allowed = config.allowed_directions();
    let size = Size::new(config.rows, config.cols);
    let limit = config.rows.max(config.cols).max(1);

    let mut dirs: Vec<(Point, Direction)> =
        size.points().map(|p| (p, allowed[rng.gen_range(0..allowed.len())])).collect();

    let threshold = ((config.rows * config.cols) as f64 * OUTWARD_THRESHOLD).floor() as usize;
    loop {
        let outward = points_out(size, &dirs);
        if outward.len() <= threshold {
            break;
        }
        let idx = outward[rng.gen_range(0..outward.len())];
        dirs[idx].1 = dirs[idx].1.opposite();
    }

    let cells = dirs.into_iter().map(|(_, d)| Cell::new(d, CellState::pending_full(limit))).collect();
    Puzzle::from_cells(config.rows, config.cols, cells)
}

fn random_pending_guess(trace: &SolverResult, rng: &mut impl Rng) -> (Point, u32) {
    let pending: Vec<Point> = trace
        .puzzle
        .size()
        .points()
        .filter(|&p| matches!(trace.puzzle.cell(p).state, CellState::Pending(_)))
        .collect();
    let p = pending[rng.gen_range(0..pending.len())];
    let values: Vec<u32> = trace.puzzle.cell(p).state.effective_candidates().iter().collect();
    let v = values[rng.gen_range(0..values.len())];
    (p, v)
}

/// Runs one generation attempt against `rules`, accepting only when every
/// constraint's `check` passes on the final SOLVED trace.
///
/// `base` holds the arrows actually committed to the grid; guesses and
/// rotations are tried against a working copy and folded back into `base`
/// only once a full solve succeeds.
///
/// `deadline` bounds this one attempt, not the batch: it is checked at each
/// rotation and each guess, the same cooperative checkpoints the rotation and
/// guess caps already use, and yields [`AttemptOutcome::Timeout`] rather than
/// running unbounded. Checked only between solver calls, not while one is in
/// flight — Rust has no safe way to preempt a thread mid-`solve`.
pub fn generate(
    config: &GeneratorConfig,
    rules: &RuleSet,
    constraints: &[Box<dyn Constraint>],
    rng: &mut impl Rng,
    deadline: Instant,
) -> Result<AttemptOutcome, LogicError> {
    let rules = match config.max_complexity {
        Some(max) => rules.filtered(Some(max)),
        None => rules.clone(),
    };

    let mut base = random_arrow_puzzle(config, rng);
    let path_cache = PathCache::build(&base);
    for c in constraints {
        if !c.pre_check(&base, &path_cache) {
            return Ok(AttemptOutcome::RejectedPreCheck { constraint: c.name().to_string() });
        }
    }

    let (max_guesses, max_modifications) = caps(config.rows * config.cols);
    let mut modifications = 0u32;

    loop {
        if Instant::now() >= deadline {
            return Ok(AttemptOutcome::Timeout);
        }
        let mut working = base.clone();
        let mut guesses: Vec<(Point, u32)> = Vec::new();
        let mut reuse_candidates = false;

        loop {
            if Instant::now() >= deadline {
                return Ok(AttemptOutcome::Timeout);
            }
            let trace = solve(&working, &rules, reuse_candidates)?;
            match trace.status {
                SolverStatus::Solved => {
                    for c in constraints {
                        if !c.check(&trace) {
                            return Ok(AttemptOutcome::RejectedConstraint { constraint: c.name().to_string() });
                        }
                    }
                    let mut emitted = base.clone();
                    for &(p, v) in &guesses {
                        *emitted.cell_mut(p) = Cell::given(emitted.cell(p).direction, v);
                    }
                    return Ok(AttemptOutcome::Accepted { puzzle: emitted, trace });
                }
                SolverStatus::Underconstrained => {
                    if guesses.len() as u32 >= max_guesses {
                        log::debug!("generate: giving up, {max_guesses} guesses exhausted");
                        return Ok(AttemptOutcome::ExcessiveGuessing);
                    }
                    let (p, v) = random_pending_guess(&trace, rng);
                    log::trace!("generate: guessing {v} at {p}");
                    working = trace.puzzle;
                    *working.cell_mut(p) = Cell::given(working.cell(p).direction, v);
                    guesses.push((p, v));
                    reuse_candidates = true;
                }
                SolverStatus::NoSolution => {
                    let Some(p) = trace.contradiction_location else {
                        return Ok(AttemptOutcome::NoSolution);
                    };
                    if modifications >= max_modifications {
                        log::debug!("generate: giving up, {max_modifications} rotations exhausted");
                        return Ok(AttemptOutcome::ExcessiveModifications);
                    }
                    modifications += 1;
                    log::trace!("generate: rotating arrow at {p} after contradiction");
                    base.set_direction(p, base.cell(p).direction.rotate_within(config.allowed_directions()));
                    break;
                }
            }
        }
    }
}
