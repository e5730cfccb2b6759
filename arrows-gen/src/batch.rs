//! Parallel batch driver: runs many independent generation attempts across
//! worker threads and collects the first `target_count` accepted puzzles (or
//! as many as the wall-clock deadline allows).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;

use arrows_core::Puzzle;
use arrows_logic::{RuleSet, SolverResult};

use crate::constraints::Constraint;
use crate::generator::{generate, AttemptOutcome, GeneratorConfig};

/// Batch-level knobs layered on top of a single attempt's [`GeneratorConfig`].
#[derive(Clone, Debug)]
pub struct BatchConfig {
    pub generator: GeneratorConfig,
    pub target_count: usize,
    pub n_jobs: usize,
    pub timeout: Duration,
    /// Wall-clock bound on a single attempt, distinct from `timeout`'s bound
    /// on the whole batch: one generation attempt that runs long no longer
    /// stalls the rest of the batch past this, only itself.
    pub attempt_timeout: Duration,
    pub seed: u64,
}

/// One accepted puzzle plus the trace that solved it.
#[derive(Debug)]
pub struct Accepted {
    pub puzzle: Puzzle,
    pub trace: SolverResult,
}

/// Aggregate rejection counts across an entire batch run, broken down by
/// reason and (for constraint rejections) by constraint name.
#[derive(Clone, Debug, Default)]
pub struct RejectionStats {
    pub pre_check: BTreeMap<String, u32>,
    pub constraint: BTreeMap<String, u32>,
    pub no_solution: u32,
    pub excessive_guessing: u32,
    pub excessive_modifications: u32,
    pub timeout: u32,
    pub solver_errors: u32,
}

impl RejectionStats {
    fn record(&mut self, outcome: &AttemptOutcome) {
        match outcome {
            AttemptOutcome::Accepted { .. } => {}
            AttemptOutcome::RejectedPreCheck { constraint } => {
                *self.pre_check.entry(constraint.clone()).or_insert(0) += 1;
            }
            AttemptOutcome::RejectedConstraint { constraint } => {
                *self.constraint.entry(constraint.clone()).or_insert(0) += 1;
            }
            AttemptOutcome::NoSolution => self.no_solution += 1,
            AttemptOutcome::ExcessiveGuessing => self.excessive_guessing += 1,
            AttemptOutcome::ExcessiveModifications => self.excessive_modifications += 1,
            AttemptOutcome::Timeout => self.timeout += 1,
        }
    }

    fn attempted(&self) -> u32 {
        self.pre_check.values().sum::<u32>()
            + self.constraint.values().sum::<u32>()
            + self.no_solution
            + self.excessive_guessing
            + self.excessive_modifications
            + self.timeout
            + self.solver_errors
    }
}

/// The outcome of a whole batch run.
#[derive(Debug)]
pub struct BatchResult {
    pub accepted: Vec<Accepted>,
    pub stats: RejectionStats,
    pub timed_out: bool,
}

enum WorkerMessage {
    Outcome(AttemptOutcome),
    Error,
}

/// Spawns `config.n_jobs` worker threads, each looping single attempts with
/// its own RNG, until `target_count` puzzles are accepted or the deadline
/// passes.
///
/// Each attempt gets its own deadline (`config.attempt_timeout`), separate
/// from the batch's overall `deadline`: an attempt that overruns its own
/// budget comes back as [`AttemptOutcome::Timeout`] and the worker moves on,
/// instead of one slow attempt silently eating into every other worker's
/// share of the batch deadline.
///
/// Workers are detached, not joined, but they stop promptly rather than
/// running until the batch deadline: `stop` is set as soon as `target_count`
/// is reached, and checked at the top of every attempt loop alongside the
/// deadline. Once this call returns, a worker that was mid-attempt when
/// either signal fired keeps running until it next checks in, sends into a
/// now-closed channel, and exits on its own. Rust gives no safe preemption
/// primitive for a thread running foreign (solver) code, so this call never
/// blocks waiting for stragglers — but a batch can outlive its nominal
/// timeout by the length of one in-flight attempt. Callers needing a hard
/// wall-clock bound should run this in its own process.
pub fn run_batch(
    config: &BatchConfig,
    rules: RuleSet,
    constraints: Arc<Vec<Box<dyn Constraint>>>,
) -> BatchResult {
    let deadline = Instant::now() + config.timeout;
    let (tx, rx): (Sender<WorkerMessage>, Receiver<WorkerMessage>) = bounded(config.n_jobs * 2);
    let rules = Arc::new(rules);
    let stop = Arc::new(AtomicBool::new(false));

    for worker_id in 0..config.n_jobs.max(1) {
        let generator_config = config.generator.clone();
        let rules = Arc::clone(&rules);
        let constraints = Arc::clone(&constraints);
        let tx = tx.clone();
        let stop = Arc::clone(&stop);
        let seed = config.seed.wrapping_add(worker_id as u64);
        let attempt_timeout = config.attempt_timeout;

        thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            loop {
                if Instant::now() >= deadline || stop.load(Ordering::Relaxed) {
                    return;
                }
                let attempt_deadline = Instant::now() + attempt_timeout;
                let message = match generate(&generator_config, &rules, &constraints, &mut rng, attempt_deadline) {
                    Ok(outcome) => WorkerMessage::Outcome(outcome),
                    Err(_) => WorkerMessage::Error,
                };
                if tx.send(message).is_err() {
                    return;
                }
            }
        });
    }
    drop(tx);

    let mut accepted = Vec::new();
    let mut stats = RejectionStats::default();
    let mut timed_out = false;

    loop {
        if accepted.len() >= config.target_count {
            stop.store(true, Ordering::Relaxed);
            break;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            log::info!("run_batch: timed out with {} of {} accepted", accepted.len(), config.target_count);
            timed_out = true;
            stop.store(true, Ordering::Relaxed);
            break;
        }
        select! {
            recv(rx) -> msg => match msg {
                Ok(WorkerMessage::Outcome(outcome)) => {
                    stats.record(&outcome);
                    if let AttemptOutcome::Accepted { puzzle, trace } = outcome {
                        log::debug!("run_batch: accepted puzzle {}/{}", accepted.len() + 1, config.target_count);
                        accepted.push(Accepted { puzzle, trace });
                        if accepted.len() >= config.target_count {
                            stop.store(true, Ordering::Relaxed);
                        }
                    }
                }
                Ok(WorkerMessage::Error) => stats.solver_errors += 1,
                Err(_) => break,
            },
            default(remaining) => {
                timed_out = true;
                stop.store(true, Ordering::Relaxed);
                break;
            }
        }
    }

    log::info!(
        "run_batch: finished with {} accepted out of {} attempts, timed_out={timed_out}",
        accepted.len(),
        stats.attempted(),
    );
    BatchResult { accepted, stats, timed_out }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrows_logic::{Conclusion, FoRule, Formula, Rule, Term};

    fn trivial_rules() -> RuleSet {
        use arrows_logic::model::fol::ConstantLit;
        RuleSet::new(vec![Rule::Fo(FoRule {
            name: "force".to_string(),
            condition: Formula::ExistsPosition(
                vec!["p".to_string()],
                Box::new(Formula::Equality(
                    Term::call("val", vec![Term::var("p")]),
                    Term::Constant(ConstantLit::Nil),
                )),
            ),
            conclusions: vec![Conclusion::Set(Term::var("p"), Term::call("sees_distinct", vec![Term::var("p")]))],
            complexity: 1,
        })])
    }

    #[test]
    fn rejection_stats_record_every_outcome_kind() {
        let mut stats = RejectionStats::default();
        stats.record(&AttemptOutcome::RejectedPreCheck { constraint: "c".to_string() });
        stats.record(&AttemptOutcome::RejectedConstraint { constraint: "c".to_string() });
        stats.record(&AttemptOutcome::NoSolution);
        stats.record(&AttemptOutcome::ExcessiveGuessing);
        stats.record(&AttemptOutcome::ExcessiveModifications);
        stats.record(&AttemptOutcome::Timeout);
        assert_eq!(stats.attempted(), 6);
        assert_eq!(stats.pre_check.get("c"), Some(&1));
        assert_eq!(stats.constraint.get("c"), Some(&1));
        assert_eq!(stats.timeout, 1);
    }

    #[test]
    fn run_batch_returns_within_the_deadline_on_a_tiny_grid() {
        let config = BatchConfig {
            generator: GeneratorConfig { rows: 2, cols: 2, allow_diagonals: false, max_complexity: None },
            target_count: 1,
            n_jobs: 2,
            timeout: Duration::from_millis(200),
            attempt_timeout: Duration::from_millis(200),
            seed: 42,
        };
        let result = run_batch(&config, trivial_rules(), Arc::new(Vec::new()));
        assert!(result.accepted.len() <= config.target_count);
    }

    #[test]
    fn run_batch_stops_workers_promptly_once_target_count_is_reached() {
        let config = BatchConfig {
            generator: GeneratorConfig { rows: 2, cols: 2, allow_diagonals: false, max_complexity: None },
            target_count: 1,
            n_jobs: 4,
            timeout: Duration::from_secs(5),
            attempt_timeout: Duration::from_secs(5),
            seed: 99,
        };
        let result = run_batch(&config, trivial_rules(), Arc::new(Vec::new()));
        assert!(!result.accepted.is_empty());
        assert!(!result.timed_out);
    }
}
