//! User-facing text output. Library crates only ever log; this module is the
//! one place allowed to `println!`, mirroring the teacher's separation of
//! `solve::run` (orchestration) from `pprint` (presentation).

use arrows_logic::{SolverResult, SolverStatus};

use arrows_gen::{Accepted, RejectionStats};

pub fn print_solution(trace: &SolverResult) {
    println!("{}", trace.puzzle);
    println!(
        "status: {:?}  steps: {}  max complexity used: {}",
        trace.status,
        trace.steps.len(),
        trace.max_complexity_used
    );
    if !trace.rule_counts.is_empty() {
        println!("rule usage:");
        let mut counts: Vec<(&String, &u32)> = trace.rule_counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (name, count) in counts {
            println!("  {name:<28} {count}");
        }
    }
    if let (SolverStatus::NoSolution, Some(p)) = (trace.status, trace.contradiction_location) {
        println!("contradiction at {p}");
    }
}

pub fn print_generation_result(index: usize, accepted: &Accepted) {
    println!("# puzzle {index}");
    println!("{}", accepted.puzzle);
    println!(
        "steps: {}  max complexity used: {}",
        accepted.trace.steps.len(),
        accepted.trace.max_complexity_used
    );
}

pub fn print_batch_stats(stats: &RejectionStats, accepted_count: usize, timed_out: bool) {
    println!("accepted: {accepted_count}");
    println!("timed out: {timed_out}");
    if !stats.pre_check.is_empty() {
        println!("rejected (pre-check):");
        for (name, count) in &stats.pre_check {
            println!("  {name:<28} {count}");
        }
    }
    if !stats.constraint.is_empty() {
        println!("rejected (constraint):");
        for (name, count) in &stats.constraint {
            println!("  {name:<28} {count}");
        }
    }
    println!("rejected (no solution): {}", stats.no_solution);
    println!("rejected (excessive guessing): {}", stats.excessive_guessing);
    println!("rejected (excessive modifications): {}", stats.excessive_modifications);
    println!("rejected (timeout): {}", stats.timeout);
    if stats.solver_errors > 0 {
        println!("solver errors: {}", stats.solver_errors);
    }
}
