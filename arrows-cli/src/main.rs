#![warn(missing_debug_implementations)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unused)]
#![warn(unused_import_braces)]
#![warn(unused_qualifications)]

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use arrows_core::Puzzle;
use arrows_gen::{generate, run_batch, AttemptOutcome, BatchConfig, Bound, Constraint, GeneratorConfig, PrefilledCellsFraction};
use arrows_logic::{solve, RuleSet, SolverStatus};
use arrows_rules::load_str;

mod constraint_spec;
mod error;
mod output;

use error::{AppError, AppResult};

#[derive(Parser, Debug)]
#[command(name = "arrows", about = "Solve and generate Japanese Arrows puzzles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve a puzzle read from stdin or --input.
    Solve(SolveArgs),
    /// Generate one or more puzzles.
    Generate(GenerateArgs),
    /// Operate on a rule file.
    #[command(subcommand)]
    Rules(RulesCommand),
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// Load and validate a rule file without solving anything.
    Check(RulesArgs),
}

#[derive(clap::Args, Debug)]
struct SolveArgs {
    /// Rule file to load; the built-in rule pack is used if omitted.
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Puzzle text file; stdin is used if omitted.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long = "max-complexity")]
    max_complexity: Option<u32>,
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    #[arg(long)]
    rows: usize,
    #[arg(long)]
    cols: usize,
    #[arg(long)]
    diagonals: bool,
    #[arg(long)]
    rules: Option<PathBuf>,
    #[arg(long = "max-complexity")]
    max_complexity: Option<u32>,
    #[arg(long, default_value_t = 1)]
    count: usize,
    #[arg(long, default_value_t = 1)]
    jobs: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long = "timeout-seconds", default_value_t = 30)]
    timeout_seconds: u64,
    /// Wall-clock bound on a single generation attempt, distinct from the
    /// overall batch timeout.
    #[arg(long = "attempt-timeout-seconds", default_value_t = 10)]
    attempt_timeout_seconds: u64,
    /// Pin the prefilled (given) cell count exactly.
    #[arg(long)]
    prefilled: Option<u32>,
    #[arg(long = "constraint")]
    constraints: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct RulesArgs {
    file: PathBuf,
    #[arg(long)]
    explain: bool,
}

fn read_puzzle_text(input: &Option<PathBuf>) -> AppResult<String> {
    let mut buf = String::new();
    match input {
        Some(path) => {
            buf = fs::read_to_string(path)?;
        }
        None => {
            io::stdin().read_to_string(&mut buf)?;
        }
    }
    Ok(buf)
}

fn load_rules(path: &Option<PathBuf>) -> AppResult<RuleSet> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(load_str(&text)?)
        }
        None => Ok(arrows_rules::default_rules()),
    }
}

fn run_solve(args: SolveArgs) -> AppResult<()> {
    let text = read_puzzle_text(&args.input)?;
    let puzzle: Puzzle = text.parse()?;
    let mut rules = load_rules(&args.rules)?;
    if let Some(max) = args.max_complexity {
        rules = rules.filtered(Some(max));
    }

    let trace = solve(&puzzle, &rules, false)?;
    output::print_solution(&trace);

    if trace.status == SolverStatus::NoSolution {
        return Err(AppError::NoSolution);
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> AppResult<()> {
    let generator_config = GeneratorConfig {
        rows: args.rows,
        cols: args.cols,
        allow_diagonals: args.diagonals,
        max_complexity: args.max_complexity,
    };
    generator_config.validate()?;

    let rules = load_rules(&args.rules)?;

    let mut constraints: Vec<Box<dyn Constraint>> = Vec::new();
    for spec in &args.constraints {
        constraints.push(constraint_spec::parse_constraint_spec(spec)?);
    }
    if let Some(n) = args.prefilled {
        constraints.push(Box::new(PrefilledCellsFraction::new(Bound {
            min_count: Some(n),
            max_count: Some(n),
            ..Bound::default()
        })));
    }
    let constraints = Arc::new(constraints);

    let seed = args.seed.unwrap_or_else(|| {
        let mut seed_rng = StdRng::from_entropy();
        seed_rng.gen()
    });

    let attempt_timeout = Duration::from_secs(args.attempt_timeout_seconds);

    if args.jobs <= 1 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut accepted_count = 0;
        for _ in 0..args.count {
            let deadline = Instant::now() + attempt_timeout;
            match generate(&generator_config, &rules, &constraints, &mut rng, deadline)? {
                AttemptOutcome::Accepted { puzzle, trace } => {
                    accepted_count += 1;
                    output::print_generation_result(accepted_count, &arrows_gen::Accepted { puzzle, trace });
                }
                other => log::warn!("generate: rejected attempt ({other:?})"),
            }
        }
        return Ok(());
    }

    let batch_config = BatchConfig {
        generator: generator_config,
        target_count: args.count,
        n_jobs: args.jobs,
        timeout: Duration::from_secs(args.timeout_seconds),
        attempt_timeout,
        seed,
    };
    let result = run_batch(&batch_config, rules, constraints);
    for (index, accepted) in result.accepted.iter().enumerate() {
        output::print_generation_result(index + 1, accepted);
    }
    output::print_batch_stats(&result.stats, result.accepted.len(), result.timed_out);

    if result.accepted.is_empty() {
        return Err(AppError::NoSolution);
    }
    Ok(())
}

fn run_rules_check(args: RulesArgs) -> AppResult<()> {
    let text = fs::read_to_string(&args.file)?;
    let rules = load_str(&text)?;
    println!("{} rule(s) loaded successfully", rules.rules().len());
    if args.explain {
        for rule in rules.rules() {
            println!("  {:<32} complexity {}", rule.name(), rule.complexity());
        }
    }
    Ok(())
}

fn run(cli: Cli) -> AppResult<()> {
    match cli.command {
        Command::Solve(args) => run_solve(args),
        Command::Generate(args) => run_generate(args),
        Command::Rules(RulesCommand::Check(args)) => run_rules_check(args),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{err}");
        process::exit(err.exit_code());
    }
}
