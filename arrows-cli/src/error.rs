//! The direct generalization of the teacher's `cli::error::AppError`: one
//! variant per wrapped error source, with `From` impls so `?` works end to
//! end from `main`.

use std::io;

use arrows_core::ParsePuzzleError;
use arrows_gen::GeneratorConfigError;
use arrows_logic::LogicError;
use arrows_rules::RuleError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("parse puzzle error: {0}")]
    ParsePuzzle(#[from] ParsePuzzleError),
    #[error("logic error: {0}")]
    Logic(#[from] LogicError),
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),
    #[error("invalid generator configuration: {0}")]
    GeneratorConfig(#[from] GeneratorConfigError),
    #[error("no solution found")]
    NoSolution,
    #[error("{0}")]
    Cli(String),
}

impl AppError {
    /// Exit codes mirror the teacher CLI's flat `unwrap_or_else` exits, made
    /// explicit rather than a single catch-all 255.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Rule(_) | AppError::ParsePuzzle(_) => 1,
            AppError::Io(_) | AppError::NoSolution | AppError::Logic(_) | AppError::GeneratorConfig(_) => 2,
            AppError::Cli(_) => 1,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_and_parse_errors_exit_one() {
        assert_eq!(AppError::Cli("bad flag".to_string()).exit_code(), 1);
    }

    #[test]
    fn no_solution_exits_two() {
        assert_eq!(AppError::NoSolution.exit_code(), 2);
    }
}
