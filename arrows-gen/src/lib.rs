//! Randomised puzzle generation: single-attempt search (`generator`),
//! acceptance predicates (`constraints`), and the parallel batch driver
//! (`batch`) that runs many attempts at once.

#![warn(missing_debug_implementations)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unused)]
#![warn(unused_import_braces)]
#![warn(unused_qualifications)]

pub mod batch;
pub mod constraints;
pub mod generator;

pub use batch::{run_batch, Accepted, BatchConfig, BatchResult, RejectionStats};
pub use constraints::{
    Bound, Constraint, FollowingArrowsFraction, NumberFraction, PrefilledCellsFraction,
    RuleComplexityFraction, UsesRule,
};
pub use generator::{generate, AttemptOutcome, GeneratorConfig, GeneratorConfigError};
