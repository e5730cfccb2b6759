//! Errors from parsing and validating rule DSL text.

use arrows_logic::LogicError;

/// An error loading a rule file: either the DSL frontend could not parse the
/// text, or a parsed rule failed type checking.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("rule {name:?} failed type check: {source}")]
    TypeCheck { name: String, #[source] source: LogicError },
}
