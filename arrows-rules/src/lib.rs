//! Textual rule DSL frontend: tokenizes and parses rule records, type-checks
//! and optimizes each first-order rule, and assembles the result into an
//! [`arrows_logic::RuleSet`].

#![warn(missing_debug_implementations)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unused)]
#![warn(unused_import_braces)]
#![warn(unused_qualifications)]

pub mod builtin;
pub mod error;
pub mod lexer;
pub mod parser;

use arrows_logic::{optimizer, typecheck, Rule, RuleSet};

pub use builtin::default_rules;
pub use error::RuleError;

/// Parses, type-checks and optimizes every rule record in `text`, producing
/// a ready-to-run [`RuleSet`].
///
/// This is the DSL frontend's equivalent of an inherent `RuleSet::load_str`
/// constructor; it lives here rather than on `RuleSet` itself since
/// `arrows-logic` has no dependency on the DSL frontend.
pub fn load_str(text: &str) -> Result<RuleSet, RuleError> {
    let tokens = lexer::tokenize(text)?;
    let parsed = parser::parse_rules(&tokens)?;

    let mut rules = Vec::with_capacity(parsed.len());
    for (name, rule) in parsed {
        match rule {
            parser::ParsedRule::Fo(fo) => {
                typecheck::typecheck_rule(&fo).map_err(|source| RuleError::TypeCheck { name: name.clone(), source })?;
                let optimized = optimizer::optimize(&fo);
                typecheck::typecheck_rule(&optimized)
                    .map_err(|source| RuleError::TypeCheck { name: name.clone(), source })?;
                rules.push(Rule::Fo(optimized));
            }
            parser::ParsedRule::Backtrack(bt) => rules.push(Rule::Backtrack(name, bt)),
        }
    }
    Ok(RuleSet::new(rules))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_single_forcing_rule() {
        let set = load_str("rule force complexity 1: exists p (val(p) = nil ^ ahead_free(p) = 0) => set(p, sees_distinct(p))").unwrap();
        assert_eq!(set.rules().len(), 1);
    }

    #[test]
    fn propagates_parse_errors() {
        assert!(matches!(load_str("rule complexity 1 !! => set(p, 1)"), Err(RuleError::Parse { .. })));
    }

    #[test]
    fn propagates_type_errors() {
        let text = "rule bad complexity 1: exists p (val(p) = nil) => set(p, dir(p))";
        assert!(matches!(load_str(text), Err(RuleError::TypeCheck { .. })));
    }
}
