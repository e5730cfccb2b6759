// Copyright (c) 2016 arrows-logic developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Type checking for rule conditions and conclusions.

use std::collections::{HashMap, HashSet};

use crate::error::LogicError;
use crate::model::fol::{ConstantLit, Formula, Sort, Term};
use crate::model::rule::FoRule;

fn function_signature(name: &str) -> Option<(Vec<Sort>, Sort)> {
    use Sort::*;
    match name {
        "next" => Some((vec![Position], Position)),
        "val" => Some((vec![Position], Number)),
        "ahead" => Some((vec![Position], Number)),
        "behind" => Some((vec![Position], Number)),
        "ahead_free" => Some((vec![Position], Number)),
        "between_free" => Some((vec![Position, Position], Number)),
        "dir" => Some((vec![Position], Direction)),
        "sees_distinct" => Some((vec![Position], Number)),
        "sees_distinct_candidates" => Some((vec![Position], Number)),
        "min_candidate" => Some((vec![Position], Number)),
        "max_candidate" => Some((vec![Position], Number)),
        "+" | "-" => Some((vec![Number, Number], Number)),
        _ => None,
    }
}

fn relation_signature(name: &str) -> Option<Vec<Sort>> {
    use Sort::*;
    match name {
        "points_at" => Some(vec![Position, Position]),
        "candidate" => Some(vec![Position, Number]),
        "sees_value" => Some(vec![Position, Number]),
        "<" | ">" | "<=" | ">=" => Some(vec![Number, Number]),
        _ => None,
    }
}

/// Infers the sort of `term`, checking function-call arities and argument
/// sorts along the way.
pub fn typecheck_term(term: &Term, scope: &HashMap<String, Sort>) -> Result<Sort, LogicError> {
    match term {
        Term::Variable(name) => scope
            .get(name)
            .copied()
            .ok_or_else(|| LogicError::TypeError(format!("undeclared variable: {name}"))),
        Term::Constant(ConstantLit::Int(_)) | Term::Constant(ConstantLit::Nil) => Ok(Sort::Number),
        Term::Constant(ConstantLit::Oob) => Ok(Sort::Position),
        Term::FunctionCall(name, args) => {
            let (arg_sorts, result_sort) =
                function_signature(name).ok_or_else(|| LogicError::UnknownSymbol(name.clone()))?;
            if args.len() != arg_sorts.len() {
                return Err(LogicError::TypeError(format!(
                    "{name} expects {} argument(s), got {}",
                    arg_sorts.len(),
                    args.len()
                )));
            }
            for (arg, expected) in args.iter().zip(&arg_sorts) {
                let actual = typecheck_term(arg, scope)?;
                if actual != *expected {
                    return Err(LogicError::TypeError(format!(
                        "{name} argument has sort {actual:?}, expected {expected:?}"
                    )));
                }
            }
            Ok(result_sort)
        }
    }
}

/// Type-checks `formula`, adding each quantifier's bound variables to
/// `scope` as they come into scope.
pub fn typecheck_formula(formula: &Formula, scope: &mut HashMap<String, Sort>) -> Result<(), LogicError> {
    match formula {
        Formula::Relation(name, args) => {
            let arg_sorts = relation_signature(name).ok_or_else(|| LogicError::UnknownSymbol(name.clone()))?;
            if args.len() != arg_sorts.len() {
                return Err(LogicError::TypeError(format!(
                    "{name} expects {} argument(s), got {}",
                    arg_sorts.len(),
                    args.len()
                )));
            }
            for (arg, expected) in args.iter().zip(&arg_sorts) {
                let actual = typecheck_term(arg, scope)?;
                if actual != *expected {
                    return Err(LogicError::TypeError(format!(
                        "{name} argument has sort {actual:?}, expected {expected:?}"
                    )));
                }
            }
            Ok(())
        }
        Formula::Equality(l, r) => {
            let ls = typecheck_term(l, scope)?;
            let rs = typecheck_term(r, scope)?;
            if ls != rs {
                return Err(LogicError::TypeError(format!("equality between {ls:?} and {rs:?}")));
            }
            Ok(())
        }
        Formula::Not(f) => typecheck_formula(f, scope),
        Formula::And(fs) | Formula::Or(fs) => {
            for f in fs {
                typecheck_formula(f, scope)?;
            }
            Ok(())
        }
        Formula::ExistsPosition(vars, body) | Formula::ForAllPosition(vars, body) => {
            for v in vars {
                scope.insert(v.clone(), Sort::Position);
            }
            typecheck_formula(body, scope)
        }
        Formula::ExistsNumber(vars, body) | Formula::ForAllNumber(vars, body) => {
            for v in vars {
                scope.insert(v.clone(), Sort::Number);
            }
            typecheck_formula(body, scope)
        }
    }
}

/// Variables bound by an `Exists` quantifier that is not nested under a
/// `Not` or `ForAll` — the only variables a conclusion may reference.
fn existential_prefix_vars(formula: &Formula, out: &mut HashSet<String>) {
    match formula {
        Formula::ExistsPosition(vars, body) | Formula::ExistsNumber(vars, body) => {
            out.extend(vars.iter().cloned());
            existential_prefix_vars(body, out);
        }
        Formula::And(fs) | Formula::Or(fs) => {
            for f in fs {
                existential_prefix_vars(f, out);
            }
        }
        Formula::Relation(..) | Formula::Equality(..) | Formula::Not(_) => {}
        Formula::ForAllPosition(..) | Formula::ForAllNumber(..) => {}
    }
}

/// Type-checks a full rule: its condition, then each conclusion's sorts and
/// variable scoping against the condition's existential prefix.
pub fn typecheck_rule(rule: &FoRule) -> Result<(), LogicError> {
    let mut scope = HashMap::new();
    typecheck_formula(&rule.condition, &mut scope)?;

    let mut prefix_vars = HashSet::new();
    existential_prefix_vars(&rule.condition, &mut prefix_vars);

    for c in &rule.conclusions {
        let pos_sort = typecheck_term(c.position_term(), &scope)?;
        if pos_sort != Sort::Position {
            return Err(LogicError::TypeError(format!(
                "conclusion position term must be POSITION, got {pos_sort:?}"
            )));
        }
        for v in c.value_terms() {
            let vs = typecheck_term(v, &scope)?;
            if vs != Sort::Number {
                return Err(LogicError::TypeError(format!("conclusion value term must be NUMBER, got {vs:?}")));
            }
        }

        let mut used = HashSet::new();
        c.position_term().free_vars(&mut used);
        for v in c.value_terms() {
            v.free_vars(&mut used);
        }
        for v in &used {
            if !prefix_vars.contains(v) {
                return Err(LogicError::TypeError(format!(
                    "variable {v:?} used in a conclusion is not bound by the condition's existential prefix"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rule::{CompareOp, Conclusion};

    fn forcing_rule() -> FoRule {
        FoRule {
            name: "force".to_string(),
            condition: Formula::ExistsPosition(
                vec!["p".to_string()],
                Box::new(Formula::Equality(Term::call("val", vec![Term::var("p")]), Term::Constant(ConstantLit::Nil))),
            ),
            conclusions: vec![Conclusion::Set(Term::var("p"), Term::int(1))],
            complexity: 1,
        }
    }

    #[test]
    fn well_typed_rule_passes() {
        assert!(typecheck_rule(&forcing_rule()).is_ok());
    }

    #[test]
    fn conclusion_referencing_unbound_variable_fails() {
        let mut rule = forcing_rule();
        rule.conclusions = vec![Conclusion::Set(Term::var("q"), Term::int(1))];
        assert!(matches!(typecheck_rule(&rule), Err(LogicError::TypeError(_))));
    }

    #[test]
    fn variable_bound_only_under_forall_is_out_of_conclusion_scope() {
        let mut rule = forcing_rule();
        rule.condition = Formula::ForAllPosition(
            vec!["p".to_string()],
            Box::new(Formula::Equality(Term::call("val", vec![Term::var("p")]), Term::Constant(ConstantLit::Nil))),
        );
        assert!(matches!(typecheck_rule(&rule), Err(LogicError::TypeError(_))));
    }

    #[test]
    fn exclude_value_term_must_be_number() {
        let mut rule = forcing_rule();
        rule.conclusions =
            vec![Conclusion::Exclude(Term::var("p"), CompareOp::Eq, Term::call("dir", vec![Term::var("p")]))];
        assert!(matches!(typecheck_rule(&rule), Err(LogicError::TypeError(_))));
    }
}
