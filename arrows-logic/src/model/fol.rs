// Copyright (c) 2016 arrows-logic developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Terms, formulas and runtime values of the two-sorted first-order logic.

use std::collections::HashSet;

use arrows_core::{Direction, Point};

/// The sort of a term or a quantified variable.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Sort {
    Position,
    Number,
    Direction,
    Unknown,
}

/// A runtime value produced by evaluating a term.
///
/// Tagged union with a compile-time-fixed variant set, per the interpreter's
/// "dynamic dispatch" design note: no fully dynamic `Box<dyn Any>` value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Position(Point),
    /// The sentinel POSITION value for "off the grid".
    Oob,
    Number(i64),
    /// The sentinel NUMBER value for "no number".
    Nil,
    Direction(Direction),
}

impl Value {
    pub fn sort(&self) -> Sort {
        match self {
            Value::Position(_) | Value::Oob => Sort::Position,
            Value::Number(_) | Value::Nil => Sort::Number,
            Value::Direction(_) => Sort::Direction,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<Point> {
        match self {
            Value::Position(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_oob(&self) -> bool {
        matches!(self, Value::Oob)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

/// A literal constant in a term: an integer, or one of the two sentinels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstantLit {
    Int(i64),
    Oob,
    Nil,
}

/// A first-order term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
    Variable(String),
    Constant(ConstantLit),
    FunctionCall(String, Vec<Term>),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Term {
        Term::Variable(name.into())
    }

    pub fn int(v: i64) -> Term {
        Term::Constant(ConstantLit::Int(v))
    }

    pub fn call(name: impl Into<String>, args: Vec<Term>) -> Term {
        Term::FunctionCall(name.into(), args)
    }

    /// Names of every free variable occurring in this term.
    pub fn free_vars(&self, out: &mut HashSet<String>) {
        match self {
            Term::Variable(name) => {
                out.insert(name.clone());
            }
            Term::Constant(_) => {}
            Term::FunctionCall(_, args) => {
                for a in args {
                    a.free_vars(out);
                }
            }
        }
    }

    /// Replaces every occurrence of `var` with `replacement`.
    pub fn substitute(&self, var: &str, replacement: &Term) -> Term {
        match self {
            Term::Variable(name) if name == var => replacement.clone(),
            Term::Variable(_) | Term::Constant(_) => self.clone(),
            Term::FunctionCall(name, args) => Term::FunctionCall(
                name.clone(),
                args.iter().map(|a| a.substitute(var, replacement)).collect(),
            ),
        }
    }
}

/// A typed first-order formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Formula {
    Relation(String, Vec<Term>),
    Equality(Term, Term),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    ExistsPosition(Vec<String>, Box<Formula>),
    ExistsNumber(Vec<String>, Box<Formula>),
    ForAllPosition(Vec<String>, Box<Formula>),
    ForAllNumber(Vec<String>, Box<Formula>),
}

impl Formula {
    pub fn free_vars(&self, out: &mut HashSet<String>) {
        match self {
            Formula::Relation(_, args) => {
                for a in args {
                    a.free_vars(out);
                }
            }
            Formula::Equality(l, r) => {
                l.free_vars(out);
                r.free_vars(out);
            }
            Formula::Not(f) => f.free_vars(out),
            Formula::And(fs) | Formula::Or(fs) => {
                for f in fs {
                    f.free_vars(out);
                }
            }
            Formula::ExistsPosition(vars, body)
            | Formula::ExistsNumber(vars, body)
            | Formula::ForAllPosition(vars, body)
            | Formula::ForAllNumber(vars, body) => {
                let mut inner = HashSet::new();
                body.free_vars(&mut inner);
                for v in vars {
                    inner.remove(v);
                }
                out.extend(inner);
            }
        }
    }

    pub fn substitute(&self, var: &str, replacement: &Term) -> Formula {
        match self {
            Formula::Relation(name, args) => Formula::Relation(
                name.clone(),
                args.iter().map(|a| a.substitute(var, replacement)).collect(),
            ),
            Formula::Equality(l, r) => {
                Formula::Equality(l.substitute(var, replacement), r.substitute(var, replacement))
            }
            Formula::Not(f) => Formula::Not(Box::new(f.substitute(var, replacement))),
            Formula::And(fs) => {
                Formula::And(fs.iter().map(|f| f.substitute(var, replacement)).collect())
            }
            Formula::Or(fs) => {
                Formula::Or(fs.iter().map(|f| f.substitute(var, replacement)).collect())
            }
            Formula::ExistsPosition(vars, body) if !vars.iter().any(|v| v == var) => {
                Formula::ExistsPosition(vars.clone(), Box::new(body.substitute(var, replacement)))
            }
            Formula::ExistsNumber(vars, body) if !vars.iter().any(|v| v == var) => {
                Formula::ExistsNumber(vars.clone(), Box::new(body.substitute(var, replacement)))
            }
            Formula::ForAllPosition(vars, body) if !vars.iter().any(|v| v == var) => {
                Formula::ForAllPosition(vars.clone(), Box::new(body.substitute(var, replacement)))
            }
            Formula::ForAllNumber(vars, body) if !vars.iter().any(|v| v == var) => {
                Formula::ForAllNumber(vars.clone(), Box::new(body.substitute(var, replacement)))
            }
            // `var` is shadowed by this quantifier's own bound names.
            shadowed @ (Formula::ExistsPosition(..)
            | Formula::ExistsNumber(..)
            | Formula::ForAllPosition(..)
            | Formula::ForAllNumber(..)) => shadowed.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_vars_excludes_bound_variable() {
        let f = Formula::ExistsPosition(
            vec!["p".to_string()],
            Box::new(Formula::Equality(Term::var("p"), Term::var("q"))),
        );
        let mut vars = HashSet::new();
        f.free_vars(&mut vars);
        assert_eq!(vars, HashSet::from(["q".to_string()]));
    }

    #[test]
    fn substitute_replaces_free_occurrences_only() {
        let f = Formula::And(vec![
            Formula::Equality(Term::var("p"), Term::int(1)),
            Formula::ExistsPosition(
                vec!["p".to_string()],
                Box::new(Formula::Equality(Term::var("p"), Term::int(2))),
            ),
        ]);
        let out = f.substitute("p", &Term::var("q"));
        match out {
            Formula::And(parts) => {
                assert_eq!(parts[0], Formula::Equality(Term::var("q"), Term::int(1)));
                assert_eq!(
                    parts[1],
                    Formula::ExistsPosition(
                        vec!["p".to_string()],
                        Box::new(Formula::Equality(Term::var("p"), Term::int(2))),
                    )
                );
            }
            other => panic!("expected And, got {other:?}"),
        }
    }
}
