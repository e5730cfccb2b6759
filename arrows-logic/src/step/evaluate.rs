// Copyright (c) 2016 arrows-logic developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! The witness-enumerating formula evaluator.
//!
//! `enumerate` drives a caller-supplied callback once per satisfying witness
//! instead of returning a boxed `Iterator`: the callback's [`ControlFlow`]
//! answer lets a caller stop after the first witness without the evaluator
//! ever computing the rest, which is what "lazy, finite sequence" amounts to
//! for a quantifier domain that is already bounded by grid size.

use std::collections::HashMap;

use crate::error::LogicError;
use crate::model::fol::{ConstantLit, Formula, Sort, Term, Value};
use crate::model::universe::Universe;

/// A partial variable binding built up while searching for witnesses.
pub type Assignment = HashMap<String, Value>;

/// Whether the caller wants more witnesses.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControlFlow {
    Continue,
    Stop,
}

pub fn eval_term(universe: &Universe, term: &Term, assignment: &Assignment) -> Result<Value, LogicError> {
    match term {
        Term::Variable(name) => {
            assignment.get(name).cloned().ok_or_else(|| LogicError::UndefinedVariable(name.clone()))
        }
        Term::Constant(ConstantLit::Int(v)) => Ok(Value::Number(*v)),
        Term::Constant(ConstantLit::Oob) => Ok(Value::Oob),
        Term::Constant(ConstantLit::Nil) => Ok(Value::Nil),
        Term::FunctionCall(name, args) => {
            let values: Result<Vec<Value>, LogicError> =
                args.iter().map(|a| eval_term(universe, a, assignment)).collect();
            universe.call_function(name, &values?)
        }
    }
}

fn cartesian_combos(universe: &Universe, vars: &[String], sort: Sort, assignment: &Assignment) -> Vec<Assignment> {
    let domain = universe.domain(sort);
    let mut combos = vec![assignment.clone()];
    for v in vars {
        let mut next = Vec::with_capacity(combos.len() * domain.len().max(1));
        for c in &combos {
            for val in &domain {
                let mut c2 = c.clone();
                c2.insert(v.clone(), val.clone());
                next.push(c2);
            }
        }
        combos = next;
    }
    combos
}

/// Does `body` have at least one witness under `assignment`?
fn has_witness(universe: &Universe, body: &Formula, assignment: &Assignment) -> Result<bool, LogicError> {
    let mut found = false;
    enumerate(universe, body, assignment, &mut |_| {
        found = true;
        Ok(ControlFlow::Stop)
    })?;
    Ok(found)
}

/// Enumerates every witness of `formula` under `assignment`, invoking
/// `on_witness` for each. Returns [`ControlFlow::Stop`] as soon as the
/// callback does, short-circuiting the remaining search.
pub fn enumerate(
    universe: &Universe,
    formula: &Formula,
    assignment: &Assignment,
    on_witness: &mut dyn FnMut(&Assignment) -> Result<ControlFlow, LogicError>,
) -> Result<ControlFlow, LogicError> {
    match formula {
        Formula::Relation(name, args) => {
            let values: Result<Vec<Value>, LogicError> =
                args.iter().map(|a| eval_term(universe, a, assignment)).collect();
            if universe.call_relation(name, &values?)? {
                on_witness(assignment)
            } else {
                Ok(ControlFlow::Continue)
            }
        }
        Formula::Equality(l, r) => {
            let lv = eval_term(universe, l, assignment)?;
            let rv = eval_term(universe, r, assignment)?;
            if lv == rv {
                on_witness(assignment)
            } else {
                Ok(ControlFlow::Continue)
            }
        }
        Formula::Not(f) => {
            if has_witness(universe, f, assignment)? {
                Ok(ControlFlow::Continue)
            } else {
                on_witness(assignment)
            }
        }
        Formula::And(fs) => and_rec(universe, fs, 0, assignment, on_witness),
        Formula::Or(fs) => {
            for f in fs {
                if enumerate(universe, f, assignment, on_witness)? == ControlFlow::Stop {
                    return Ok(ControlFlow::Stop);
                }
            }
            Ok(ControlFlow::Continue)
        }
        Formula::ExistsPosition(vars, body) => {
            for combo in cartesian_combos(universe, vars, Sort::Position, assignment) {
                if enumerate(universe, body, &combo, on_witness)? == ControlFlow::Stop {
                    return Ok(ControlFlow::Stop);
                }
            }
            Ok(ControlFlow::Continue)
        }
        Formula::ExistsNumber(vars, body) => {
            for combo in cartesian_combos(universe, vars, Sort::Number, assignment) {
                if enumerate(universe, body, &combo, on_witness)? == ControlFlow::Stop {
                    return Ok(ControlFlow::Stop);
                }
            }
            Ok(ControlFlow::Continue)
        }
        Formula::ForAllPosition(vars, body) => forall_rec(universe, vars, Sort::Position, assignment, body, on_witness),
        Formula::ForAllNumber(vars, body) => forall_rec(universe, vars, Sort::Number, assignment, body, on_witness),
    }
}

fn and_rec(
    universe: &Universe,
    fs: &[Formula],
    idx: usize,
    assignment: &Assignment,
    on_witness: &mut dyn FnMut(&Assignment) -> Result<ControlFlow, LogicError>,
) -> Result<ControlFlow, LogicError> {
    if idx == fs.len() {
        return on_witness(assignment);
    }
    enumerate(universe, &fs[idx], assignment, &mut |a| and_rec(universe, fs, idx + 1, a, on_witness))
}

fn forall_rec(
    universe: &Universe,
    vars: &[String],
    sort: Sort,
    assignment: &Assignment,
    body: &Formula,
    on_witness: &mut dyn FnMut(&Assignment) -> Result<ControlFlow, LogicError>,
) -> Result<ControlFlow, LogicError> {
    for combo in cartesian_combos(universe, vars, sort, assignment) {
        if !has_witness(universe, body, &combo)? {
            return Ok(ControlFlow::Continue);
        }
    }
    on_witness(assignment)
}
