// Copyright (c) 2016 arrows-logic developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Semantics-preserving rewrites that shrink witness search: existential
//! equality elimination and quantifier miniscoping.

use std::collections::HashSet;

use crate::model::fol::{Formula, Sort, Term};
use crate::model::rule::{Conclusion, FoRule};

fn and_of(mut fs: Vec<Formula>) -> Formula {
    if fs.len() == 1 {
        fs.pop().unwrap()
    } else {
        Formula::And(fs)
    }
}

fn make_exists(sort: Sort, vars: Vec<String>, body: Formula) -> Formula {
    match sort {
        Sort::Position => Formula::ExistsPosition(vars, Box::new(body)),
        Sort::Number => Formula::ExistsNumber(vars, Box::new(body)),
        _ => unreachable!("only Position/Number quantifiers are optimised"),
    }
}

fn conclusions_free_vars(conclusions: &[Conclusion]) -> HashSet<String> {
    let mut used = HashSet::new();
    for c in conclusions {
        c.position_term().free_vars(&mut used);
        for v in c.value_terms() {
            v.free_vars(&mut used);
        }
    }
    used
}

/// True if eliminating `v` (replacing it with `replacement`) would leave the
/// conclusions referencing none of `remaining_vars` while they used to
/// reference `v` — i.e. it would cut every conclusion loose from this
/// quantifier's remaining position variables.
fn would_orphan_conclusions(
    v: &str,
    remaining_vars: &[String],
    conclusions: &[Conclusion],
    replacement: &Term,
) -> bool {
    if !conclusions_free_vars(conclusions).contains(v) {
        return false;
    }
    let substituted: Vec<Conclusion> = conclusions.iter().map(|c| c.substitute(v, replacement)).collect();
    let used_after = conclusions_free_vars(&substituted);
    !remaining_vars.iter().any(|rv| used_after.contains(rv))
}

/// Finds a conjunct of the form `Equality(v, t)` or `Equality(t, v)` with `v`
/// free in neither side's `t`, for some `v` still in `vars` whose `(v, idx)`
/// pair isn't in `skip` (candidates already rejected as conclusion-orphaning).
fn find_eliminable_equality(
    vars: &[String],
    conjuncts: &[Formula],
    skip: &HashSet<(String, usize)>,
) -> Option<(String, Term, usize)> {
    for (idx, conj) in conjuncts.iter().enumerate() {
        let Formula::Equality(l, r) = conj else { continue };
        for v in vars {
            if skip.contains(&(v.clone(), idx)) {
                continue;
            }
            let mut t_free = HashSet::new();
            if let Term::Variable(name) = l {
                if name == v {
                    r.free_vars(&mut t_free);
                    if !t_free.contains(v) {
                        return Some((v.clone(), r.clone(), idx));
                    }
                }
            }
            let mut t_free = HashSet::new();
            if let Term::Variable(name) = r {
                if name == v {
                    l.free_vars(&mut t_free);
                    if !t_free.contains(v) {
                        return Some((v.clone(), l.clone(), idx));
                    }
                }
            }
        }
    }
    None
}

fn eliminate_existential_equalities(
    mut vars: Vec<String>,
    mut conjuncts: Vec<Formula>,
    sort: Sort,
    conclusions: &mut Vec<Conclusion>,
) -> (Vec<String>, Vec<Formula>) {
    let mut skip = HashSet::new();
    loop {
        let Some((v, replacement, idx)) = find_eliminable_equality(&vars, &conjuncts, &skip) else { break };

        let remaining_vars: Vec<String> = vars.iter().filter(|x| **x != v).cloned().collect();
        if sort == Sort::Position && would_orphan_conclusions(&v, &remaining_vars, conclusions, &replacement) {
            // Leave this equality and `v` in place; it would cut every
            // conclusion loose from the quantifier's remaining positions.
            skip.insert((v, idx));
            continue;
        }

        *conclusions = conclusions.iter().map(|c| c.substitute(&v, &replacement)).collect();
        conjuncts = conjuncts
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, f)| f.substitute(&v, &replacement))
            .collect();
        vars = remaining_vars;
        // Conjunct indices shifted; any accumulated skips are now stale.
        skip.clear();
    }
    (vars, conjuncts)
}

fn miniscope(mut vars: Vec<String>, mut conjuncts: Vec<Formula>, sort: Sort) -> Formula {
    let mut idx = 0;
    while idx < vars.len() {
        let v = vars[idx].clone();
        let (with_v, without_v): (Vec<Formula>, Vec<Formula>) = conjuncts.into_iter().partition(|f| {
            let mut fv = HashSet::new();
            f.free_vars(&mut fv);
            fv.contains(&v)
        });
        if !with_v.is_empty() && !without_v.is_empty() {
            let mut next_conjuncts = without_v;
            next_conjuncts.push(make_exists(sort, vec![v], and_of(with_v)));
            conjuncts = next_conjuncts;
            vars.remove(idx);
        } else {
            conjuncts = with_v.into_iter().chain(without_v).collect();
            idx += 1;
        }
    }
    vars.retain(|v| {
        conjuncts.iter().any(|f| {
            let mut fv = HashSet::new();
            f.free_vars(&mut fv);
            fv.contains(v)
        })
    });
    if vars.is_empty() {
        and_of(conjuncts)
    } else {
        make_exists(sort, vars, and_of(conjuncts))
    }
}

fn optimize_exists_and(
    vars: Vec<String>,
    conjuncts: Vec<Formula>,
    sort: Sort,
    conclusions: &mut Vec<Conclusion>,
) -> Formula {
    let (vars, conjuncts) = eliminate_existential_equalities(vars, conjuncts, sort, conclusions);
    miniscope(vars, conjuncts, sort)
}

fn optimize_formula(formula: &Formula, conclusions: &mut Vec<Conclusion>) -> Formula {
    match formula {
        Formula::Relation(..) | Formula::Equality(..) => formula.clone(),
        Formula::Not(inner) => Formula::Not(Box::new(optimize_formula(inner, conclusions))),
        Formula::And(fs) => Formula::And(fs.iter().map(|g| optimize_formula(g, conclusions)).collect()),
        Formula::Or(fs) => Formula::Or(fs.iter().map(|g| optimize_formula(g, conclusions)).collect()),
        Formula::ExistsPosition(vars, body) => {
            match optimize_formula(body, conclusions) {
                Formula::And(conjuncts) => optimize_exists_and(vars.clone(), conjuncts, Sort::Position, conclusions),
                other => Formula::ExistsPosition(vars.clone(), Box::new(other)),
            }
        }
        Formula::ExistsNumber(vars, body) => {
            match optimize_formula(body, conclusions) {
                Formula::And(conjuncts) => optimize_exists_and(vars.clone(), conjuncts, Sort::Number, conclusions),
                other => Formula::ExistsNumber(vars.clone(), Box::new(other)),
            }
        }
        Formula::ForAllPosition(vars, body) => {
            Formula::ForAllPosition(vars.clone(), Box::new(optimize_formula(body, conclusions)))
        }
        Formula::ForAllNumber(vars, body) => {
            Formula::ForAllNumber(vars.clone(), Box::new(optimize_formula(body, conclusions)))
        }
    }
}

/// Rewrites a rule's condition (and, in lockstep, its conclusions) to an
/// equivalent but more search-efficient form. Idempotent: `optimize(&optimize(r))`
/// makes no further change.
pub fn optimize(rule: &FoRule) -> FoRule {
    let mut conclusions = rule.conclusions.clone();
    let condition = optimize_formula(&rule.condition, &mut conclusions);
    FoRule { name: rule.name.clone(), condition, conclusions, complexity: rule.complexity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fol::ConstantLit;
    use crate::model::universe::Universe;
    use crate::step::evaluate::{enumerate, Assignment, ControlFlow};
    use arrows_core::{Cell, CellState, Direction, PathCache, Puzzle};

    fn val_eq(var: &str, n: i64) -> Formula {
        Formula::Equality(Term::call("val", vec![Term::var(var)]), Term::int(n))
    }

    #[test]
    fn miniscoping_splits_independent_conjuncts() {
        let rule = FoRule {
            name: "r".to_string(),
            condition: Formula::ExistsPosition(
                vec!["p".to_string(), "q".to_string()],
                Box::new(Formula::And(vec![val_eq("p", 1), val_eq("q", 2)])),
            ),
            conclusions: vec![],
            complexity: 1,
        };
        let optimized = optimize(&rule);
        match optimized.condition {
            Formula::And(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected top-level And, got {other:?}"),
        }
    }

    #[test]
    fn optimize_is_idempotent() {
        let rule = FoRule {
            name: "r".to_string(),
            condition: Formula::ExistsPosition(
                vec!["p".to_string(), "q".to_string()],
                Box::new(Formula::And(vec![
                    Formula::Equality(Term::var("q"), Term::var("p")),
                    val_eq("p", 1),
                ])),
            ),
            conclusions: vec![Conclusion::Set(Term::var("p"), Term::int(1))],
            complexity: 1,
        };
        let once = optimize(&rule);
        let twice = optimize(&once);
        assert_eq!(once.condition, twice.condition);
        assert_eq!(once.conclusions, twice.conclusions);
    }

    #[test]
    fn miniscoping_preserves_witness_count() {
        let puzzle = Puzzle::from_cells(
            3,
            3,
            vec![Cell::new(Direction::East, CellState::pending_full(3)); 9]
                .into_iter()
                .enumerate()
                .map(|(i, c)| if i == 0 { Cell::given(Direction::East, 1) } else { c })
                .collect(),
        );
        let cache = PathCache::build(&puzzle);
        let universe = Universe::new(&puzzle, &cache);

        let condition = Formula::ExistsPosition(
            vec!["p".to_string(), "q".to_string()],
            Box::new(Formula::And(vec![val_eq("p", 1), Formula::Equality(Term::call("val", vec![Term::var("q")]), Term::Constant(ConstantLit::Nil))])),
        );
        let rule = FoRule { name: "r".to_string(), condition: condition.clone(), conclusions: vec![], complexity: 1 };
        let optimized = optimize(&rule);

        let mut before = 0;
        enumerate(&universe, &condition, &Assignment::new(), &mut |_| {
            before += 1;
            Ok(ControlFlow::Continue)
        })
        .unwrap();
        let mut after = 0;
        enumerate(&universe, &optimized.condition, &Assignment::new(), &mut |_| {
            after += 1;
            Ok(ControlFlow::Continue)
        })
        .unwrap();
        assert_eq!(before, after);
    }
}
