//! The shipped rule pack: a handful of forcing/exclusion rules plus a
//! bounded backtrack rule, expressed in the DSL itself so the parser is
//! exercised by production code, not just its tests.
//!
//! Grounded in the condition/action shapes spec.md lays out for the
//! "no room ahead" and "too many distinct values seen" scenarios.

use arrows_logic::RuleSet;

use crate::load_str;

const DEFAULT_RULES: &str = "
rule force_no_pending_ahead complexity 1:
    exists p (val(p) = nil ^ ahead_free(p) = 0)
    => set(p, sees_distinct(p))

rule exclude_below_seen complexity 1:
    exists p, n (candidate(p, n) ^ n < sees_distinct(p))
    => exclude(p, =, n)

rule exclude_above_potential complexity 2:
    exists p, n (candidate(p, n) ^ n > sees_distinct_candidates(p))
    => exclude(p, =, n)

backtrack guess_and_check complexity 5 backtrack_depth 50 rule_depth 2 max_rule_complexity 2
";

/// The rule set shipped with the solver: three forcing/exclusion rules and
/// one bounded hypothesis search, loaded from [`DEFAULT_RULES`].
pub fn default_rules() -> RuleSet {
    load_str(DEFAULT_RULES).expect("the built-in rule pack must parse and type-check")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_pack_loads_four_rules_in_complexity_order() {
        let set = default_rules();
        let names: Vec<_> = set.rules().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "force_no_pending_ahead".to_string(),
                "exclude_below_seen".to_string(),
                "exclude_above_potential".to_string(),
                "guess_and_check".to_string(),
            ]
        );
    }

    #[test]
    fn builtin_pack_includes_the_backtrack_rule() {
        let set = default_rules();
        let has_backtrack = set.rules().iter().any(|r| matches!(r, arrows_logic::Rule::Backtrack(..)));
        assert!(has_backtrack);
    }
}
