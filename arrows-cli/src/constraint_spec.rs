//! Parses `--constraint` flag values into boxed [`arrows_gen::Constraint`]s.
//!
//! Grammar: `name:arg[:arg...]`, e.g. `number-fraction:0:0.1:0.3` or
//! `uses-rule:force_no_pending_ahead:2`. Kept deliberately small: one
//! constructor per [`arrows_gen`] constraint type, no general expression
//! language.

use arrows_gen::{
    Bound, Constraint, FollowingArrowsFraction, NumberFraction, PrefilledCellsFraction,
    RuleComplexityFraction, UsesRule,
};

use crate::error::AppError;

fn parse_f64(part: &str) -> Result<f64, AppError> {
    part.parse().map_err(|_| AppError::Cli(format!("not a number: {part:?}")))
}

fn parse_opt_f64(part: &str) -> Result<Option<f64>, AppError> {
    if part.is_empty() || part == "-" {
        Ok(None)
    } else {
        Ok(Some(parse_f64(part)?))
    }
}

fn fraction_bound(min: &str, max: &str) -> Result<Bound, AppError> {
    Ok(Bound::fraction(parse_opt_f64(min)?, parse_opt_f64(max)?))
}

pub fn parse_constraint_spec(spec: &str) -> Result<Box<dyn Constraint>, AppError> {
    let parts: Vec<&str> = spec.split(':').collect();
    match parts.as_slice() {
        ["number-fraction", n, min, max] => {
            let n: u32 = n.parse().map_err(|_| AppError::Cli(format!("not a number: {n:?}")))?;
            Ok(Box::new(NumberFraction::new(n, fraction_bound(min, max)?)))
        }
        ["rule-complexity-fraction", k, min, max] => {
            let k: u32 = k.parse().map_err(|_| AppError::Cli(format!("not a number: {k:?}")))?;
            Ok(Box::new(RuleComplexityFraction::new(k, fraction_bound(min, max)?)))
        }
        ["uses-rule", name, min_count] => {
            let min_count = parse_opt_f64(min_count)?.map(|f| f as u32);
            Ok(Box::new(UsesRule::new(name.to_string(), min_count, None)))
        }
        ["following-arrows-fraction", min, max] => {
            Ok(Box::new(FollowingArrowsFraction::new(fraction_bound(min, max)?)))
        }
        ["prefilled-cells-fraction", min, max] => {
            Ok(Box::new(PrefilledCellsFraction::new(fraction_bound(min, max)?)))
        }
        _ => Err(AppError::Cli(format!("unrecognized constraint spec: {spec:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_number_fraction_constraint() {
        let c = parse_constraint_spec("number-fraction:0:0.1:0.3").unwrap();
        assert_eq!(c.name(), "number-fraction(0)");
    }

    #[test]
    fn rejects_an_unknown_constraint_name() {
        assert!(parse_constraint_spec("made-up:1:2").is_err());
    }

    #[test]
    fn open_ended_bound_accepts_a_dash_for_unset() {
        let c = parse_constraint_spec("number-fraction:1:-:0.5").unwrap();
        assert_eq!(c.name(), "number-fraction(1)");
    }
}
