//! Property tests for substitution: substituting a constant for a variable
//! and then evaluating must agree with evaluating under an extended
//! environment.

use std::collections::HashMap;

use proptest::prelude::*;

use crate::eval::eval_expr;
use crate::expr::{Expr, Var};
use crate::subst::substitute_expr;

proptest! {
    #[test]
    fn substitute_then_eval_matches_extended_env(iv in -32i64..32, jv in -32i64..32, seed in 0u8..16) {
        let i = Var::new("i");
        let j = Var::new("j");
        let expr = {
            // Build a small fixed family of shapes from the seed.
            let base = &i * 3 + Expr::from(&j);
            match seed % 4 {
                0 => base,
                1 => base.min(Expr::from(&i) - Expr::from(&j)),
                2 => (Expr::from(&i) + Expr::from(&j)) * Expr::from(2),
                _ => Expr::from(&j).max(Expr::from(&i) * Expr::from(&i)),
            }
        };

        let map = HashMap::from([(i.clone(), Expr::Const(iv))]);
        let substituted = substitute_expr(&expr, &map);

        let env_j = HashMap::from([(j.clone(), jv)]);
        let env_ij = HashMap::from([(i, iv), (j, jv)]);
        prop_assert_eq!(eval_expr(&substituted, &env_j).unwrap(), eval_expr(&expr, &env_ij).unwrap());
    }

    #[test]
    fn substitution_is_stable_under_repeat(iv in -32i64..32) {
        let i = Var::new("i");
        let j = Var::new("j");
        let expr = &i * 5 + Expr::from(&j);
        let map = HashMap::from([(i, Expr::Const(iv))]);

        let once = substitute_expr(&expr, &map);
        let twice = substitute_expr(&once, &map);
        prop_assert_eq!(once, twice);
    }
}
