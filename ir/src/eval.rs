//! Concrete evaluation of closed integer expressions.
//!
//! Used by tests to check rewrites against their arithmetic contracts (e.g.
//! that a split reconstructs `parent = inner + outer*factor` for every point
//! the guard admits). `Likely` is transparent; `Load` and `Call` are opaque
//! and refuse to evaluate.

use std::collections::HashMap;

use snafu::ensure;

use crate::error::{DivisionByZeroSnafu, NotEvaluableSnafu, Result, UnboundVariableSnafu};
use crate::expr::{Expr, Var};

/// Evaluate `expr` under `env`. Comparisons yield 0 or 1; division and modulo
/// use floor semantics to match `FloorDiv`/`FloorMod`.
pub fn eval_expr(expr: &Expr, env: &HashMap<Var, i64>) -> Result<i64> {
    match expr {
        Expr::Const(c) => Ok(*c),
        Expr::Var(v) => env.get(v).copied().ok_or_else(|| UnboundVariableSnafu { name: v.name().to_owned() }.build()),
        Expr::Add(a, b) => Ok(eval_expr(a, env)? + eval_expr(b, env)?),
        Expr::Sub(a, b) => Ok(eval_expr(a, env)? - eval_expr(b, env)?),
        Expr::Mul(a, b) => Ok(eval_expr(a, env)? * eval_expr(b, env)?),
        Expr::FloorDiv(a, b) => {
            let d = eval_expr(b, env)?;
            ensure!(d != 0, DivisionByZeroSnafu);
            Ok(eval_expr(a, env)?.div_euclid(d))
        }
        Expr::FloorMod(a, b) => {
            let d = eval_expr(b, env)?;
            ensure!(d != 0, DivisionByZeroSnafu);
            Ok(eval_expr(a, env)?.rem_euclid(d))
        }
        Expr::Min(a, b) => Ok(eval_expr(a, env)?.min(eval_expr(b, env)?)),
        Expr::Max(a, b) => Ok(eval_expr(a, env)?.max(eval_expr(b, env)?)),
        Expr::Lt(a, b) => Ok(i64::from(eval_expr(a, env)? < eval_expr(b, env)?)),
        Expr::Likely(c) => eval_expr(c, env),
        Expr::Load { .. } => NotEvaluableSnafu { what: "tensor load" }.fail(),
        Expr::Call { .. } => NotEvaluableSnafu { what: "opaque call" }.fail(),
    }
}

/// Evaluate `expr` as a condition: nonzero is true.
pub fn eval_cond(expr: &Expr, env: &HashMap<Var, i64>) -> Result<bool> {
    Ok(eval_expr(expr, env)? != 0)
}
