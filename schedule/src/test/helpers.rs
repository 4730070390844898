//! Test utilities: loop-nest builders and a tiny statement interpreter.
//!
//! The interpreter executes a tree concretely and records every `Provide` in
//! visit order, giving an oracle for semantic-preservation checks: a shape or
//! order rewrite is correct when the recorded writes match (as a sequence or
//! as a multiset, depending on whether the rewrite is allowed to permute the
//! iteration order).

use std::collections::HashMap;
use std::sync::Arc;

use tessel_ir::{DType, Expr, IterKind, IterVar, Stmt, Tensor, Var, eval_cond, eval_expr};

use crate::stage::DomainMap;

/// Serial iteration variable with its own zero-based domain.
pub fn iter_var(name: &str, extent: i64) -> IterVar {
    IterVar::with_extent(name, extent, IterKind::Serial)
}

/// Domain map covering the given variables with zero-based ranges.
pub fn dom_map(entries: &[(&IterVar, i64)]) -> DomainMap {
    entries
        .iter()
        .map(|(iv, extent)| ((*iv).clone(), tessel_ir::Range::by_min_extent(0, *extent)))
        .collect()
}

/// `for v0 { for v1 { ... t[v0, v1, ...] = v0 + v1 + ... } }`, outermost
/// first.
pub fn nest(tensor: &Tensor, vars: &[&IterVar]) -> Arc<Stmt> {
    let indices: Vec<Expr> = vars.iter().map(|iv| Expr::from(iv.var())).collect();
    let value = indices.iter().cloned().reduce(|a, b| a + b).unwrap_or(Expr::Const(0));
    let mut stmt = Stmt::provide(tensor.clone(), indices, value);
    for iv in vars.iter().rev() {
        let dom = iv.dom().expect("test nest vars carry their own domain");
        stmt = Stmt::loop_(iv.var().clone(), dom.min.clone(), dom.extent.clone(), iv.kind().for_kind(), stmt);
    }
    stmt
}

/// Single loop `for i in [0, extent) { t[i] = i }`.
pub fn single_loop(name: &str, extent: i64) -> (Arc<Stmt>, IterVar, Tensor) {
    let iv = iter_var(name, extent);
    let tensor = Tensor::new("t", [Expr::Const(extent)], DType::Int64);
    let stmt = nest(&tensor, &[&iv]);
    (stmt, iv, tensor)
}

/// Loop variable names, outermost first.
pub fn order_names(stmt: &Arc<Stmt>) -> Vec<String> {
    tessel_ir::loop_vars_outer_first(stmt).iter().map(|v| v.name().to_owned()).collect()
}

/// One recorded write: tensor name, concrete indices, concrete value.
pub type Write = (String, Vec<i64>, i64);

/// Execute `stmt` concretely, recording every provide.
pub fn exec(stmt: &Arc<Stmt>) -> Vec<Write> {
    let mut env = HashMap::new();
    let mut writes = Vec::new();
    run(stmt, &mut env, &mut writes);
    writes
}

fn run(stmt: &Stmt, env: &mut HashMap<Var, i64>, writes: &mut Vec<Write>) {
    match stmt {
        Stmt::For { var, min, extent, body, .. } => {
            let lo = eval_expr(min, env).unwrap();
            let n = eval_expr(extent, env).unwrap();
            for x in lo..lo + n {
                env.insert(var.clone(), x);
                run(body, env, writes);
            }
            env.remove(var);
        }
        Stmt::IfThenElse { cond, then_case, else_case } => {
            if eval_cond(cond, env).unwrap() {
                run(then_case, env, writes);
            } else if let Some(else_case) = else_case {
                run(else_case, env, writes);
            }
        }
        Stmt::Provide { tensor, indices, value } => {
            let indices = indices.iter().map(|e| eval_expr(e, env).unwrap()).collect();
            writes.push((tensor.name().to_owned(), indices, eval_expr(value, env).unwrap()));
        }
        Stmt::AttrScope { body, .. } | Stmt::Realize { body, .. } => run(body, env, writes),
        Stmt::Seq(stmts) => {
            for s in stmts {
                run(s, env, writes);
            }
        }
        Stmt::Evaluate(_) => {}
    }
}

/// Sorted copy, for comparing writes as a multiset.
pub fn sorted(mut writes: Vec<Write>) -> Vec<Write> {
    writes.sort();
    writes
}
