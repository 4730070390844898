//! Variable substitution over expressions and statements.
//!
//! Substitution is capture-naive by design: the passes only ever substitute a
//! variable after removing (or while replacing) the loop that binds it, so a
//! `For` node's own binder is left alone and only expression positions are
//! rewritten.

use std::collections::HashMap;
use std::sync::Arc;

use crate::expr::{Expr, Var};
use crate::stmt::Stmt;

/// Replace every occurrence of the mapped variables in `expr`.
pub fn substitute_expr(expr: &Expr, map: &HashMap<Var, Expr>) -> Expr {
    subst_expr(expr, map).unwrap_or_else(|| expr.clone())
}

/// Replace every occurrence of the mapped variables in all expression
/// positions of `stmt` (loop bounds, conditions, indices, attribute values,
/// realize bounds). Returns the original `Arc` when nothing matched.
pub fn substitute_stmt(stmt: &Arc<Stmt>, map: &HashMap<Var, Expr>) -> Arc<Stmt> {
    subst_stmt(stmt, map).unwrap_or_else(|| stmt.clone())
}

/// `None` means "unchanged"; parents use it to keep sharing intact.
fn subst_expr(expr: &Expr, map: &HashMap<Var, Expr>) -> Option<Expr> {
    let binary = |a: &Arc<Expr>, b: &Arc<Expr>, make: fn(Arc<Expr>, Arc<Expr>) -> Expr| {
        let na = subst_expr(a, map);
        let nb = subst_expr(b, map);
        if na.is_none() && nb.is_none() {
            None
        } else {
            Some(make(
                na.map(Arc::new).unwrap_or_else(|| a.clone()),
                nb.map(Arc::new).unwrap_or_else(|| b.clone()),
            ))
        }
    };

    match expr {
        Expr::Const(_) => None,
        Expr::Var(v) => map.get(v).cloned(),
        Expr::Add(a, b) => binary(a, b, Expr::Add),
        Expr::Sub(a, b) => binary(a, b, Expr::Sub),
        Expr::Mul(a, b) => binary(a, b, Expr::Mul),
        Expr::FloorDiv(a, b) => binary(a, b, Expr::FloorDiv),
        Expr::FloorMod(a, b) => binary(a, b, Expr::FloorMod),
        Expr::Min(a, b) => binary(a, b, Expr::Min),
        Expr::Max(a, b) => binary(a, b, Expr::Max),
        Expr::Lt(a, b) => binary(a, b, Expr::Lt),
        Expr::Likely(c) => subst_expr(c, map).map(|n| Expr::Likely(Arc::new(n))),
        Expr::Load { tensor, indices } => {
            subst_exprs(indices, map).map(|indices| Expr::Load { tensor: tensor.clone(), indices })
        }
        Expr::Call { name, args } => subst_exprs(args, map).map(|args| Expr::Call { name: name.clone(), args }),
    }
}

fn subst_exprs(exprs: &[Expr], map: &HashMap<Var, Expr>) -> Option<Vec<Expr>> {
    let rewritten: Vec<_> = exprs.iter().map(|e| subst_expr(e, map)).collect();
    if rewritten.iter().all(Option::is_none) {
        return None;
    }
    Some(rewritten.into_iter().zip(exprs).map(|(n, o)| n.unwrap_or_else(|| o.clone())).collect())
}

fn subst_stmt(stmt: &Arc<Stmt>, map: &HashMap<Var, Expr>) -> Option<Arc<Stmt>> {
    match stmt.as_ref() {
        Stmt::For { var, min, extent, kind, body } => {
            let nmin = subst_expr(min, map);
            let nextent = subst_expr(extent, map);
            let nbody = subst_stmt(body, map);
            if nmin.is_none() && nextent.is_none() && nbody.is_none() {
                return None;
            }
            Some(Stmt::loop_(
                var.clone(),
                nmin.unwrap_or_else(|| min.clone()),
                nextent.unwrap_or_else(|| extent.clone()),
                *kind,
                nbody.unwrap_or_else(|| body.clone()),
            ))
        }
        Stmt::AttrScope { subject, key, value, body } => {
            let nvalue = subst_expr(value, map);
            let nbody = subst_stmt(body, map);
            if nvalue.is_none() && nbody.is_none() {
                return None;
            }
            Some(Stmt::attr(
                subject.clone(),
                key.clone(),
                nvalue.unwrap_or_else(|| value.clone()),
                nbody.unwrap_or_else(|| body.clone()),
            ))
        }
        Stmt::IfThenElse { cond, then_case, else_case } => {
            let ncond = subst_expr(cond, map);
            let nthen = subst_stmt(then_case, map);
            let nelse = else_case.as_ref().map(|e| subst_stmt(e, map));
            if ncond.is_none() && nthen.is_none() && !matches!(nelse, Some(Some(_))) {
                return None;
            }
            Some(Arc::new(Stmt::IfThenElse {
                cond: ncond.unwrap_or_else(|| cond.clone()),
                then_case: nthen.unwrap_or_else(|| then_case.clone()),
                else_case: match (nelse, else_case) {
                    (Some(Some(n)), _) => Some(n),
                    (_, Some(o)) => Some(o.clone()),
                    (_, None) => None,
                },
            }))
        }
        Stmt::Provide { tensor, indices, value } => {
            let nindices = subst_exprs(indices, map);
            let nvalue = subst_expr(value, map);
            if nindices.is_none() && nvalue.is_none() {
                return None;
            }
            Some(Stmt::provide(
                tensor.clone(),
                nindices.unwrap_or_else(|| indices.to_vec()),
                nvalue.unwrap_or_else(|| value.clone()),
            ))
        }
        Stmt::Realize { tensor, bounds, body } => {
            let mut changed = false;
            let nbounds = bounds
                .iter()
                .map(|r| {
                    let nmin = subst_expr(&r.min, map);
                    let nextent = subst_expr(&r.extent, map);
                    if nmin.is_some() || nextent.is_some() {
                        changed = true;
                    }
                    crate::iter_var::Range {
                        min: nmin.unwrap_or_else(|| r.min.clone()),
                        extent: nextent.unwrap_or_else(|| r.extent.clone()),
                    }
                })
                .collect();
            let nbody = subst_stmt(body, map);
            if !changed && nbody.is_none() {
                return None;
            }
            Some(Stmt::realize(tensor.clone(), nbounds, nbody.unwrap_or_else(|| body.clone())))
        }
        Stmt::Seq(stmts) => {
            let rewritten: Vec<_> = stmts.iter().map(|s| subst_stmt(s, map)).collect();
            if rewritten.iter().all(Option::is_none) {
                return None;
            }
            Some(Stmt::seq(rewritten.into_iter().zip(stmts).map(|(n, o)| n.unwrap_or_else(|| o.clone())).collect()))
        }
        Stmt::Evaluate(expr) => subst_expr(expr, map).map(Stmt::evaluate),
    }
}
