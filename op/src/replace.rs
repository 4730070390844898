//! Tensor renaming over statement trees.
//!
//! Two distinct rewrites, matching the two roles a tensor plays: a read
//! target inside [`Expr::Load`] and a write target of [`Stmt::Provide`].
//! Both keep untouched subtrees shared and hand the input `Arc` back when
//! nothing matched.

use std::collections::HashMap;
use std::sync::Arc;

use tessel_ir::{Expr, Range, Stmt, Tensor};

/// Rewrite every [`Expr::Load`] whose tensor is mapped, in all expression
/// positions including attribute-scope values.
pub fn replace_tensor(stmt: &Arc<Stmt>, map: &HashMap<Tensor, Tensor>) -> Arc<Stmt> {
    load_stmt(stmt, map).unwrap_or_else(|| stmt.clone())
}

/// Rewrite only [`Stmt::Provide`] write targets. Returns the input tree
/// unchanged when no provide matched.
pub fn replace_provide_tensor(stmt: &Arc<Stmt>, map: &HashMap<Tensor, Tensor>) -> Arc<Stmt> {
    provide_stmt(stmt, map).unwrap_or_else(|| stmt.clone())
}

/// `None` means "unchanged"; parents use it to keep sharing intact.
fn load_expr(expr: &Expr, map: &HashMap<Tensor, Tensor>) -> Option<Expr> {
    let binary = |a: &Arc<Expr>, b: &Arc<Expr>, make: fn(Arc<Expr>, Arc<Expr>) -> Expr| {
        let na = load_expr(a, map);
        let nb = load_expr(b, map);
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
        Expr::Const(_) | Expr::Var(_) => None,
        Expr::Add(a, b) => binary(a, b, Expr::Add),
        Expr::Sub(a, b) => binary(a, b, Expr::Sub),
        Expr::Mul(a, b) => binary(a, b, Expr::Mul),
        Expr::FloorDiv(a, b) => binary(a, b, Expr::FloorDiv),
        Expr::FloorMod(a, b) => binary(a, b, Expr::FloorMod),
        Expr::Min(a, b) => binary(a, b, Expr::Min),
        Expr::Max(a, b) => binary(a, b, Expr::Max),
        Expr::Lt(a, b) => binary(a, b, Expr::Lt),
        Expr::Likely(c) => load_expr(c, map).map(|n| Expr::Likely(Arc::new(n))),
        Expr::Load { tensor, indices } => {
            let ntensor = map.get(tensor);
            let nindices = load_exprs(indices, map);
            if ntensor.is_none() && nindices.is_none() {
                return None;
            }
            Some(Expr::Load {
                tensor: ntensor.unwrap_or(tensor).clone(),
                indices: nindices.unwrap_or_else(|| indices.to_vec()),
            })
        }
        Expr::Call { name, args } => load_exprs(args, map).map(|args| Expr::Call { name: name.clone(), args }),
    }
}

fn load_exprs(exprs: &[Expr], map: &HashMap<Tensor, Tensor>) -> Option<Vec<Expr>> {
    let rewritten: Vec<_> = exprs.iter().map(|e| load_expr(e, map)).collect();
    if rewritten.iter().all(Option::is_none) {
        return None;
    }
    Some(rewritten.into_iter().zip(exprs).map(|(n, o)| n.unwrap_or_else(|| o.clone())).collect())
}

fn load_stmt(stmt: &Arc<Stmt>, map: &HashMap<Tensor, Tensor>) -> Option<Arc<Stmt>> {
    match stmt.as_ref() {
        Stmt::For { var, min, extent, kind, body } => {
            let nmin = load_expr(min, map);
            let nextent = load_expr(extent, map);
            let nbody = load_stmt(body, map);
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
            let nvalue = load_expr(value, map);
            let nbody = load_stmt(body, map);
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
            let ncond = load_expr(cond, map);
            let nthen = load_stmt(then_case, map);
            let nelse = else_case.as_ref().map(|e| load_stmt(e, map));
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
            let nindices = load_exprs(indices, map);
            let nvalue = load_expr(value, map);
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
                    let nmin = load_expr(&r.min, map);
                    let nextent = load_expr(&r.extent, map);
                    if nmin.is_some() || nextent.is_some() {
                        changed = true;
                    }
                    Range {
                        min: nmin.unwrap_or_else(|| r.min.clone()),
                        extent: nextent.unwrap_or_else(|| r.extent.clone()),
                    }
                })
                .collect();
            let nbody = load_stmt(body, map);
            if !changed && nbody.is_none() {
                return None;
            }
            Some(Stmt::realize(tensor.clone(), nbounds, nbody.unwrap_or_else(|| body.clone())))
        }
        Stmt::Seq(stmts) => {
            let rewritten: Vec<_> = stmts.iter().map(|s| load_stmt(s, map)).collect();
            if rewritten.iter().all(Option::is_none) {
                return None;
            }
            Some(Stmt::seq(rewritten.into_iter().zip(stmts).map(|(n, o)| n.unwrap_or_else(|| o.clone())).collect()))
        }
        Stmt::Evaluate(expr) => load_expr(expr, map).map(Stmt::evaluate),
    }
}

fn provide_stmt(stmt: &Arc<Stmt>, map: &HashMap<Tensor, Tensor>) -> Option<Arc<Stmt>> {
    match stmt.as_ref() {
        Stmt::Provide { tensor, indices, value } => map
            .get(tensor)
            .map(|replacement| Stmt::provide(replacement.clone(), indices.to_vec(), value.clone())),
        Stmt::For { var, min, extent, kind, body } => provide_stmt(body, map)
            .map(|nbody| Stmt::loop_(var.clone(), min.clone(), extent.clone(), *kind, nbody)),
        Stmt::AttrScope { subject, key, value, body } => provide_stmt(body, map)
            .map(|nbody| Stmt::attr(subject.clone(), key.clone(), value.clone(), nbody)),
        Stmt::IfThenElse { cond, then_case, else_case } => {
            let nthen = provide_stmt(then_case, map);
            let nelse = else_case.as_ref().map(|e| provide_stmt(e, map));
            if nthen.is_none() && !matches!(nelse, Some(Some(_))) {
                return None;
            }
            Some(Arc::new(Stmt::IfThenElse {
                cond: cond.clone(),
                then_case: nthen.unwrap_or_else(|| then_case.clone()),
                else_case: match (nelse, else_case) {
                    (Some(Some(n)), _) => Some(n),
                    (_, Some(o)) => Some(o.clone()),
                    (_, None) => None,
                },
            }))
        }
        Stmt::Realize { tensor, bounds, body } => {
            provide_stmt(body, map).map(|nbody| Stmt::realize(tensor.clone(), bounds.clone(), nbody))
        }
        Stmt::Seq(stmts) => {
            let rewritten: Vec<_> = stmts.iter().map(|s| provide_stmt(s, map)).collect();
            if rewritten.iter().all(Option::is_none) {
                return None;
            }
            Some(Stmt::seq(rewritten.into_iter().zip(stmts).map(|(n, o)| n.unwrap_or_else(|| o.clone())).collect()))
        }
        Stmt::Evaluate(_) => None,
    }
}
