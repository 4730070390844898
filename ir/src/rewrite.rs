//! Structural statement rewriting.
//!
//! Passes are small structs holding only their per-invocation state (target
//! variable, accumulated extent, recorded attribute scopes) that implement
//! [`StmtRewriter`] and override the one or two variants they care about.
//! Everything else falls through to [`StmtRewriter::rewrite_children`], which
//! rebuilds a node only when some child actually changed — untouched subtrees
//! are returned as clones of the original `Arc`s, so rewriting never copies
//! more of a persistent tree than the spine it modifies.

use std::sync::Arc;

use crate::stmt::Stmt;

/// A statement-tree rewriter with per-variant hooks.
///
/// The default `rewrite` dispatches over the closed [`Stmt`] enum; each hook
/// defaults to structural recursion. Hooks receive the `Arc` so an unchanged
/// node can be returned by reference.
pub trait StmtRewriter {
    fn rewrite(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        match stmt.as_ref() {
            Stmt::For { .. } => self.rewrite_for(stmt),
            Stmt::AttrScope { .. } => self.rewrite_attr_scope(stmt),
            Stmt::IfThenElse { .. } => self.rewrite_if(stmt),
            Stmt::Provide { .. } => self.rewrite_provide(stmt),
            Stmt::Realize { .. } | Stmt::Seq(_) | Stmt::Evaluate(_) => self.rewrite_children(stmt),
        }
    }

    fn rewrite_for(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        self.rewrite_children(stmt)
    }

    fn rewrite_attr_scope(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        self.rewrite_children(stmt)
    }

    fn rewrite_if(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        self.rewrite_children(stmt)
    }

    fn rewrite_provide(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        self.rewrite_children(stmt)
    }

    /// Rewrite child statements and rebuild this node iff any child changed.
    fn rewrite_children(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        match stmt.as_ref() {
            Stmt::For { var, min, extent, kind, body } => {
                let new_body = self.rewrite(body);
                if Arc::ptr_eq(&new_body, body) {
                    stmt.clone()
                } else {
                    Stmt::loop_(var.clone(), min.clone(), extent.clone(), *kind, new_body)
                }
            }
            Stmt::AttrScope { subject, key, value, body } => {
                let new_body = self.rewrite(body);
                if Arc::ptr_eq(&new_body, body) {
                    stmt.clone()
                } else {
                    Stmt::attr(subject.clone(), key.clone(), value.clone(), new_body)
                }
            }
            Stmt::IfThenElse { cond, then_case, else_case } => {
                let new_then = self.rewrite(then_case);
                let new_else = else_case.as_ref().map(|e| self.rewrite(e));
                let else_unchanged = match (&new_else, else_case) {
                    (Some(n), Some(o)) => Arc::ptr_eq(n, o),
                    (None, None) => true,
                    _ => false,
                };
                if Arc::ptr_eq(&new_then, then_case) && else_unchanged {
                    stmt.clone()
                } else {
                    Arc::new(Stmt::IfThenElse { cond: cond.clone(), then_case: new_then, else_case: new_else })
                }
            }
            Stmt::Realize { tensor, bounds, body } => {
                let new_body = self.rewrite(body);
                if Arc::ptr_eq(&new_body, body) {
                    stmt.clone()
                } else {
                    Stmt::realize(tensor.clone(), bounds.clone(), new_body)
                }
            }
            Stmt::Seq(stmts) => {
                let new_stmts: Vec<_> = stmts.iter().map(|s| self.rewrite(s)).collect();
                if new_stmts.iter().zip(stmts).all(|(n, o)| Arc::ptr_eq(n, o)) {
                    stmt.clone()
                } else {
                    Stmt::seq(new_stmts)
                }
            }
            Stmt::Provide { .. } | Stmt::Evaluate(_) => stmt.clone(),
        }
    }
}
