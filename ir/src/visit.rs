//! Read-only statement traversal.

use std::sync::Arc;

use crate::stmt::Stmt;

/// Visit every statement node in post-order: children strictly before their
/// parent. A loop nest therefore reports its innermost loop first; reversing
/// the visit order of the `For` nodes yields the outermost-to-innermost
/// sequence the reorder pass works with.
pub fn post_order_visit(stmt: &Stmt, f: &mut impl FnMut(&Stmt)) {
    match stmt {
        Stmt::For { body, .. } | Stmt::AttrScope { body, .. } | Stmt::Realize { body, .. } => {
            post_order_visit(body, f);
        }
        Stmt::IfThenElse { then_case, else_case, .. } => {
            post_order_visit(then_case, f);
            if let Some(else_case) = else_case {
                post_order_visit(else_case, f);
            }
        }
        Stmt::Seq(stmts) => {
            for s in stmts {
                post_order_visit(s, f);
            }
        }
        Stmt::Provide { .. } | Stmt::Evaluate(_) => {}
    }
    f(stmt);
}

/// Collect the loop variables of a tree, outermost first.
pub fn loop_vars_outer_first(stmt: &Arc<Stmt>) -> Vec<crate::expr::Var> {
    let mut vars = Vec::new();
    post_order_visit(stmt, &mut |s| {
        if let Stmt::For { var, .. } = s {
            vars.push(var.clone());
        }
    });
    vars.reverse();
    vars
}
