//! Discovery of the iteration variables a statement tree iterates over.

use std::sync::Arc;

use tessel_ir::{IterVar, Range, Stmt, post_order_visit};

/// Build one [`IterVar`] per loop of `stmt`, outermost first.
///
/// The domain comes from the loop's own bounds and the kind from its
/// [`ForKind`](tessel_ir::ForKind). Post-order discovery visits the innermost
/// loop first, so the collected list is reversed before returning.
pub fn gather_loop_vars(stmt: &Arc<Stmt>) -> Vec<IterVar> {
    let mut vars = Vec::new();
    post_order_visit(stmt, &mut |s| {
        if let Stmt::For { var, min, extent, kind, .. } = s {
            let dom = Range::by_min_extent(min.clone(), extent.clone());
            vars.push(IterVar::new(var.clone(), Some(dom), (*kind).into()));
        }
    });
    vars.reverse();
    vars
}
