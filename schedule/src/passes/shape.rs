//! Loop-Shape pass: realize Split and Fuse relations as tree rewrites.

use std::collections::HashMap;
use std::sync::Arc;

use snafu::ensure;
use tessel_ir::{Expr, IterVar, Range, Stmt, StmtRewriter, Var, attr, substitute_expr, substitute_stmt};

use crate::error::{
    FuseTargetNotFoundSnafu, MissingDomainSnafu, NonZeroDomainMinSnafu, Result, SplitTargetNotFoundSnafu,
};
use crate::stage::{DomainMap, Relation, Stage};

/// Apply every Split and Fuse relation of `stage`, in declaration order.
///
/// Each relation must rewrite an actual loop; a relation whose target is
/// absent from the tree makes the schedule malformed. Rebase relations are
/// handled by the orchestrator and skipped here.
pub fn apply_loop_shapes(stage: &Stage, dom_map: &DomainMap, mut stmt: Arc<Stmt>) -> Result<Arc<Stmt>> {
    for relation in &stage.relations {
        match relation {
            Relation::Split { parent, outer, inner, factor } => {
                let mut splitter = LoopSplitter::new(parent, outer, inner, factor.clone(), dom_map)?;
                stmt = splitter.rewrite(&stmt);
                ensure!(splitter.split_done, SplitTargetNotFoundSnafu { parent: parent.var().name().to_owned() });
                tracing::trace!(parent = %parent.var(), outer = %outer.var(), inner = %inner.var(), "split applied");
            }
            Relation::Fuse { outer, inner, fused } => {
                let mut fuser = LoopFuser::new(outer, inner, fused);
                stmt = fuser.rewrite(&stmt);
                ensure!(
                    fuser.fused_done && !fuser.bad_nesting,
                    FuseTargetNotFoundSnafu {
                        outer: outer.var().name().to_owned(),
                        inner: inner.var().name().to_owned()
                    }
                );
                tracing::trace!(outer = %outer.var(), inner = %inner.var(), fused = %fused.var(), "fuse applied");
            }
            Relation::Rebase { .. } => {}
        }
    }
    Ok(stmt)
}

/// Replaces the unique loop over `parent` by `outer × inner`.
///
/// The parent's body is substituted with `inner + outer*factor` and guarded by
/// `likely(outer*factor < extent - inner)`: the guard is exact, admitting
/// precisely the pairs that map back into the parent's original range, and
/// likely-true because perfectly divisible bounds are the common case.
struct LoopSplitter {
    parent: Var,
    factor: Expr,
    outer: IterVar,
    inner: IterVar,
    outer_dom: Range,
    inner_dom: Range,
    rmap: HashMap<Var, Expr>,
    split_done: bool,
}

impl LoopSplitter {
    fn new(parent: &IterVar, outer: &IterVar, inner: &IterVar, factor: Expr, dom_map: &DomainMap) -> Result<Self> {
        let zero_based_dom = |iv: &IterVar| -> Result<Range> {
            let dom = dom_map
                .get(iv)
                .ok_or_else(|| MissingDomainSnafu { iter_var: iv.var().name().to_owned() }.build())?;
            ensure!(dom.is_zero_based(), NonZeroDomainMinSnafu { iter_var: iv.var().name().to_owned() });
            Ok(dom.clone())
        };

        let inner_dom = zero_based_dom(inner)?;
        let outer_dom = zero_based_dom(outer)?;
        let substitution = Expr::from(inner.var()) + outer.var() * factor.clone();
        Ok(Self {
            parent: parent.var().clone(),
            factor,
            outer: outer.clone(),
            inner: inner.clone(),
            outer_dom,
            inner_dom,
            rmap: HashMap::from([(parent.var().clone(), substitution)]),
            split_done: false,
        })
    }
}

impl StmtRewriter for LoopSplitter {
    fn rewrite_for(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        let Stmt::For { var, extent, body, .. } = stmt.as_ref() else { unreachable!() };
        if *var != self.parent {
            return self.rewrite_children(stmt);
        }

        let mut ret = substitute_stmt(body, &self.rmap);

        let guard =
            (self.outer.var() * self.factor.clone()).lt(extent.clone() - Expr::from(self.inner.var())).likely();
        ret = Stmt::if_then(guard, ret);
        ret = Stmt::loop_(
            self.inner.var().clone(),
            0,
            self.inner_dom.extent.clone(),
            self.inner.kind().for_kind(),
            ret,
        );
        ret = Stmt::loop_(
            self.outer.var().clone(),
            0,
            self.outer_dom.extent.clone(),
            self.outer.kind().for_kind(),
            ret,
        );
        self.split_done = true;
        // Keep walking inside the rebuilt nest: bind scopes further down
        // still need their governing expressions rewritten.
        self.rewrite_children(&ret)
    }

    fn rewrite_attr_scope(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        let Stmt::AttrScope { subject, key, value, body } = stmt.as_ref() else { unreachable!() };
        if key != attr::BUFFER_BIND_SCOPE {
            return self.rewrite_children(stmt);
        }
        let new_value = substitute_expr(value, &self.rmap);
        let new_body = self.rewrite(body);
        if new_value == *value && Arc::ptr_eq(&new_body, body) {
            stmt.clone()
        } else {
            Stmt::attr(subject.clone(), key.clone(), new_value, new_body)
        }
    }
}

/// Collapses the loops between `outer` and `inner` (inclusive) into a single
/// loop over `fused`.
///
/// The inner loop disappears (`inner = fused % extent`), intermediate loops
/// fold their extents into the running accumulator
/// (`v = (fused / acc) % extent(v)`), and the outer loop is replaced by the
/// fused loop with the product extent (`outer = fused / acc`). Imperfect
/// nests are supported only insofar as this recursion reaches them; anything
/// else is undefined.
struct LoopFuser {
    fused: Var,
    outer: Var,
    inner: Var,
    under_outer: bool,
    /// Running extent accumulator, seeded at the inner loop's extent.
    extent: Expr,
    fused_done: bool,
    /// Inner loop seen outside the outer loop: the pair is not properly nested.
    bad_nesting: bool,
}

impl LoopFuser {
    fn new(outer: &IterVar, inner: &IterVar, fused: &IterVar) -> Self {
        Self {
            fused: fused.var().clone(),
            outer: outer.var().clone(),
            inner: inner.var().clone(),
            under_outer: false,
            extent: Expr::Const(0),
            fused_done: false,
            bad_nesting: false,
        }
    }
}

impl StmtRewriter for LoopFuser {
    fn rewrite_for(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        let Stmt::For { var, extent, kind, body, .. } = stmt.as_ref() else { unreachable!() };
        if *var == self.inner {
            if !self.under_outer {
                self.bad_nesting = true;
                return stmt.clone();
            }
            let rmap = HashMap::from([(var.clone(), Expr::from(&self.fused).floor_mod(extent.clone()))]);
            self.extent = extent.clone();
            self.fused_done = true;
            substitute_stmt(body, &rmap)
        } else if *var == self.outer {
            self.under_outer = true;
            let new_body = self.rewrite(body);
            let rmap = HashMap::from([(var.clone(), Expr::from(&self.fused).floor_div(self.extent.clone()))]);
            let new_body = substitute_stmt(&new_body, &rmap);
            self.under_outer = false;
            Stmt::loop_(self.fused.clone(), 0, self.extent.clone() * extent.clone(), *kind, new_body)
        } else if self.under_outer {
            // Loop strictly between outer and inner: fold it into the fused
            // index and accumulate its extent.
            let new_body = self.rewrite(body);
            let rmap = HashMap::from([(
                var.clone(),
                Expr::from(&self.fused).floor_div(self.extent.clone()).floor_mod(extent.clone()),
            )]);
            let new_body = substitute_stmt(&new_body, &rmap);
            self.extent = self.extent.clone() * extent.clone();
            new_body
        } else {
            self.rewrite_children(stmt)
        }
    }

    fn rewrite_attr_scope(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        let Stmt::AttrScope { subject, key, value, body } = stmt.as_ref() else { unreachable!() };
        if key != attr::BUFFER_BIND_SCOPE {
            return self.rewrite_children(stmt);
        }
        // Rewrite the body first so the accumulator reflects the loops below.
        let new_body = self.rewrite(body);
        let rmap = HashMap::from([
            (self.inner.clone(), Expr::from(&self.fused).floor_mod(self.extent.clone())),
            (self.outer.clone(), Expr::from(&self.fused).floor_div(self.extent.clone())),
        ]);
        let new_value = substitute_expr(value, &rmap);
        Stmt::attr(subject.clone(), key.clone(), new_value, new_body)
    }
}
