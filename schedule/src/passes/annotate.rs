//! Loop-Annotation pass: thread bindings, pragma scopes, and loop-kind
//! fixups.

use std::collections::HashMap;
use std::sync::Arc;

use snafu::ensure;
use tessel_ir::{AttrSubject, Expr, ForKind, IterVar, Stmt, StmtRewriter, Var, attr, substitute_stmt};

use crate::error::{
    Error, LoopMultiplicitySnafu, NonZeroDomainMinSnafu, PragmaArityMismatchSnafu, Result, ThreadExtentMismatchSnafu,
};
use crate::stage::{IterVarAttr, Stage};

/// Attach thread-binding and pragma attributes and fix up loop kinds for
/// every leaf iteration variable of `stage`.
///
/// For each (rebase-substituted) leaf the tree must contain exactly one loop
/// over its variable; the pass first scans to confirm that and to decide
/// whether any change is needed at all, counting pragma scopes already
/// stacked directly above the loop as done, so re-running it on its own
/// output is a no-op. A thread binding consumes the loop, so a bound leaf
/// cannot be annotated twice.
pub fn apply_loop_annotations(
    stage: &Stage,
    rebased: &HashMap<IterVar, IterVar>,
    mut stmt: Arc<Stmt>,
) -> Result<Arc<Stmt>> {
    for leaf in &stage.leaf_iter_vars {
        let actual = rebased.get(leaf).unwrap_or(leaf);
        let var = actual.var().clone();
        let attrs = stage.iter_var_attrs.get(leaf);
        let expected = attrs.and_then(|a| a.iter_kind).unwrap_or(leaf.kind()).for_kind();

        if let Some(attrs) = attrs {
            ensure!(
                attrs.pragma_keys.len() == attrs.pragma_values.len(),
                PragmaArityMismatchSnafu {
                    iter_var: leaf.var().name().to_owned(),
                    keys: attrs.pragma_keys.len(),
                    values: attrs.pragma_values.len()
                }
            );
        }

        let pragmas: Vec<(String, Expr)> = attrs
            .map(|a| {
                a.pragma_keys
                    .iter()
                    .zip(&a.pragma_values)
                    .map(|(key, value)| (format!("{}{key}", attr::PRAGMA_PREFIX), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let mut scan = LeafScan {
            var: &var,
            expected,
            bind_thread: attrs.is_some_and(|a| a.bind_thread.is_some()),
            pragmas,
            found: 0,
            need_change: false,
        };
        scan.visit(&stmt, &[]);
        ensure!(scan.found == 1, LoopMultiplicitySnafu { iter_var: var.name().to_owned(), found: scan.found });

        if scan.need_change {
            let mut annotator = LoopAnnotator { var: &var, attrs, expected, error: None };
            stmt = annotator.rewrite(&stmt);
            if let Some(error) = annotator.error {
                return Err(error);
            }
        }
    }
    Ok(stmt)
}

/// Pre-scan for one leaf: counts loops over `var` and decides whether the
/// annotator has anything left to do. `above` carries the pragma scopes
/// keyed on `var` sitting directly above the current node, outermost first;
/// a loop is up to date when that stack equals the expected pragma list and
/// the kind already matches.
struct LeafScan<'a> {
    var: &'a Var,
    expected: ForKind,
    bind_thread: bool,
    pragmas: Vec<(String, Expr)>,
    found: usize,
    need_change: bool,
}

impl LeafScan<'_> {
    fn visit(&mut self, stmt: &Arc<Stmt>, above: &[(String, Expr)]) {
        match stmt.as_ref() {
            Stmt::For { var, kind, body, .. } => {
                if var == self.var {
                    self.found += 1;
                    self.need_change |=
                        *kind != self.expected || self.bind_thread || above != self.pragmas.as_slice();
                }
                self.visit(body, &[]);
            }
            Stmt::AttrScope { subject, key, value, body } => {
                if subject.as_var() == Some(self.var) && key.starts_with(attr::PRAGMA_PREFIX) {
                    let mut chain = above.to_vec();
                    chain.push((key.clone(), value.clone()));
                    self.visit(body, &chain);
                } else {
                    self.visit(body, &[]);
                }
            }
            Stmt::IfThenElse { then_case, else_case, .. } => {
                self.visit(then_case, &[]);
                if let Some(else_case) = else_case {
                    self.visit(else_case, &[]);
                }
            }
            Stmt::Realize { body, .. } => self.visit(body, &[]),
            Stmt::Seq(stmts) => {
                for s in stmts {
                    self.visit(s, &[]);
                }
            }
            Stmt::Provide { .. } | Stmt::Evaluate(_) => {}
        }
    }
}

/// Rewrites the unique loop over `var` according to its attributes.
struct LoopAnnotator<'a> {
    var: &'a Var,
    attrs: Option<&'a IterVarAttr>,
    expected: ForKind,
    error: Option<Error>,
}

impl StmtRewriter for LoopAnnotator<'_> {
    fn rewrite_for(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        let Stmt::For { var, min, extent, kind, body } = stmt.as_ref() else { unreachable!() };
        if var != self.var {
            return self.rewrite_children(stmt);
        }

        let bind_thread = self.attrs.and_then(|a| a.bind_thread.as_ref());
        let mut ret = stmt.clone();

        if let Some(axis) = bind_thread {
            // The loop disappears: its variable becomes the thread axis and
            // an attribute scope declares the axis extent instead.
            if let Some(dom) = axis.dom() {
                if !dom.is_zero_based() {
                    self.error = Some(NonZeroDomainMinSnafu { iter_var: axis.var().name().to_owned() }.build());
                    return stmt.clone();
                }
                if dom.extent != *extent {
                    self.error = Some(ThreadExtentMismatchSnafu { axis: axis.var().name().to_owned() }.build());
                    return stmt.clone();
                }
            }
            let rmap = HashMap::from([(var.clone(), Expr::from(axis.var()))]);
            let new_body = substitute_stmt(body, &rmap);
            ret = Stmt::attr(AttrSubject::IterVar(axis.clone()), attr::THREAD_EXTENT, extent.clone(), new_body);
        } else if self.expected != *kind {
            ret = Stmt::loop_(var.clone(), min.clone(), extent.clone(), self.expected, body.clone());
        }

        if let Some(attrs) = self.attrs {
            // Reverse declaration order, so the first-declared pragma ends up
            // as the outermost scope.
            for (key, value) in attrs.pragma_keys.iter().zip(&attrs.pragma_values).rev() {
                ret = Stmt::attr(
                    AttrSubject::Var(var.clone()),
                    format!("{}{key}", attr::PRAGMA_PREFIX),
                    value.clone(),
                    ret,
                );
            }
        }
        ret
    }
}
