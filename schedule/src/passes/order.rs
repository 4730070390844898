//! Loop-Order pass: reconcile the tree's loop nesting with the stage's
//! required leaf order.
//!
//! # Algorithm
//!
//! Repeat until the current order (outermost to innermost) equals the
//! required one: scan the current order backwards to the last mismatching
//! position, find where that loop belongs in the required order, then extract
//! its `For` node (splicing the body up, carrying along any attribute scopes
//! keyed on the same variable) and re-insert it as a wrapper around the loop
//! that must come immediately after it.
//!
//! Every iteration places the moved loop correctly relative to at least one
//! more neighbor, so the fixpoint terminates within O(n²) iterations for n
//! loops; an iteration that cannot find an out-of-order loop while the orders
//! still differ is an internal invariant failure, not a user error.
//!
//! ```text
//! current:  io ii jo ji      required: ji ii io jo
//! io ii jo ji -> io ji ii jo -> ii io ji jo -> ji ii io jo
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;
use snafu::ensure;
use tessel_ir::{AttrSubject, Expr, ForKind, IterVar, Range, Stmt, StmtRewriter, Var, loop_vars_outer_first};

use crate::error::{LeafOrderMismatchSnafu, MissingDomainSnafu, NoReorderProgressSnafu, Result};
use crate::stage::{DomainMap, Stage};

/// Rewrite `stmt` so its loops nest in the stage's required leaf order.
///
/// `rebased` maps rebased variables to their parents so order comparisons use
/// parent identities where the schedule renamed a loop.
pub fn apply_loop_order(
    stage: &Stage,
    dom_map: &DomainMap,
    rebased: &HashMap<IterVar, IterVar>,
    mut stmt: Arc<Stmt>,
) -> Result<Arc<Stmt>> {
    let required = required_order(stage, dom_map, rebased)?;
    let mut current = loop_vars_outer_first(&stmt);
    ensure!(
        current.len() == required.len(),
        LeafOrderMismatchSnafu { current: current.len(), required: required.len() }
    );

    let mut iterations = 0usize;
    while reorder_needed(&current, &required) {
        let plan = MovePlan::locate(&current, &required, stage, dom_map)?;
        tracing::trace!(moved = %plan.target.var(), above = %plan.after_var, iteration = iterations, "moving loop");

        let mut extractor = LoopExtractor { target: plan.target.var().clone(), collected: SmallVec::new() };
        let extracted = extractor.rewrite(&stmt);
        let mut inserter = LoopInserter { plan: &plan, collected: extractor.collected, done: false };
        stmt = inserter.rewrite(&extracted);

        let next = loop_vars_outer_first(&stmt);
        ensure!(next != current, NoReorderProgressSnafu);
        current = next;
        iterations += 1;
    }
    tracing::debug!(loops = current.len(), iterations, "loop order reconciled");
    Ok(stmt)
}

/// The stage's leaf order with rebase substitution applied, every entry's
/// domain checked resolvable.
fn required_order(stage: &Stage, dom_map: &DomainMap, rebased: &HashMap<IterVar, IterVar>) -> Result<Vec<IterVar>> {
    stage
        .leaf_iter_vars
        .iter()
        .map(|leaf| {
            let required = rebased.get(leaf).unwrap_or(leaf);
            ensure!(
                required.dom().is_some() || dom_map.contains_key(required),
                MissingDomainSnafu { iter_var: required.var().name().to_owned() }
            );
            Ok(required.clone())
        })
        .collect()
}

fn reorder_needed(current: &[Var], required: &[IterVar]) -> bool {
    current.iter().zip(required).any(|(cur, req)| cur != req.var())
}

/// One extract/insert cycle, fully resolved before any tree surgery.
struct MovePlan {
    /// The out-of-place loop, as the (possibly rebased) required iteration
    /// variable it must be rebuilt from.
    target: IterVar,
    /// Loop variable the rebuilt loop must wrap.
    after_var: Var,
    /// Domain for the rebuilt loop: the target's own, else the domain map's.
    range: Range,
    kind: ForKind,
}

impl MovePlan {
    /// Scan backwards for the last position where current and required
    /// disagree, then find where that loop's variable belongs in the
    /// required order.
    fn locate(current: &[Var], required: &[IterVar], stage: &Stage, dom_map: &DomainMap) -> Result<Self> {
        for i in (1..=current.len()).rev() {
            if current[i - 1] == *required[i - 1].var() {
                continue;
            }
            for j in (1..i).rev() {
                if current[i - 1] == *required[j - 1].var() {
                    let target = required[j - 1].clone();
                    let range = match target.dom() {
                        Some(dom) => dom.clone(),
                        None => dom_map
                            .get(&target)
                            .cloned()
                            .ok_or_else(|| MissingDomainSnafu { iter_var: target.var().name().to_owned() }.build())?,
                    };
                    let kind = stage
                        .iter_var_attrs
                        .get(&target)
                        .and_then(|attr| attr.iter_kind)
                        .unwrap_or(target.kind())
                        .for_kind();
                    return Ok(Self { target, after_var: required[j].var().clone(), range, kind });
                }
            }
        }
        // The orders differ, so some loop must have matched above.
        NoReorderProgressSnafu.fail()
    }
}

/// Deletes the targeted loop (splicing its body up) and collects the
/// attribute scopes keyed on the same variable, in top-to-bottom order.
struct LoopExtractor {
    target: Var,
    collected: SmallVec<[(AttrSubject, String, Expr); 2]>,
}

impl StmtRewriter for LoopExtractor {
    fn rewrite_for(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        let Stmt::For { var, body, .. } = stmt.as_ref() else { unreachable!() };
        if *var != self.target {
            return self.rewrite_children(stmt);
        }
        self.rewrite(body)
    }

    fn rewrite_attr_scope(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        let Stmt::AttrScope { subject, key, value, body } = stmt.as_ref() else { unreachable!() };
        if subject.as_var() != Some(&self.target) {
            return self.rewrite_children(stmt);
        }
        self.collected.push((subject.clone(), key.clone(), value.clone()));
        self.rewrite(body)
    }
}

/// Wraps the loop that must come immediately after the moved one in a fresh
/// loop over the target variable, re-attaching the collected attribute
/// scopes around it.
struct LoopInserter<'a> {
    plan: &'a MovePlan,
    collected: SmallVec<[(AttrSubject, String, Expr); 2]>,
    done: bool,
}

impl StmtRewriter for LoopInserter<'_> {
    fn rewrite_for(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        let Stmt::For { var, .. } = stmt.as_ref() else { unreachable!() };
        if self.done || *var != self.plan.after_var {
            return self.rewrite_children(stmt);
        }
        self.done = true;
        let mut body = Stmt::loop_(
            self.plan.target.var().clone(),
            self.plan.range.min.clone(),
            self.plan.range.extent.clone(),
            self.plan.kind,
            stmt.clone(),
        );
        // Innermost-recorded first, so the original top-to-bottom order among
        // the scopes is preserved around the rebuilt loop.
        for (subject, key, value) in self.collected.iter().rev() {
            body = Stmt::attr(subject.clone(), key.clone(), value.clone(), body);
        }
        body
    }
}
