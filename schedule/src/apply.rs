//! Schedule-application orchestrator.

use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;
use snafu::ensure;
use tessel_ir::{IterVar, Stmt};

use crate::error::{MissingDomainSnafu, RebaseParentUndefinedSnafu, Result};
use crate::passes::{apply_loop_annotations, apply_loop_order, apply_loop_shapes};
use crate::stage::{DomainMap, Relation, Stage};

/// Rewrite `stmt` so its loop structure matches `stage`'s schedule.
///
/// Rebase relations are resolved first into a rebased→parent map — they are
/// never materialized as tree rewrites, they only change which identities the
/// order and annotation passes compare. The passes then run strictly in
/// sequence: shape, order, annotation.
#[tracing::instrument(
    skip_all,
    fields(relations = stage.relations.len(), leaves = %stage.leaf_iter_vars.iter().map(|v| v.var().name()).join(","))
)]
pub fn apply_schedule(stage: &Stage, dom_map: &DomainMap, stmt: Arc<Stmt>) -> Result<Arc<Stmt>> {
    let mut rebased: HashMap<IterVar, IterVar> = HashMap::new();
    for relation in &stage.relations {
        if let Relation::Rebase { parent, rebased: rebased_var } = relation {
            ensure!(
                parent.dom().is_some(),
                RebaseParentUndefinedSnafu { rebased: rebased_var.var().name().to_owned() }
            );
            ensure!(
                dom_map.contains_key(rebased_var),
                MissingDomainSnafu { iter_var: rebased_var.var().name().to_owned() }
            );
            rebased.insert(rebased_var.clone(), parent.clone());
        }
    }

    let stmt = apply_loop_shapes(stage, dom_map, stmt)?;
    let stmt = apply_loop_order(stage, dom_map, &rebased, stmt)?;
    apply_loop_annotations(stage, &rebased, stmt)
}
