//! The schedule model: relations between iteration variables, per-variable
//! attributes, and the stage that bundles them with a required leaf order.

use std::collections::HashMap;

use tessel_ir::{Expr, IterKind, IterVar, Range};

/// How a schedule relates iteration variables to each other.
#[derive(Debug, Clone)]
pub enum Relation {
    /// `parent` is decomposed into `outer × inner` with
    /// `parent = inner + outer * factor`.
    Split { parent: IterVar, outer: IterVar, inner: IterVar, factor: Expr },
    /// `outer` and `inner` collapse into `fused` with
    /// `outer = fused / extent(inner)` and `inner = fused % extent(inner)`.
    Fuse { outer: IterVar, inner: IterVar, fused: IterVar },
    /// Pure renaming: `rebased` stands for `parent`, no shape change.
    Rebase { parent: IterVar, rebased: IterVar },
}

/// Per-iteration-variable schedule attributes.
///
/// `pragma_keys` and `pragma_values` are parallel lists; their order is
/// significant and preserved. The first-declared pragma becomes the outermost
/// scope when the annotation pass materializes them.
#[derive(Debug, Clone, Default)]
pub struct IterVarAttr {
    /// Thread axis this variable is bound to, if any. Binding replaces the
    /// loop with a thread-extent attribute scope.
    pub bind_thread: Option<IterVar>,
    /// Overrides the variable's own declared kind.
    pub iter_kind: Option<IterKind>,
    pub pragma_keys: Vec<String>,
    pub pragma_values: Vec<Expr>,
}

impl IterVarAttr {
    pub fn bound_to(axis: IterVar) -> Self {
        Self { bind_thread: Some(axis), ..Self::default() }
    }

    pub fn with_kind(kind: IterKind) -> Self {
        Self { iter_kind: Some(kind), ..Self::default() }
    }

    pub fn with_pragma(mut self, key: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.pragma_keys.push(key.into());
        self.pragma_values.push(value.into());
        self
    }
}

/// External mapping from iteration variable to its concrete range.
///
/// Supplied by the bound-inference collaborator; must cover every variable
/// the passes dereference that does not carry its own domain.
pub type DomainMap = HashMap<IterVar, Range>;

/// A stage: the complete schedule for one operation.
///
/// `leaf_iter_vars` is the required final nesting order, outermost first.
/// Relations apply in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Stage {
    pub leaf_iter_vars: Vec<IterVar>,
    pub relations: Vec<Relation>,
    pub iter_var_attrs: HashMap<IterVar, IterVarAttr>,
}

impl Stage {
    pub fn new(leaf_iter_vars: impl IntoIterator<Item = IterVar>) -> Self {
        Self { leaf_iter_vars: leaf_iter_vars.into_iter().collect(), ..Self::default() }
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn with_attr(mut self, iter_var: IterVar, attr: IterVarAttr) -> Self {
        self.iter_var_attrs.insert(iter_var, attr);
        self
    }
}
