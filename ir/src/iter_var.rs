//! Iteration variables: symbolic loop indices with a domain and a kind.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::expr::{Expr, Var};
use crate::stmt::ForKind;

/// How an iteration variable is meant to iterate.
///
/// `ThreadBound` marks a variable standing for a hardware thread axis;
/// `Opaque` marks one the scheduler must not touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterKind {
    Serial,
    Parallel,
    Vectorized,
    Unrolled,
    ThreadBound,
    Opaque,
}

impl IterKind {
    /// The loop kind a plain `For` over this variable gets.
    ///
    /// Thread-bound and opaque variables never become annotated loops on
    /// their own, so both map to a serial loop here.
    pub fn for_kind(self) -> ForKind {
        match self {
            IterKind::Parallel => ForKind::Parallel,
            IterKind::Vectorized => ForKind::Vectorized,
            IterKind::Unrolled => ForKind::Unrolled,
            IterKind::Serial | IterKind::ThreadBound | IterKind::Opaque => ForKind::Serial,
        }
    }
}

impl From<ForKind> for IterKind {
    fn from(kind: ForKind) -> Self {
        match kind {
            ForKind::Serial => IterKind::Serial,
            ForKind::Parallel => IterKind::Parallel,
            ForKind::Vectorized => IterKind::Vectorized,
            ForKind::Unrolled => IterKind::Unrolled,
        }
    }
}

/// A half-open iteration range `[min, min + extent)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub min: Expr,
    pub extent: Expr,
}

impl Range {
    pub fn by_min_extent(min: impl Into<Expr>, extent: impl Into<Expr>) -> Self {
        Self { min: min.into(), extent: extent.into() }
    }

    /// Whether the range starts at the constant zero.
    pub fn is_zero_based(&self) -> bool {
        self.min.is_const_int(0)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {} + {})", self.min, self.min, self.extent)
    }
}

#[derive(Debug)]
struct IterVarNode {
    var: Var,
    dom: Option<Range>,
    kind: IterKind,
}

/// A symbolic loop index paired with an optional domain and an [`IterKind`].
///
/// Identity follows the underlying [`Var`]: two `IterVar`s compare equal iff
/// they wrap the identical variable. Domains are optional because schedule
/// relations may introduce variables whose ranges arrive later through the
/// external domain map.
#[derive(Debug, Clone)]
pub struct IterVar(Arc<IterVarNode>);

impl IterVar {
    pub fn new(var: Var, dom: Option<Range>, kind: IterKind) -> Self {
        Self(Arc::new(IterVarNode { var, dom, kind }))
    }

    /// Fresh variable without a domain; the domain map must cover it.
    pub fn named(name: impl Into<String>, kind: IterKind) -> Self {
        Self::new(Var::new(name), None, kind)
    }

    /// Fresh variable with its own zero-based domain.
    pub fn with_extent(name: impl Into<String>, extent: impl Into<Expr>, kind: IterKind) -> Self {
        Self::new(Var::new(name), Some(Range::by_min_extent(0, extent)), kind)
    }

    pub fn var(&self) -> &Var {
        &self.0.var
    }

    pub fn dom(&self) -> Option<&Range> {
        self.0.dom.as_ref()
    }

    pub fn kind(&self) -> IterKind {
        self.0.kind
    }
}

impl PartialEq for IterVar {
    fn eq(&self, other: &Self) -> bool {
        self.0.var == other.0.var
    }
}

impl Eq for IterVar {}

impl Hash for IterVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.var.hash(state);
    }
}

impl fmt::Display for IterVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.dom {
            Some(dom) => write!(f, "{} in {}", self.0.var, dom),
            None => write!(f, "{}", self.0.var),
        }
    }
}
