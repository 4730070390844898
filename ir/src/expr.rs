//! Symbolic scalar expressions and identity-carrying variables.
//!
//! Expressions are persistent trees: children are held behind [`Arc`], so a
//! rewrite builds a new spine and shares every untouched subtree. Nothing here
//! is hash-consed — the trees the rewriting passes handle are loop bounds and
//! index arithmetic, small enough that structural sharing alone is plenty.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::tensor::Tensor;

static NEXT_VAR_ID: AtomicU64 = AtomicU64::new(0);

/// Intrinsic name carried by the buffer-bind scope value: a flat tuple of
/// `(min, extent)` pairs, one per dimension, in declared dimension order.
/// Downstream lowering parses this exact shape.
pub const TUPLE_INTRINSIC: &str = "tessel_tuple";

#[derive(Debug)]
struct VarNode {
    id: u64,
    name: String,
}

/// A symbolic variable with stable identity.
///
/// Equality and hashing use the unique `id` only: two variables are never
/// equal unless they originate from the same [`Var::new`] call, no matter how
/// they are named. Clones share the underlying node.
#[derive(Debug, Clone)]
pub struct Var(Arc<VarNode>);

impl Var {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::new(VarNode { id: NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed), name: name.into() }))
    }

    /// Stable unique ID for this variable instance.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Var {}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// Symbolic integer expression.
///
/// The variant set is closed: passes dispatch by `match`, not by virtual
/// calls. `Load` and `Call` are opaque to arithmetic — substitution walks
/// into their arguments, evaluation refuses them.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(i64),
    Var(Var),
    Add(Arc<Expr>, Arc<Expr>),
    Sub(Arc<Expr>, Arc<Expr>),
    Mul(Arc<Expr>, Arc<Expr>),
    /// Floor division (`indexdiv` in scheduling literature).
    FloorDiv(Arc<Expr>, Arc<Expr>),
    /// Floor modulo (`indexmod`).
    FloorMod(Arc<Expr>, Arc<Expr>),
    Min(Arc<Expr>, Arc<Expr>),
    Max(Arc<Expr>, Arc<Expr>),
    /// Strictly-less-than comparison, evaluating to 0 or 1.
    Lt(Arc<Expr>, Arc<Expr>),
    /// Branch hint: the wrapped condition is expected to hold on the hot path.
    Likely(Arc<Expr>),
    /// Element read from a tensor.
    Load { tensor: Tensor, indices: Vec<Expr> },
    /// Opaque call-like payload (e.g. the buffer-bind tuple intrinsic).
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn var(v: &Var) -> Self {
        Expr::Var(v.clone())
    }

    pub fn load(tensor: Tensor, indices: Vec<Expr>) -> Self {
        Expr::Load { tensor, indices }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call { name: name.into(), args }
    }

    pub fn floor_div(self, rhs: impl Into<Expr>) -> Self {
        Expr::FloorDiv(Arc::new(self), Arc::new(rhs.into()))
    }

    pub fn floor_mod(self, rhs: impl Into<Expr>) -> Self {
        Expr::FloorMod(Arc::new(self), Arc::new(rhs.into()))
    }

    pub fn min(self, rhs: impl Into<Expr>) -> Self {
        Expr::Min(Arc::new(self), Arc::new(rhs.into()))
    }

    pub fn max(self, rhs: impl Into<Expr>) -> Self {
        Expr::Max(Arc::new(self), Arc::new(rhs.into()))
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Self {
        Expr::Lt(Arc::new(self), Arc::new(rhs.into()))
    }

    pub fn likely(self) -> Self {
        Expr::Likely(Arc::new(self))
    }

    /// Whether this expression is the integer constant `value`.
    pub fn is_const_int(&self, value: i64) -> bool {
        matches!(self, Expr::Const(c) if *c == value)
    }

    /// The variable behind this expression, if it is a bare variable.
    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Expr::Var(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Const(value)
    }
}

impl From<Var> for Expr {
    fn from(value: Var) -> Self {
        Expr::Var(value)
    }
}

impl From<&Var> for Expr {
    fn from(value: &Var) -> Self {
        Expr::Var(value.clone())
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl<R: Into<Expr>> std::ops::$trait<R> for Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::$variant(Arc::new(self), Arc::new(rhs.into()))
            }
        }

        impl<R: Into<Expr>> std::ops::$trait<R> for &Var {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::$variant(Arc::new(Expr::from(self)), Arc::new(rhs.into()))
            }
        }
    };
}

impl_binary_op!(Add, add, Add);
impl_binary_op!(Sub, sub, Sub);
impl_binary_op!(Mul, mul, Mul);

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{c}"),
            Expr::Var(v) => write!(f, "{v}"),
            Expr::Add(a, b) => write!(f, "({a} + {b})"),
            Expr::Sub(a, b) => write!(f, "({a} - {b})"),
            Expr::Mul(a, b) => write!(f, "({a}*{b})"),
            Expr::FloorDiv(a, b) => write!(f, "({a} div {b})"),
            Expr::FloorMod(a, b) => write!(f, "({a} mod {b})"),
            Expr::Min(a, b) => write!(f, "min({a}, {b})"),
            Expr::Max(a, b) => write!(f, "max({a}, {b})"),
            Expr::Lt(a, b) => write!(f, "({a} < {b})"),
            Expr::Likely(c) => write!(f, "likely({c})"),
            Expr::Load { tensor, indices } => {
                write!(f, "{}[", tensor.name())?;
                for (i, idx) in indices.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{idx}")?;
                }
                write!(f, "]")
            }
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
