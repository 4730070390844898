//! The statement tree: the common IR every rewriting pass consumes and
//! produces.
//!
//! Trees are persistent — children sit behind [`Arc`], constructors return
//! `Arc<Stmt>`, and a rewrite shares every subtree it does not touch. There
//! are no parent pointers and no in-place mutation.

use std::fmt;
use std::sync::Arc;

use crate::expr::{Expr, Var};
use crate::iter_var::IterVar;
use crate::tensor::{Buffer, Region, Tensor};

/// Attribute-scope keys with meaning fixed by the wire contract between the
/// rewriting core and the downstream lowering stage.
pub mod attr {
    /// Subject is `[buffer, tensor]`, value a [`TUPLE_INTRINSIC`] call with a
    /// flat `(min, extent)` pair per dimension.
    ///
    /// [`TUPLE_INTRINSIC`]: crate::expr::TUPLE_INTRINSIC
    pub const BUFFER_BIND_SCOPE: &str = "buffer_bind_scope";
    /// Subject is the thread-axis iteration variable, value its extent.
    pub const THREAD_EXTENT: &str = "thread_extent";
    /// Marks a body as an externally defined computation the core treats as
    /// opaque.
    pub const EXTERN_SCOPE: &str = "extern_scope";
    /// Pragma scopes are keyed `PRAGMA_PREFIX + pragma_key`.
    pub const PRAGMA_PREFIX: &str = "pragma_";
}

/// Execution kind of a `For` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ForKind {
    #[display("serial")]
    Serial,
    #[display("parallel")]
    Parallel,
    #[display("vectorized")]
    Vectorized,
    #[display("unrolled")]
    Unrolled,
}

/// What an [`Stmt::AttrScope`] is about.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrSubject {
    Var(Var),
    IterVar(IterVar),
    /// The `[buffer, tensor]` pair of a buffer-bind scope.
    BufferBind { buffer: Buffer, tensor: Tensor },
    /// Subject-less scopes (e.g. the extern-scope marker).
    Opaque(i64),
}

impl AttrSubject {
    /// The plain variable this scope is keyed on, if any.
    ///
    /// Scopes about iteration variables or buffer binds deliberately return
    /// `None`: only var-keyed scopes (pragmas) travel with a loop when the
    /// reorder pass moves it.
    pub fn as_var(&self) -> Option<&Var> {
        match self {
            AttrSubject::Var(v) => Some(v),
            _ => None,
        }
    }
}

/// A node of the statement tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    For { var: Var, min: Expr, extent: Expr, kind: ForKind, body: Arc<Stmt> },
    AttrScope { subject: AttrSubject, key: String, value: Expr, body: Arc<Stmt> },
    IfThenElse { cond: Expr, then_case: Arc<Stmt>, else_case: Option<Arc<Stmt>> },
    /// Write of `value` into `tensor[indices]`.
    Provide { tensor: Tensor, indices: Vec<Expr>, value: Expr },
    /// Bounding box for a tensor, consumed by downstream allocation.
    Realize { tensor: Tensor, bounds: Region, body: Arc<Stmt> },
    Seq(Vec<Arc<Stmt>>),
    /// Opaque computation leaf.
    Evaluate(Expr),
}

impl Stmt {
    pub fn loop_(var: Var, min: impl Into<Expr>, extent: impl Into<Expr>, kind: ForKind, body: Arc<Stmt>) -> Arc<Stmt> {
        Arc::new(Stmt::For { var, min: min.into(), extent: extent.into(), kind, body })
    }

    pub fn attr(subject: AttrSubject, key: impl Into<String>, value: impl Into<Expr>, body: Arc<Stmt>) -> Arc<Stmt> {
        Arc::new(Stmt::AttrScope { subject, key: key.into(), value: value.into(), body })
    }

    pub fn if_then(cond: Expr, then_case: Arc<Stmt>) -> Arc<Stmt> {
        Arc::new(Stmt::IfThenElse { cond, then_case, else_case: None })
    }

    pub fn if_then_else(cond: Expr, then_case: Arc<Stmt>, else_case: Arc<Stmt>) -> Arc<Stmt> {
        Arc::new(Stmt::IfThenElse { cond, then_case, else_case: Some(else_case) })
    }

    pub fn provide(tensor: Tensor, indices: Vec<Expr>, value: impl Into<Expr>) -> Arc<Stmt> {
        Arc::new(Stmt::Provide { tensor, indices, value: value.into() })
    }

    pub fn realize(tensor: Tensor, bounds: Region, body: Arc<Stmt>) -> Arc<Stmt> {
        Arc::new(Stmt::Realize { tensor, bounds, body })
    }

    pub fn seq(stmts: Vec<Arc<Stmt>>) -> Arc<Stmt> {
        Arc::new(Stmt::Seq(stmts))
    }

    pub fn evaluate(expr: impl Into<Expr>) -> Arc<Stmt> {
        Arc::new(Stmt::Evaluate(expr.into()))
    }

    /// The loop variable, if this node is a `For`.
    pub fn loop_var(&self) -> Option<&Var> {
        match self {
            Stmt::For { var, .. } => Some(var),
            _ => None,
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            write!(f, "{:width$}", "", width = depth * 2)
        }

        fn go(stmt: &Stmt, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            match stmt {
                Stmt::For { var, min, extent, kind, body } => {
                    indent(f, depth)?;
                    writeln!(f, "for {kind} {var} in [{min}, {min} + {extent}) {{")?;
                    go(body, f, depth + 1)?;
                    indent(f, depth)?;
                    writeln!(f, "}}")
                }
                Stmt::AttrScope { subject, key, value, body } => {
                    indent(f, depth)?;
                    match subject {
                        AttrSubject::Var(v) => writeln!(f, "// attr [{v}] {key} = {value}")?,
                        AttrSubject::IterVar(iv) => writeln!(f, "// attr [{}] {key} = {value}", iv.var())?,
                        AttrSubject::BufferBind { buffer, tensor } => {
                            writeln!(f, "// attr [{buffer}, {tensor}] {key} = {value}")?
                        }
                        AttrSubject::Opaque(n) => writeln!(f, "// attr [{n}] {key} = {value}")?,
                    }
                    go(body, f, depth)
                }
                Stmt::IfThenElse { cond, then_case, else_case } => {
                    indent(f, depth)?;
                    writeln!(f, "if ({cond}) {{")?;
                    go(then_case, f, depth + 1)?;
                    if let Some(else_case) = else_case {
                        indent(f, depth)?;
                        writeln!(f, "}} else {{")?;
                        go(else_case, f, depth + 1)?;
                    }
                    indent(f, depth)?;
                    writeln!(f, "}}")
                }
                Stmt::Provide { tensor, indices, value } => {
                    indent(f, depth)?;
                    write!(f, "{}[", tensor.name())?;
                    for (i, idx) in indices.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{idx}")?;
                    }
                    writeln!(f, "] = {value}")
                }
                Stmt::Realize { tensor, bounds, body } => {
                    indent(f, depth)?;
                    write!(f, "realize {}(", tensor.name())?;
                    for (i, r) in bounds.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{r}")?;
                    }
                    writeln!(f, ") {{")?;
                    go(body, f, depth + 1)?;
                    indent(f, depth)?;
                    writeln!(f, "}}")
                }
                Stmt::Seq(stmts) => {
                    for s in stmts {
                        go(s, f, depth)?;
                    }
                    Ok(())
                }
                Stmt::Evaluate(expr) => {
                    indent(f, depth)?;
                    writeln!(f, "eval {expr}")
                }
            }
        }

        go(self, f, 0)
    }
}
