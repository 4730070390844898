//! Statement-tree IR for the tessel loop-nest rewriting engine.
//!
//! This crate defines the data structures every rewriting pass consumes and
//! produces, plus the traversal and substitution machinery they share.
//!
//! # Module Organization
//!
//! - [`expr`] - Symbolic expressions and identity-carrying variables
//! - [`stmt`] - The statement tree and attribute-scope keys
//! - [`iter_var`] - Iteration variables, kinds, and ranges
//! - [`tensor`] - Tensor/buffer handles and element types
//! - [`visit`] - Read-only post-order traversal
//! - [`rewrite`] - The [`StmtRewriter`] trait passes are built on
//! - [`subst`] - Variable substitution
//! - [`eval`] - Concrete evaluation of closed expressions (test oracle)
//!
//! Trees are persistent: nodes hold their children behind `Arc`, rewrites
//! share every untouched subtree, and nothing is ever mutated in place.

pub mod error;
pub mod eval;
pub mod expr;
pub mod iter_var;
pub mod rewrite;
pub mod stmt;
pub mod subst;
pub mod tensor;
pub mod visit;


pub use error::{Error, Result};
pub use eval::{eval_cond, eval_expr};
pub use expr::{Expr, TUPLE_INTRINSIC, Var};
pub use iter_var::{IterKind, IterVar, Range};
pub use rewrite::StmtRewriter;
pub use stmt::{AttrSubject, ForKind, Stmt, attr};
pub use subst::{substitute_expr, substitute_stmt};
pub use tensor::{Buffer, DType, Region, Tensor};
pub use visit::{loop_vars_outer_first, post_order_visit};
