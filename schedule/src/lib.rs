//! Schedule model and loop-nest rewriting passes for the tessel compiler.
//!
//! Given a statement tree and a [`Stage`] — split/fuse/rebase relations, a
//! required leaf order, per-variable attributes — [`apply_schedule`] rewrites
//! the tree so its loop structure matches the schedule while preserving the
//! computation's semantics.
//!
//! # Module Organization
//!
//! - [`stage`] - Relations, attributes, [`Stage`], [`DomainMap`]
//! - [`passes`] - The three rewrite passes (shape, order, annotate)
//! - [`apply`] - The orchestrator sequencing them
//! - [`gather`] - Loop-variable discovery
//! - [`error`] - Error taxonomy (malformed schedule vs invariant violation)
//!
//! All rewriting is single-threaded, synchronous, and side-effect-free:
//! every pass is a pure function from tree to tree over persistent
//! structures, and failures abort without returning a partial tree.

pub mod apply;
pub mod error;
pub mod gather;
pub mod passes;
pub mod stage;


pub use apply::apply_schedule;
pub use error::{Error, Result};
pub use gather::gather_loop_vars;
pub use passes::{apply_loop_annotations, apply_loop_order, apply_loop_shapes};
pub use stage::{DomainMap, IterVarAttr, Relation, Stage};
