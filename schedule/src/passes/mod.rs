//! The three tree-rewrite passes, applied in sequence by
//! [`apply_schedule`](crate::apply_schedule):
//!
//! - [`shape`] - realize Split and Fuse relations
//! - [`order`] - reconcile loop nesting with the required leaf order
//! - [`annotate`] - thread bindings, pragmas, loop-kind fixups

pub mod annotate;
pub mod order;
pub mod shape;

pub use annotate::apply_loop_annotations;
pub use order::apply_loop_order;
pub use shape::apply_loop_shapes;
