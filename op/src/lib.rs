//! Operation wrapper for the tessel loop-nest rewriting engine.
//!
//! A [`LoopNestOp`] packages an imperative loop-nest body with the tensors it
//! reads and writes. It knows how to report bound contributions, wrap its
//! outputs in `Realize` nodes, and lower itself to the scheduled provide form
//! consumed by the downstream lowering stage.
//!
//! # Module Organization
//!
//! - [`wrapper`] - [`LoopNestOp`] and its lowering entry points
//! - [`replace`] - Tensor renaming over statement trees
//! - [`bounds`] - Bound-contribution records for the inference collaborator
//! - [`error`] - Wrapper errors, transparently carrying schedule failures

pub mod bounds;
pub mod error;
pub mod replace;
pub mod wrapper;


pub use bounds::TensorDom;
pub use error::{Error, Result};
pub use replace::{replace_provide_tensor, replace_tensor};
pub use wrapper::LoopNestOp;
