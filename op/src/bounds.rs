//! Per-tensor bound-contribution records.

use tessel_ir::Range;

/// Range contributions for one tensor, one list per dimension.
///
/// Operations push the spans they touch; the external bound-inference
/// collaborator unions each dimension's entries into allocation bounds.
#[derive(Debug, Clone, Default)]
pub struct TensorDom {
    pub data: Vec<Vec<Range>>,
}

impl TensorDom {
    pub fn new(ndim: usize) -> Self {
        Self { data: vec![Vec::new(); ndim] }
    }
}
