//! Tensor and buffer handles.
//!
//! Tensors are what user computations read and write; buffers are the storage
//! the lowering stage eventually binds them to. Both are identity-carrying
//! handles: equality and hashing go through a stable unique ID so they can key
//! rename maps and bound-tracking tables.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::expr::Expr;
use crate::iter_var::Range;

static NEXT_TENSOR_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(0);

/// Element type of a tensor or buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DType {
    #[display("bool")]
    Bool,
    #[display("i32")]
    Int32,
    #[display("i64")]
    Int64,
    #[display("f16")]
    Float16,
    #[display("f32")]
    Float32,
    #[display("f64")]
    Float64,
}

/// A multi-dimensional region: one `(min, extent)` range per dimension.
pub type Region = SmallVec<[Range; 4]>;

#[derive(Debug)]
struct TensorNode {
    id: u64,
    name: String,
    shape: SmallVec<[Expr; 4]>,
    dtype: DType,
    value_index: usize,
}

/// Identity-carrying tensor handle.
///
/// `value_index` distinguishes the outputs of a multi-output operation; it is
/// bookkeeping only and does not participate in identity.
#[derive(Debug, Clone)]
pub struct Tensor(Arc<TensorNode>);

impl Tensor {
    pub fn new(name: impl Into<String>, shape: impl IntoIterator<Item = Expr>, dtype: DType) -> Self {
        Self::with_value_index(name, shape, dtype, 0)
    }

    pub fn with_value_index(
        name: impl Into<String>,
        shape: impl IntoIterator<Item = Expr>,
        dtype: DType,
        value_index: usize,
    ) -> Self {
        Self(Arc::new(TensorNode {
            id: NEXT_TENSOR_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            shape: shape.into_iter().collect(),
            dtype,
            value_index,
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn shape(&self) -> &[Expr] {
        &self.0.shape
    }

    pub fn ndim(&self) -> usize {
        self.0.shape.len()
    }

    pub fn dtype(&self) -> DType {
        self.0.dtype
    }

    pub fn value_index(&self) -> usize {
        self.0.value_index
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Tensor {}

impl Hash for Tensor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.0.name, self.0.dtype)
    }
}

#[derive(Debug)]
struct BufferNode {
    id: u64,
    name: String,
    shape: SmallVec<[Expr; 4]>,
    dtype: DType,
}

/// Identity-carrying buffer handle.
#[derive(Debug, Clone)]
pub struct Buffer(Arc<BufferNode>);

impl Buffer {
    /// Declare a fresh buffer covering `shape` elements of `dtype`.
    pub fn decl(name: impl Into<String>, shape: impl IntoIterator<Item = Expr>, dtype: DType) -> Self {
        Self(Arc::new(BufferNode {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            shape: shape.into_iter().collect(),
            dtype,
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn shape(&self) -> &[Expr] {
        &self.0.shape
    }

    pub fn dtype(&self) -> DType {
        self.0.dtype
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Buffer {}

impl Hash for Buffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}: {}", self.0.name, self.0.dtype)
    }
}
