//! The operation wrapper: an imperative loop-nest body packaged with its
//! tensors, buffers, and discovered axis list.

use std::collections::HashMap;
use std::sync::Arc;

use snafu::ensure;
use tessel_ir::{AttrSubject, Buffer, DType, Expr, IterVar, Range, Region, Stmt, TUPLE_INTRINSIC, Tensor, attr};
use tessel_schedule::{DomainMap, Stage, apply_schedule, gather_loop_vars};

use crate::bounds::TensorDom;
use crate::error::{DuplicateBindingSnafu, OutputArityMismatchSnafu, Result};
use crate::replace::{replace_provide_tensor, replace_tensor};

/// An operation whose computation is an imperative loop nest writing its
/// declared output tensors.
///
/// The axis list is discovered from the body at construction and the value is
/// immutable afterwards; [`LoopNestOp::replace_inputs`] is a functional
/// update. Buffer and region lists may be shorter than the tensor lists: a
/// missing entry means "synthesize a full-extent binding".
#[derive(Debug, Clone)]
pub struct LoopNestOp {
    name: String,
    tag: String,
    attrs: HashMap<String, Expr>,
    inputs: Vec<Tensor>,
    outputs: Vec<Tensor>,
    input_buffers: Vec<Buffer>,
    output_buffers: Vec<Buffer>,
    input_regions: Vec<Region>,
    output_regions: Vec<Region>,
    body: Arc<Stmt>,
    axis: Vec<IterVar>,
}

impl LoopNestOp {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        tag: impl Into<String>,
        attrs: HashMap<String, Expr>,
        inputs: Vec<Tensor>,
        outputs: Vec<Tensor>,
        input_buffers: Vec<Buffer>,
        output_buffers: Vec<Buffer>,
        input_regions: Vec<Region>,
        output_regions: Vec<Region>,
        body: Arc<Stmt>,
    ) -> Arc<Self> {
        let axis = gather_loop_vars(&body);
        Arc::new(Self {
            name: name.into(),
            tag: tag.into(),
            attrs,
            inputs,
            outputs,
            input_buffers,
            output_buffers,
            input_regions,
            output_regions,
            body,
            axis,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &HashMap<String, Expr> {
        &self.attrs
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn output_dtype(&self, i: usize) -> DType {
        self.outputs[i].dtype()
    }

    pub fn output_shape(&self, i: usize) -> &[Expr] {
        self.outputs[i].shape()
    }

    /// The loop variables of the body, outermost first.
    pub fn root_iter_vars(&self) -> &[IterVar] {
        &self.axis
    }

    pub fn input_tensors(&self) -> &[Tensor] {
        &self.inputs
    }

    pub fn body(&self) -> &Arc<Stmt> {
        &self.body
    }

    /// Functionally update the op with renamed input tensors, rewriting the
    /// body's loads. Returns `self`'s `Arc` unchanged when nothing matched.
    pub fn replace_inputs(self: &Arc<Self>, rmap: &HashMap<Tensor, Tensor>) -> Arc<Self> {
        let body = replace_tensor(&self.body, rmap);
        let inputs: Vec<Tensor> = self.inputs.iter().map(|t| rmap.get(t).unwrap_or(t).clone()).collect();
        if Arc::ptr_eq(&body, &self.body) && inputs == self.inputs {
            return self.clone();
        }
        Arc::new(Self { body, inputs, ..(**self).clone() })
    }

    /// Report this op's demand on its inputs: the full shape of every input
    /// that has an open record, never anything tighter.
    pub fn prop_bound_to_inputs(&self, out_dom_map: &mut HashMap<Tensor, TensorDom>) {
        for input in &self.inputs {
            if let Some(dom) = out_dom_map.get_mut(input) {
                for (k, extent) in input.shape().iter().enumerate() {
                    dom.data[k].push(Range::by_min_extent(0, extent.clone()));
                }
            }
        }
    }

    /// Install every axis's declared domain into `out_dom_map`.
    pub fn gather_bound(&self, out_dom_map: &mut DomainMap) -> Result<()> {
        for iv in &self.axis {
            ensure!(
                !out_dom_map.contains_key(iv),
                DuplicateBindingSnafu { iter_var: iv.var().name().to_owned() }
            );
            if let Some(dom) = iv.dom() {
                out_dom_map.insert(iv.clone(), dom.clone());
            }
        }
        Ok(())
    }

    /// Wrap `body` in one `Realize` per output with full-shape zero-based
    /// bounds, the first output innermost.
    pub fn build_realize(&self, bound_outputs: &[Tensor], body: Arc<Stmt>) -> Arc<Stmt> {
        let mut ret = body;
        for tensor in bound_outputs {
            let bounds: Region = tensor.shape().iter().map(|e| Range::by_min_extent(0, e.clone())).collect();
            ret = Stmt::realize(tensor.clone(), bounds, ret);
        }
        ret
    }

    /// Lower the body to its scheduled provide form. `bound_outputs` must
    /// supply one canonical tensor per declared output.
    ///
    /// Wraps the body in an extern-scope marker, declares a buffer-bind scope
    /// per output then per input (explicit buffer/region when given, a
    /// synthesized full-extent binding otherwise), renames the declared
    /// outputs to the canonical `bound_outputs` over loads and provides, and
    /// finally applies the stage's schedule.
    #[tracing::instrument(skip_all, fields(op = %self.name))]
    pub fn build_provide(&self, stage: &Stage, dom_map: &DomainMap, bound_outputs: &[Tensor]) -> Result<Arc<Stmt>> {
        ensure!(
            bound_outputs.len() == self.outputs.len(),
            OutputArityMismatchSnafu { op: &self.name, declared: self.outputs.len(), bound: bound_outputs.len() }
        );
        let mut ret = Stmt::attr(AttrSubject::Opaque(0), attr::EXTERN_SCOPE, 0, self.body.clone());

        for i in (0..self.outputs.len()).rev() {
            ret = push_bind(
                ret,
                self.output_buffers.get(i),
                self.output_regions.get(i),
                &bound_outputs[i],
            );
        }
        for i in (0..self.inputs.len()).rev() {
            ret = push_bind(ret, self.input_buffers.get(i), self.input_regions.get(i), &self.inputs[i]);
        }

        // The body writes the tensors the op declared; the surrounding graph
        // knows them under the canonical handles. Rename late so the binds
        // above already carry the canonical ones.
        let rmap: HashMap<Tensor, Tensor> =
            self.outputs.iter().cloned().zip(bound_outputs.iter().cloned()).collect();
        ret = replace_tensor(&ret, &rmap);
        ret = replace_provide_tensor(&ret, &rmap);

        Ok(apply_schedule(stage, dom_map, ret)?)
    }
}

/// Wrap `body` in a buffer-bind scope for `tensor`.
///
/// The scope's value is the flat `(min, extent)` tuple the downstream
/// lowering parses; without an explicit region it covers the full shape.
fn push_bind(body: Arc<Stmt>, buffer: Option<&Buffer>, region: Option<&Region>, tensor: &Tensor) -> Arc<Stmt> {
    let buffer = match buffer {
        Some(b) => b.clone(),
        None => Buffer::decl(tensor.name(), tensor.shape().iter().cloned(), tensor.dtype()),
    };
    let mut tuple = Vec::with_capacity(tensor.ndim() * 2);
    match region {
        Some(region) => {
            for r in region {
                tuple.push(r.min.clone());
                tuple.push(r.extent.clone());
            }
        }
        None => {
            for extent in tensor.shape() {
                tuple.push(Expr::Const(0));
                tuple.push(extent.clone());
            }
        }
    }
    Stmt::attr(
        AttrSubject::BufferBind { buffer, tensor: tensor.clone() },
        attr::BUFFER_BIND_SCOPE,
        Expr::call(TUPLE_INTRINSIC, tuple),
        body,
    )
}
