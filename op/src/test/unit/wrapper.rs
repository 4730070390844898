use std::collections::HashMap;
use std::sync::Arc;

use test_case::test_case;
use tessel_ir::{DType, Expr, IterKind, Range, Stmt, Tensor};
use tessel_schedule::DomainMap;

use crate::bounds::TensorDom;
use crate::error::Error;
use crate::test::helpers::elementwise_op;

#[test_case(1)]
#[test_case(8)]
#[test_case(1024)]
fn axis_list_comes_from_the_body(n: i64) {
    let (op, _a, _b) = elementwise_op(n);
    let axis = op.root_iter_vars();
    assert_eq!(axis.len(), 1);
    assert_eq!(axis[0].var().name(), "i");
    assert_eq!(axis[0].kind(), IterKind::Serial);
    assert_eq!(axis[0].dom().unwrap().extent, Expr::Const(n));
}

#[test]
fn accessors_report_the_declared_outputs() {
    let (op, a, _b) = elementwise_op(8);
    assert_eq!(op.num_outputs(), 1);
    assert_eq!(op.output_dtype(0), DType::Float32);
    assert_eq!(op.output_shape(0), [Expr::Const(8)]);
    assert_eq!(op.input_tensors(), [a]);
}

#[test]
fn replace_inputs_without_matches_returns_the_same_op() {
    let (op, _a, _b) = elementwise_op(8);
    let unrelated = Tensor::new("u", [Expr::Const(8)], DType::Float32);
    let fresh = Tensor::new("v", [Expr::Const(8)], DType::Float32);

    let replaced = op.replace_inputs(&HashMap::from([(unrelated, fresh)]));
    assert!(Arc::ptr_eq(&op, &replaced));
}

#[test]
fn replace_inputs_rewrites_the_list_and_the_loads() {
    let (op, a, _b) = elementwise_op(8);
    let fresh = Tensor::new("a2", [Expr::Const(8)], DType::Float32);

    let replaced = op.replace_inputs(&HashMap::from([(a.clone(), fresh.clone())]));
    assert!(!Arc::ptr_eq(&op, &replaced));
    assert_eq!(replaced.input_tensors(), [fresh.clone()]);

    let mut loads_fresh = false;
    tessel_ir::post_order_visit(replaced.body(), &mut |s| {
        if let Stmt::Provide { value: Expr::Add(lhs, _), .. } = s {
            loads_fresh = matches!(lhs.as_ref(), Expr::Load { tensor, .. } if *tensor == fresh);
        }
    });
    assert!(loads_fresh);
}

#[test]
fn gather_bound_installs_every_axis_domain() {
    let (op, _a, _b) = elementwise_op(8);
    let mut doms = DomainMap::new();
    op.gather_bound(&mut doms).unwrap();

    assert_eq!(doms.len(), 1);
    let axis = &op.root_iter_vars()[0];
    assert_eq!(doms[axis], Range::by_min_extent(0, 8));
}

#[test]
fn gather_bound_rejects_an_already_bound_axis() {
    let (op, _a, _b) = elementwise_op(8);
    let mut doms = DomainMap::new();
    doms.insert(op.root_iter_vars()[0].clone(), Range::by_min_extent(0, 8));

    let err = op.gather_bound(&mut doms).unwrap_err();
    assert!(matches!(err, Error::DuplicateBinding { .. }));
}

#[test]
fn prop_bound_pushes_full_ranges_for_open_inputs_only() {
    let (op, a, _b) = elementwise_op(8);
    let closed = Tensor::new("closed", [Expr::Const(8)], DType::Float32);
    let mut records = HashMap::from([(a.clone(), TensorDom::new(1))]);

    op.prop_bound_to_inputs(&mut records);

    assert_eq!(records[&a].data[0], [Range::by_min_extent(0, 8)]);
    assert!(!records.contains_key(&closed));
}

#[test]
fn build_realize_wraps_the_first_output_innermost() {
    let (op, _a, b) = elementwise_op(8);
    let b2 = Tensor::new("b2", [Expr::Const(8), Expr::Const(2)], DType::Float32);

    let realized = op.build_realize(&[b.clone(), b2.clone()], op.body().clone());

    let Stmt::Realize { tensor, bounds, body } = realized.as_ref() else { panic!("missing outer realize") };
    assert_eq!(*tensor, b2);
    assert_eq!(bounds.len(), 2);
    assert_eq!(bounds[1], Range::by_min_extent(0, 2));

    let Stmt::Realize { tensor, body, .. } = body.as_ref() else { panic!("missing inner realize") };
    assert_eq!(*tensor, b);
    assert!(Arc::ptr_eq(body, op.body()));
}
