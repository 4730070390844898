use std::collections::HashMap;
use std::sync::Arc;

use tessel_ir::{
    AttrSubject, Buffer, DType, Expr, IterKind, IterVar, Range, Region, Stmt, TUPLE_INTRINSIC, Tensor, attr,
    loop_vars_outer_first, post_order_visit,
};
use tessel_schedule::{DomainMap, Relation, Stage};

use crate::error::Error;
use crate::test::helpers::elementwise_op;
use crate::wrapper::LoopNestOp;

/// Destructure one buffer-bind scope the way the downstream lowering does:
/// a two-element subject and a flat tuple call of `(min, extent)` pairs.
fn parse_bind(stmt: &Arc<Stmt>) -> (&Buffer, &Tensor, Vec<(Expr, Expr)>, &Arc<Stmt>) {
    let Stmt::AttrScope { subject: AttrSubject::BufferBind { buffer, tensor }, key, value, body } = stmt.as_ref()
    else {
        panic!("expected a buffer-bind scope, got:\n{stmt}")
    };
    assert_eq!(key, attr::BUFFER_BIND_SCOPE);
    let Expr::Call { name, args } = value else { panic!("bind value must be a call") };
    assert_eq!(name, TUPLE_INTRINSIC);
    assert_eq!(args.len() % 2, 0);
    let pairs = args.chunks(2).map(|c| (c[0].clone(), c[1].clone())).collect();
    (buffer, tensor, pairs, body)
}

fn identity_stage(op: &LoopNestOp) -> Stage {
    Stage::new(op.root_iter_vars().iter().cloned())
}

#[test]
fn provide_wires_binds_rename_and_extern_scope() {
    let (op, a, _b) = elementwise_op(8);
    let c = Tensor::new("c", [Expr::Const(8)], DType::Float32);

    let result = op.build_provide(&identity_stage(&op), &DomainMap::new(), &[c.clone()]).unwrap();

    // Input binds outermost, then output binds, then the extern marker.
    let (_, bound, pairs, body) = parse_bind(&result);
    assert_eq!(*bound, a);
    assert_eq!(pairs, [(Expr::Const(0), Expr::Const(8))]);

    let (_, bound, pairs, body) = parse_bind(body);
    assert_eq!(*bound, c);
    assert_eq!(pairs, [(Expr::Const(0), Expr::Const(8))]);

    let Stmt::AttrScope { subject, key, body, .. } = body.as_ref() else { panic!("missing extern marker") };
    assert_eq!(key, attr::EXTERN_SCOPE);
    assert_eq!(*subject, AttrSubject::Opaque(0));

    // The declared output is renamed to the canonical tensor inside the body.
    let Stmt::For { body, .. } = body.as_ref() else { panic!("loop must survive an identity schedule") };
    let Stmt::Provide { tensor, .. } = body.as_ref() else { panic!("provide must survive") };
    assert_eq!(*tensor, c);
}

#[test]
fn provide_uses_explicit_buffers_and_regions() {
    let a = Tensor::new("a", [Expr::Const(8)], DType::Float32);
    let b = Tensor::new("b", [Expr::Const(8)], DType::Float32);
    let buf = Buffer::decl("b_buf", [Expr::Const(8)], DType::Float32);
    let region: Region = [Range::by_min_extent(2, 3)].into_iter().collect();

    let i = tessel_ir::Var::new("i");
    let body = Stmt::loop_(
        i.clone(),
        0,
        8,
        tessel_ir::ForKind::Serial,
        Stmt::provide(b.clone(), vec![Expr::from(&i)], Expr::load(a.clone(), vec![Expr::from(&i)])),
    );
    let op = LoopNestOp::new(
        "windowed",
        "",
        HashMap::new(),
        vec![a],
        vec![b],
        vec![],
        vec![buf.clone()],
        vec![],
        vec![region],
        body,
    );
    let c = Tensor::new("c", [Expr::Const(8)], DType::Float32);

    let result = op.build_provide(&identity_stage(&op), &DomainMap::new(), &[c]).unwrap();

    // Skip the input bind; the output bind must carry the explicit pieces.
    let (_, _, _, body) = parse_bind(&result);
    let (bound_buf, _, pairs, _) = parse_bind(body);
    assert_eq!(*bound_buf, buf);
    assert_eq!(pairs, [(Expr::Const(2), Expr::Const(3))]);
}

#[test]
fn provide_applies_the_stage_schedule() {
    let (op, _a, _b) = elementwise_op(8);
    let c = Tensor::new("c", [Expr::Const(8)], DType::Float32);
    let parent = op.root_iter_vars()[0].clone();
    let io = IterVar::named("io", IterKind::Serial);
    let ii = IterVar::named("ii", IterKind::Serial);
    let doms = DomainMap::from([
        (io.clone(), Range::by_min_extent(0, 2)),
        (ii.clone(), Range::by_min_extent(0, 4)),
    ]);

    let stage = Stage::new([io.clone(), ii.clone()]).with_relation(Relation::Split {
        parent,
        outer: io,
        inner: ii,
        factor: Expr::Const(4),
    });
    let result = op.build_provide(&stage, &doms, &[c.clone()]).unwrap();

    let names: Vec<_> = loop_vars_outer_first(&result).iter().map(|v| v.name().to_owned()).collect();
    assert_eq!(names, ["io", "ii"]);

    let mut writes_c = false;
    post_order_visit(&result, &mut |s| {
        if let Stmt::Provide { tensor, .. } = s {
            writes_c = *tensor == c;
        }
    });
    assert!(writes_c);
}

#[test]
fn provide_rejects_an_output_arity_mismatch() {
    let (op, _a, _b) = elementwise_op(8);

    let err = op.build_provide(&identity_stage(&op), &DomainMap::new(), &[]).unwrap_err();
    assert!(matches!(err, Error::OutputArityMismatch { declared: 1, bound: 0, .. }));
}

#[test]
fn provide_surfaces_schedule_failures() {
    let (op, _a, _b) = elementwise_op(8);
    let c = Tensor::new("c", [Expr::Const(8)], DType::Float32);
    let ghost = IterVar::named("ghost", IterKind::Serial);
    let io = IterVar::named("io", IterKind::Serial);
    let ii = IterVar::named("ii", IterKind::Serial);

    // Split of a variable the body never loops over.
    let stage = Stage::new(op.root_iter_vars().iter().cloned()).with_relation(Relation::Split {
        parent: ghost,
        outer: io.clone(),
        inner: ii.clone(),
        factor: Expr::Const(4),
    });
    let doms = DomainMap::from([
        (io, Range::by_min_extent(0, 2)),
        (ii, Range::by_min_extent(0, 4)),
    ]);

    let err = op.build_provide(&stage, &doms, &[c]).unwrap_err();
    assert!(matches!(err, Error::Schedule { .. }));
}
