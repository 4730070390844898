use std::collections::HashMap;

use crate::expr::{Expr, Var};
use crate::iter_var::{IterKind, IterVar, Range};
use crate::tensor::{DType, Tensor};

#[test]
fn var_identity_not_name_based() {
    let a = Var::new("i");
    let b = Var::new("i");
    assert_ne!(a, b, "same name must not imply same variable");
    assert_eq!(a, a.clone());
    assert_ne!(a.id(), b.id());
}

#[test]
fn var_usable_as_map_key() {
    let a = Var::new("i");
    let b = Var::new("i");
    let mut map = HashMap::new();
    map.insert(a.clone(), 1);
    map.insert(b.clone(), 2);
    assert_eq!(map[&a], 1);
    assert_eq!(map[&b], 2);
}

#[test]
fn operator_builders_produce_expected_tree() {
    let i = Var::new("i");
    let e = &i * 4 + 1;
    match e {
        Expr::Add(lhs, rhs) => {
            assert!(matches!(lhs.as_ref(), Expr::Mul(_, _)));
            assert!(rhs.is_const_int(1));
        }
        other => panic!("expected Add, got {other:?}"),
    }
}

#[test]
fn floor_helpers_and_likely() {
    let f = Var::new("f");
    let e = Expr::from(&f).floor_div(4).lt(Expr::from(&f).floor_mod(4)).likely();
    assert!(matches!(e, Expr::Likely(_)));
}

#[test]
fn display_is_readable() {
    let i = Var::new("i");
    let e = (&i * 8).floor_mod(3);
    assert_eq!(e.to_string(), "((i*8) mod 3)");
}

#[test]
fn iter_var_identity_follows_var() {
    let v = Var::new("i");
    let a = IterVar::new(v.clone(), Some(Range::by_min_extent(0, 16)), IterKind::Serial);
    let b = IterVar::new(v, None, IterKind::Parallel);
    // Same underlying variable, so same identity even with different metadata.
    assert_eq!(a, b);
    assert_ne!(a, IterVar::with_extent("i", 16, IterKind::Serial));
}

#[test]
fn tensor_identity_not_structural() {
    let a = Tensor::new("t", [Expr::Const(8)], DType::Float32);
    let b = Tensor::new("t", [Expr::Const(8)], DType::Float32);
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
}
