use std::collections::HashMap;
use std::sync::Arc;

use tessel_ir::{AttrSubject, DType, Expr, ForKind, Stmt, Tensor, Var, post_order_visit};

use crate::replace::{replace_provide_tensor, replace_tensor};

fn load(t: &Tensor, idx: &Var) -> Expr {
    Expr::load(t.clone(), vec![Expr::from(idx)])
}

#[test]
fn load_rename_reaches_every_expression_position() {
    let old = Tensor::new("old", [Expr::Const(4)], DType::Float32);
    let new = Tensor::new("new", [Expr::Const(4)], DType::Float32);
    let out = Tensor::new("out", [Expr::Const(4)], DType::Float32);
    let i = Var::new("i");

    let body = Stmt::provide(out.clone(), vec![Expr::from(&i)], load(&old, &i) + Expr::Const(1));
    let body = Stmt::if_then(load(&old, &i).lt(Expr::Const(3)), body);
    let body = Stmt::attr(AttrSubject::Var(i.clone()), "note", load(&old, &i), body);
    let stmt = Stmt::loop_(i.clone(), 0, 4, ForKind::Serial, body);

    let rmap = HashMap::from([(old.clone(), new.clone())]);
    let result = replace_tensor(&stmt, &rmap);

    let mut old_loads = 0;
    let mut new_loads = 0;
    post_order_visit(&result, &mut |s| {
        let mut count = |e: &Expr| {
            if let Expr::Load { tensor, .. } = e {
                if *tensor == old {
                    old_loads += 1;
                }
                if *tensor == new {
                    new_loads += 1;
                }
            }
        };
        match s {
            // The provide's load sits under the `+ 1`, not at the root.
            Stmt::Provide { value: Expr::Add(lhs, _), .. } => count(lhs),
            Stmt::AttrScope { value, .. } => count(value),
            Stmt::IfThenElse { cond: Expr::Lt(lhs, _), .. } => count(lhs),
            _ => {}
        }
    });
    assert_eq!(old_loads, 0);
    assert_eq!(new_loads, 3);
}

#[test]
fn load_rename_without_matches_returns_the_same_tree() {
    let a = Tensor::new("a", [Expr::Const(4)], DType::Float32);
    let out = Tensor::new("out", [Expr::Const(4)], DType::Float32);
    let unrelated = Tensor::new("u", [Expr::Const(4)], DType::Float32);
    let fresh = Tensor::new("v", [Expr::Const(4)], DType::Float32);
    let i = Var::new("i");
    let stmt = Stmt::loop_(
        i.clone(),
        0,
        4,
        ForKind::Serial,
        Stmt::provide(out, vec![Expr::from(&i)], load(&a, &i)),
    );

    let rmap = HashMap::from([(unrelated, fresh)]);
    let result = replace_tensor(&stmt, &rmap);
    assert!(Arc::ptr_eq(&result, &stmt));
}

#[test]
fn provide_rename_touches_write_targets_only() {
    let old = Tensor::new("old", [Expr::Const(4)], DType::Float32);
    let new = Tensor::new("new", [Expr::Const(4)], DType::Float32);
    let i = Var::new("i");
    // The body also reads `old`; only the write target must change.
    let stmt = Stmt::loop_(
        i.clone(),
        0,
        4,
        ForKind::Serial,
        Stmt::provide(old.clone(), vec![Expr::from(&i)], load(&old, &i)),
    );

    let rmap = HashMap::from([(old.clone(), new.clone())]);
    let result = replace_provide_tensor(&stmt, &rmap);

    let Stmt::For { body, .. } = result.as_ref() else { panic!("loop must survive") };
    let Stmt::Provide { tensor, value, .. } = body.as_ref() else { panic!("provide must survive") };
    assert_eq!(*tensor, new);
    assert!(matches!(value, Expr::Load { tensor, .. } if *tensor == old));
}

#[test]
fn provide_rename_without_matches_returns_the_same_tree() {
    let a = Tensor::new("a", [Expr::Const(4)], DType::Float32);
    let unrelated = Tensor::new("u", [Expr::Const(4)], DType::Float32);
    let fresh = Tensor::new("v", [Expr::Const(4)], DType::Float32);
    let i = Var::new("i");
    let stmt = Stmt::loop_(i.clone(), 0, 4, ForKind::Serial, Stmt::provide(a, vec![Expr::from(&i)], 0));

    let result = replace_provide_tensor(&stmt, &HashMap::from([(unrelated, fresh)]));
    assert!(Arc::ptr_eq(&result, &stmt));
}

#[test]
fn provide_rename_reaches_both_arms_of_a_seq() {
    let old = Tensor::new("old", [Expr::Const(2)], DType::Float32);
    let new = Tensor::new("new", [Expr::Const(2)], DType::Float32);
    let keep = Tensor::new("keep", [Expr::Const(2)], DType::Float32);
    let stmt = Stmt::seq(vec![
        Stmt::provide(old.clone(), vec![Expr::Const(0)], 1),
        Stmt::provide(keep.clone(), vec![Expr::Const(0)], 2),
    ]);

    let result = replace_provide_tensor(&stmt, &HashMap::from([(old, new.clone())]));
    let Stmt::Seq(stmts) = result.as_ref() else { panic!("seq must survive") };
    assert!(matches!(stmts[0].as_ref(), Stmt::Provide { tensor, .. } if *tensor == new));
    assert!(matches!(stmts[1].as_ref(), Stmt::Provide { tensor, .. } if *tensor == keep));
}
