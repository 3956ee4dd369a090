//! Algebraic laws of boolean functions over up to four signals.

use alubind::core::{Behavior, DataType, SignalId, SignalRegistry};
use alubind::truth::{BoolFn, LogicError};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Expr {
    Const(bool),
    Var(usize),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn build(&self, ids: &[SignalId]) -> BoolFn {
        match self {
            Expr::Const(v) => BoolFn::from_bool(*v),
            Expr::Var(i) => BoolFn::from_signal(ids[*i]),
            Expr::Not(e) => e.build(ids).not(),
            Expr::And(a, b) => a.build(ids).and(&b.build(ids)).unwrap(),
            Expr::Or(a, b) => a.build(ids).or(&b.build(ids)).unwrap(),
            Expr::Xor(a, b) => a.build(ids).xor(&b.build(ids)).unwrap(),
        }
    }

    /// Value for the assignment whose bit `i` is signal `i`.
    fn eval(&self, row: u8) -> bool {
        match self {
            Expr::Const(v) => *v,
            Expr::Var(i) => row & (1 << i) != 0,
            Expr::Not(e) => !e.eval(row),
            Expr::And(a, b) => a.eval(row) && b.eval(row),
            Expr::Or(a, b) => a.eval(row) || b.eval(row),
            Expr::Xor(a, b) => a.eval(row) ^ b.eval(row),
        }
    }
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        1 => any::<bool>().prop_map(Expr::Const),
        4 => (0usize..4).prop_map(Expr::Var),
    ];
    leaf.prop_recursive(5, 32, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| Expr::Not(Box::new(e))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::Or(Box::new(a), Box::new(b))),
            (inner.clone(), inner).prop_map(|(a, b)| Expr::Xor(Box::new(a), Box::new(b))),
        ]
    })
}

fn four_signals() -> (SignalRegistry, Vec<SignalId>) {
    let mut signals = SignalRegistry::new();
    let ids = ["a", "b", "c", "d"]
        .iter()
        .map(|name| signals.declare(name, Behavior::Wire, DataType::Bit).unwrap())
        .collect();
    (signals, ids)
}

fn evaluate_row(f: &BoolFn, ids: &[SignalId], row: u8) -> bool {
    f.evaluate(|id| {
        let i = ids.iter().position(|&s| s == id).unwrap();
        row & (1 << i) != 0
    })
}

proptest! {
    #[test]
    fn built_function_matches_expression(expr in expr_strategy()) {
        let (_, ids) = four_signals();
        let f = expr.build(&ids);
        for row in 0..16u8 {
            prop_assert_eq!(evaluate_row(&f, &ids, row), expr.eval(row), "row {}", row);
        }
    }

    #[test]
    fn complement_laws(expr in expr_strategy()) {
        let (_, ids) = four_signals();
        let f = expr.build(&ids);
        let not_f = f.not();
        prop_assert!(f.and(&not_f).unwrap().is_false());
        prop_assert!(f.or(&not_f).unwrap().is_true());
        prop_assert!(f.xor(&f).unwrap().is_false());
        prop_assert_eq!(not_f.not().table(), f.table());
    }

    #[test]
    fn merge_is_commutative_in_value(a in expr_strategy(), b in expr_strategy()) {
        let (_, ids) = four_signals();
        let (fa, fb) = (a.build(&ids), b.build(&ids));
        let pairs = [
            (fa.and(&fb).unwrap(), fb.and(&fa).unwrap()),
            (fa.or(&fb).unwrap(), fb.or(&fa).unwrap()),
            (fa.xor(&fb).unwrap(), fb.xor(&fa).unwrap()),
        ];
        for (lhs, rhs) in &pairs {
            for row in 0..16u8 {
                prop_assert_eq!(evaluate_row(lhs, &ids, row), evaluate_row(rhs, &ids, row));
            }
        }
    }

    #[test]
    fn tautology_iff_table_is_all_ones(expr in expr_strategy()) {
        let (_, ids) = four_signals();
        let f = expr.build(&ids);
        let always = (0..16u8).all(|row| expr.eval(row));
        prop_assert_eq!(f.is_true(), always);
    }

    #[test]
    fn every_trace_renders(expr in expr_strategy()) {
        let (signals, ids) = four_signals();
        let f = expr.build(&ids);
        let rendered = f.to_infix(&signals);
        prop_assert_ne!(rendered.as_str(), "UNKNOWN");
    }
}

#[test]
fn fifth_argument_is_rejected_without_side_effects() {
    let mut signals = SignalRegistry::new();
    let ids: Vec<SignalId> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|name| signals.declare(name, Behavior::Wire, DataType::Bit).unwrap())
        .collect();

    let four = ids[..4]
        .iter()
        .map(|&id| BoolFn::from_signal(id))
        .reduce(|acc, f| acc.or(&f).unwrap())
        .unwrap();
    let fifth = BoolFn::from_signal(ids[4]);
    let (before_four, before_fifth) = (four.clone(), fifth.clone());

    assert_eq!(
        four.and(&fifth),
        Err(LogicError::TooManyArguments { limit: 4 })
    );
    assert_eq!(four, before_four);
    assert_eq!(fifth, before_fifth);
}

#[test]
fn and_agrees_for_both_orders() {
    let (_, ids) = four_signals();
    let (a, b) = (BoolFn::from_signal(ids[0]), BoolFn::from_signal(ids[1]));
    let ab = a.and(&b).unwrap();
    let ba = b.and(&a).unwrap();
    for row in 0..4u8 {
        assert_eq!(evaluate_row(&ab, &ids, row), evaluate_row(&ba, &ids, row));
    }
    assert_eq!(ba.args(), &[ids[1], ids[0]]);
}
