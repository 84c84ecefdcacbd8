//! Operator laws, checked as bitwise edge equality

mod common;

use common::{build_from_table, forest, random_table, set_families, Rng};
use rexdd::{Predef, Value};

const VARS: u16 = 5;

#[test]
fn commutativity() {
    for kind in set_families() {
        let mut f = forest(kind, VARS);
        let mut rng = Rng::new(1001);
        for _ in 0..15 {
            let a = build_from_table(&mut f, &random_table(&mut rng, VARS)).unwrap();
            let b = build_from_table(&mut f, &random_table(&mut rng, VARS)).unwrap();
            let ab = f.intersect(a, b).unwrap();
            let ba = f.intersect(b, a).unwrap();
            assert_eq!(ab, ba, "{kind:?}: ∧ commutes");
            let ab = f.union(a, b).unwrap();
            let ba = f.union(b, a).unwrap();
            assert_eq!(ab, ba, "{kind:?}: ∨ commutes");
            let ab = f.xor(a, b).unwrap();
            let ba = f.xor(b, a).unwrap();
            assert_eq!(ab, ba, "{kind:?}: ⊕ commutes");
        }
    }
}

#[test]
fn associativity_and_distributivity() {
    for kind in set_families() {
        let mut f = forest(kind, VARS);
        let mut rng = Rng::new(2002);
        for _ in 0..10 {
            let a = build_from_table(&mut f, &random_table(&mut rng, VARS)).unwrap();
            let b = build_from_table(&mut f, &random_table(&mut rng, VARS)).unwrap();
            let c = build_from_table(&mut f, &random_table(&mut rng, VARS)).unwrap();

            let ab = f.intersect(a, b).unwrap();
            let lhs = f.intersect(ab, c).unwrap();
            let bc = f.intersect(b, c).unwrap();
            let rhs = f.intersect(a, bc).unwrap();
            assert_eq!(lhs, rhs, "{kind:?}: ∧ associates");

            let b_or_c = f.union(b, c).unwrap();
            let lhs = f.intersect(a, b_or_c).unwrap();
            let ab = f.intersect(a, b).unwrap();
            let ac = f.intersect(a, c).unwrap();
            let rhs = f.union(ab, ac).unwrap();
            assert_eq!(lhs, rhs, "{kind:?}: ∧ distributes over ∨");
        }
    }
}

#[test]
fn identities_and_involution() {
    for kind in set_families() {
        let mut f = forest(kind, VARS);
        let mut rng = Rng::new(3003);
        let top = f.constant(Value::Int(1)).unwrap();
        let bot = f.constant(Value::Int(0)).unwrap();
        for _ in 0..10 {
            let a = build_from_table(&mut f, &random_table(&mut rng, VARS)).unwrap();
            assert_eq!(f.intersect(a, top).unwrap(), a, "{kind:?}: A ∧ ⊤ = A");
            assert_eq!(f.union(a, bot).unwrap(), a, "{kind:?}: A ∨ ⊥ = A");
            let na = f.complement(a).unwrap();
            let nna = f.complement(na).unwrap();
            assert_eq!(nna, a, "{kind:?}: ¬¬A = A");
            let a_and_na = f.intersect(a, na).unwrap();
            assert_eq!(a_and_na, bot, "{kind:?}: A ∧ ¬A = ⊥");
        }
    }
}

#[test]
fn difference_and_xor_against_tables() {
    for kind in set_families() {
        let mut f = forest(kind, VARS);
        let mut rng = Rng::new(4004);
        for _ in 0..10 {
            let ta = random_table(&mut rng, VARS);
            let tb = random_table(&mut rng, VARS);
            let a = build_from_table(&mut f, &ta).unwrap();
            let b = build_from_table(&mut f, &tb).unwrap();

            let diff = f.difference(a, b).unwrap();
            let td: Vec<bool> = ta.iter().zip(&tb).map(|(x, y)| *x && !*y).collect();
            assert_eq!(diff, build_from_table(&mut f, &td).unwrap(), "{kind:?}: difference");

            let x = f.xor(a, b).unwrap();
            let tx: Vec<bool> = ta.iter().zip(&tb).map(|(x, y)| *x != *y).collect();
            assert_eq!(x, build_from_table(&mut f, &tx).unwrap(), "{kind:?}: xor");
        }
    }
}

#[test]
fn cardinality_matches_popcount() {
    for kind in set_families() {
        let mut f = forest(kind, VARS);
        let mut rng = Rng::new(5005);
        for _ in 0..10 {
            let t = random_table(&mut rng, VARS);
            let e = build_from_table(&mut f, &t).unwrap();
            let expected = t.iter().filter(|b| **b).count() as u64;
            assert_eq!(f.cardinality(e).unwrap(), expected, "{kind:?}");
        }
    }
}

#[test]
fn min_is_commutative_and_plus_associates() {
    let mut f = forest(Predef::Evpbdd, 4);
    let mut rng = Rng::new(6006);
    // random small edge-valued functions built from sums of variables
    let build = |f: &mut rexdd::Forest, rng: &mut Rng| {
        let mut acc = f.constant(Value::Int(rng.below(5) as i64)).unwrap();
        for i in 0..4 {
            if rng.bool() {
                let x = f.variable(i).unwrap();
                acc = f.plus(acc, x).unwrap();
            }
        }
        acc
    };
    for _ in 0..10 {
        let a = build(&mut f, &mut rng);
        let b = build(&mut f, &mut rng);
        let c = build(&mut f, &mut rng);
        assert_eq!(f.min_edge(a, b).unwrap(), f.min_edge(b, a).unwrap());
        let ab = f.plus(a, b).unwrap();
        let lhs = f.plus(ab, c).unwrap();
        let bc = f.plus(b, c).unwrap();
        let rhs = f.plus(a, bc).unwrap();
        assert_eq!(lhs, rhs, "plus associates");
    }
}
