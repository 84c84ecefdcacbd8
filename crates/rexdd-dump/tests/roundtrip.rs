//! Exchange-format round trips and DOT output

use rexdd::{Edge, ExplicitFunc, Forest, ForestConfig, Predef, RangeType, Value};
use rexdd_dump::exchange::{export, import};

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

fn round_trip(forest: &mut Forest, roots: &[Edge]) -> Vec<Edge> {
    let mut buf = Vec::new();
    export(&mut buf, forest, roots).expect("export");
    import(buf.as_slice(), forest).expect("import")
}

/// Seed scenario 5: sixteen random minterms with outcomes in {0, 1, 2}
/// over four variables.
#[test]
fn multi_terminal_round_trip() {
    let mut cfg = ForestConfig::predef(Predef::Fbdd, 4);
    cfg.range = RangeType::Finite(3);
    let mut f = Forest::new(cfg).unwrap();

    let mut rng = Lcg(0xfeed);
    let mut rows = ExplicitFunc::new_set(4, Value::Int(0));
    let mut expected = Vec::new();
    for bits in 0..16usize {
        let outcome = (rng.next() % 3) as i64;
        let assignment: Vec<Option<bool>> =
            (0..4).map(|k| Some(bits & (1 << k) != 0)).collect();
        rows.add_row(&assignment, Value::Int(outcome)).unwrap();
        expected.push(outcome);
    }
    let e = rows.build(&mut f).unwrap();

    let back = round_trip(&mut f, &[e]);
    assert_eq!(back.len(), 1);
    assert_eq!(back[0], e, "round trip is the identity on edges");
    for bits in 0..16usize {
        let vars: Vec<bool> = (0..4).map(|k| bits & (1 << k) != 0).collect();
        assert_eq!(
            f.evaluate(back[0], &vars).unwrap(),
            Value::Int(expected[bits]),
            "assignment {bits:04b}"
        );
    }
}

#[test]
fn boolean_families_round_trip() {
    for kind in [Predef::Fbdd, Predef::Cfbdd, Predef::Zbdd, Predef::Rexbdd, Predef::Qbdd] {
        let mut f = Forest::new(ForestConfig::predef(kind, 5)).unwrap();
        let x = f.variable(0).unwrap();
        let y = f.variable(2).unwrap();
        let z = f.variable(4).unwrap();
        let g = {
            let xy = f.intersect(x, y).unwrap();
            f.union(xy, z).unwrap()
        };
        let nz = f.complement(z).unwrap();
        let h = f.xor(g, nz).unwrap();

        let back = round_trip(&mut f, &[g, h]);
        assert_eq!(back, vec![g, h], "{kind:?}");
    }
}

#[test]
fn relation_round_trip() {
    for kind in [Predef::Mxd, Predef::Fimxd] {
        let mut f = Forest::new(ForestConfig::predef(kind, 3)).unwrap();
        let a = f.rel_var(0, false).unwrap();
        let b = f.rel_var(2, true).unwrap();
        let id = f.identity_at(1).unwrap();
        let r = {
            let ab = f.intersect(a, b).unwrap();
            f.intersect(ab, id).unwrap()
        };
        let back = round_trip(&mut f, &[r]);
        assert_eq!(back, vec![r], "{kind:?}");
    }
}

#[test]
fn edge_valued_round_trip() {
    let mut f = Forest::new(ForestConfig::predef(Predef::Evpbdd, 4)).unwrap();
    let mut acc = f.constant(Value::Int(3)).unwrap();
    for i in 0..4 {
        let x = f.variable(i).unwrap();
        acc = f.plus(acc, x).unwrap();
    }
    let back = round_trip(&mut f, &[acc]);
    assert_eq!(back, vec![acc]);
    assert_eq!(f.evaluate(back[0], &[true; 4]).unwrap(), Value::Int(7));
}

#[test]
fn shift_flag_must_be_zero() {
    let mut f = Forest::new(ForestConfig::predef(Predef::Fbdd, 2)).unwrap();
    let x = f.variable(0).unwrap();
    let mut buf = Vec::new();
    export(&mut buf, &f, &[x]).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("V 0"));
    let shifted = text.replace("V 0", "V 1");
    assert!(import(shifted.as_bytes(), &mut f).is_err());
}

#[cfg(feature = "dot")]
#[test]
fn dot_output_mentions_every_level() {
    use rexdd_dump::dot::dump_dot;
    let mut f = Forest::new(ForestConfig::predef(Predef::Rexbdd, 3)).unwrap();
    let x = f.variable(0).unwrap();
    let y = f.variable(1).unwrap();
    let z = f.variable(2).unwrap();
    let g = {
        let xy = f.xor(x, y).unwrap();
        f.intersect(xy, z).unwrap()
    };
    let mut buf = Vec::new();
    dump_dot(&mut buf, &f, &[g], &["g"]).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("digraph"));
    assert!(text.contains("shape=rectangle"), "terminals are rectangles");
    assert!(text.contains("-> "));
    assert!(text.contains("root_0"));
}
