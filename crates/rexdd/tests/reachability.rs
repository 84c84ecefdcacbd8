//! Relational image and saturation against explicit references

mod common;

use std::collections::{HashSet, VecDeque};

use common::Rng;
use rexdd::{
    post_image, pre_image, saturate_post, Edge, ExplicitFunc, Forest, ForestConfig, Predef, Value,
};

fn bits_of(n: usize, width: u16) -> Vec<bool> {
    (0..width).map(|k| n & (1 << k) != 0).collect()
}

fn some_bits(n: usize, width: u16) -> Vec<Option<bool>> {
    (0..width).map(|k| Some(n & (1 << k) != 0)).collect()
}

/// Exhaustive image check for L ≤ 3 over random relations
#[test]
fn image_matches_enumeration() {
    const L: u16 = 3;
    let mut rng = Rng::new(7201);
    for _ in 0..10 {
        let mut sets = Forest::new(ForestConfig::predef(Predef::Fbdd, L)).unwrap();
        let mut rels = Forest::new(ForestConfig::predef(Predef::Mxd, L)).unwrap();

        // random relation and random set as explicit tables
        let mut pairs = HashSet::new();
        let mut xr = ExplicitFunc::new_relation(L, Value::Int(0));
        for s in 0..1 << L {
            for t in 0..1 << L {
                if rng.next01() < 0.2 {
                    pairs.insert((s, t));
                    xr.add_rel_row(&some_bits(s, L), &some_bits(t, L), Value::Int(1))
                        .unwrap();
                }
            }
        }
        let r = xr.build(&mut rels).unwrap();

        let mut members = HashSet::new();
        let mut xs = ExplicitFunc::new_set(L, Value::Int(0));
        for s in 0..1 << L {
            if rng.next01() < 0.4 {
                members.insert(s);
                xs.add_row(&some_bits(s, L), Value::Int(1)).unwrap();
            }
        }
        let s = xs.build(&mut sets).unwrap();

        let post = post_image(&mut sets, s, &rels, r).unwrap();
        let pre = pre_image(&mut sets, s, &rels, r).unwrap();
        for t in 0..1usize << L {
            let expect_post = members.iter().any(|&m| pairs.contains(&(m, t)));
            let expect_pre = members.iter().any(|&m| pairs.contains(&(t, m)));
            assert_eq!(
                sets.evaluate(post, &bits_of(t, L)).unwrap(),
                Value::Int(expect_post as i64),
                "post at {t}"
            );
            assert_eq!(
                sets.evaluate(pre, &bits_of(t, L)).unwrap(),
                Value::Int(expect_pre as i64),
                "pre at {t}"
            );
        }
    }
}

/// Saturation equals the least fixed point computed by reference BFS
#[test]
fn saturation_is_the_least_fixed_point() {
    const L: u16 = 3;
    let mut rng = Rng::new(9302);
    for _ in 0..10 {
        let mut sets = Forest::new(ForestConfig::predef(Predef::Fbdd, L)).unwrap();
        let mut rels = Forest::new(ForestConfig::predef(Predef::Mxd, L)).unwrap();

        let mut pairs = HashSet::new();
        let mut xr = ExplicitFunc::new_relation(L, Value::Int(0));
        for s in 0..1 << L {
            for t in 0..1 << L {
                if rng.next01() < 0.15 {
                    pairs.insert((s, t));
                    xr.add_rel_row(&some_bits(s, L), &some_bits(t, L), Value::Int(1))
                        .unwrap();
                }
            }
        }
        let r = xr.build(&mut rels).unwrap();

        let start = rng.below(1 << L);
        let mut xs = ExplicitFunc::new_set(L, Value::Int(0));
        xs.add_row(&some_bits(start, L), Value::Int(1)).unwrap();
        let s0 = xs.build(&mut sets).unwrap();

        let reached = saturate_post(&mut sets, s0, &rels, &[r]).unwrap();

        // reference BFS on the explicit state graph
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(s) = queue.pop_front() {
            for t in 0..1usize << L {
                if pairs.contains(&(s, t)) && seen.insert(t) {
                    queue.push_back(t);
                }
            }
        }

        assert_eq!(sets.cardinality(reached).unwrap(), seen.len() as u64);
        for t in 0..1usize << L {
            assert_eq!(
                sets.evaluate(reached, &bits_of(t, L)).unwrap(),
                Value::Int(seen.contains(&t) as i64),
                "state {t}"
            );
        }
    }
}

/// Seed scenario 3: 2×2 sliding puzzle, 4 tiles of 2 bits each. Half of
/// the 4! configurations are reachable.
#[test]
fn sliding_puzzle_2x2() {
    const L: u16 = 8;
    let mut sets = Forest::new(ForestConfig::predef(Predef::Fbdd, L)).unwrap();
    let mut rels = Forest::new(ForestConfig::predef(Predef::Mxd, L)).unwrap();

    // cell c occupies variable indices 2c and 2c+1 (two-bit tile id)
    let encode = |state: [u8; 4]| -> usize {
        let mut bits = 0usize;
        for (c, &tile) in state.iter().enumerate() {
            bits |= (tile as usize) << (2 * c);
        }
        bits
    };
    let perms: Vec<[u8; 4]> = {
        let mut out = Vec::new();
        for a in 0..4u8 {
            for b in 0..4u8 {
                for c in 0..4u8 {
                    for d in 0..4u8 {
                        let s = [a, b, c, d];
                        let mut used = [false; 4];
                        if s.iter().all(|&t| !std::mem::replace(&mut used[t as usize], true)) {
                            out.push(s);
                        }
                    }
                }
            }
        }
        out
    };

    // board 0 1 / 2 3; one relation per grid edge, both slide directions
    let grid_edges = [(0usize, 1usize), (2, 3), (0, 2), (1, 3)];
    let mut relations = Vec::new();
    for &(a, b) in &grid_edges {
        let mut xr = ExplicitFunc::new_relation(L, Value::Int(0));
        for s in &perms {
            if s[a] == 0 || s[b] == 0 {
                let mut t = *s;
                t.swap(a, b);
                xr.add_rel_row(
                    &some_bits(encode(*s), L),
                    &some_bits(encode(t), L),
                    Value::Int(1),
                )
                .unwrap();
            }
        }
        relations.push(xr.build(&mut rels).unwrap());
    }

    let start = [0u8, 1, 2, 3];
    let mut xs = ExplicitFunc::new_set(L, Value::Int(0));
    xs.add_row(&some_bits(encode(start), L), Value::Int(1)).unwrap();
    let s0 = xs.build(&mut sets).unwrap();

    let reached = saturate_post(&mut sets, s0, &rels, &relations).unwrap();
    assert_eq!(sets.cardinality(reached).unwrap(), 12);

    // membership agrees with explicit search
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(s) = queue.pop_front() {
        for &(a, b) in &grid_edges {
            if s[a] == 0 || s[b] == 0 {
                let mut t = s;
                t.swap(a, b);
                if seen.insert(t) {
                    queue.push_back(t);
                }
            }
        }
    }
    assert_eq!(seen.len(), 12);
    for p in &perms {
        assert_eq!(
            sets.evaluate(reached, &bits_of(encode(*p), L)).unwrap(),
            Value::Int(seen.contains(p) as i64),
            "{p:?}"
        );
    }
}

/// Seed scenario 4: dining philosophers, N = 3, built symbolically with
/// identity rules on the untouched places.
#[test]
fn dining_philosophers_three() {
    const N: usize = 3;
    const L: u16 = (6 * N) as u16;
    let mut sets = Forest::new(ForestConfig::predef(Predef::Fbdd, L)).unwrap();
    let mut rels = Forest::new(ForestConfig::predef(Predef::Fimxd, L)).unwrap();

    // per philosopher i: fork, idle, waitL, hasL, waitR, hasR
    let fork = |i: usize| 6 * (i % N);
    let idle = |i: usize| 6 * i + 1;
    let wait_l = |i: usize| 6 * i + 2;
    let has_l = |i: usize| 6 * i + 3;
    let wait_r = |i: usize| 6 * i + 4;
    let has_r = |i: usize| 6 * i + 5;

    // a transition is a conjunction of from/to literals plus identity on
    // every untouched place
    fn transition(rels: &mut Forest, pre: &[(usize, bool)], post: &[(usize, bool)]) -> Edge {
        let mut touched = [false; 6 * N];
        let mut acc = rels.constant(Value::Int(1)).unwrap();
        for &(var, val) in pre {
            touched[var] = true;
            let mut lit = rels.rel_var(var, false).unwrap();
            if !val {
                lit = rels.complement(lit).unwrap();
            }
            acc = rels.intersect(acc, lit).unwrap();
        }
        for &(var, val) in post {
            touched[var] = true;
            let mut lit = rels.rel_var(var, true).unwrap();
            if !val {
                lit = rels.complement(lit).unwrap();
            }
            acc = rels.intersect(acc, lit).unwrap();
        }
        for var in 0..6 * N {
            if !touched[var] {
                let id = rels.identity_at(var).unwrap();
                acc = rels.intersect(acc, id).unwrap();
            }
        }
        acc
    }

    let mut relations = Vec::new();
    for i in 0..N {
        // release both forks
        relations.push(transition(
            &mut rels,
            &[(has_l(i), true), (has_r(i), true)],
            &[
                (fork(i), true),
                (fork(i + 1), true),
                (idle(i), true),
                (has_l(i), false),
                (has_r(i), false),
            ],
        ));
        // go eat
        relations.push(transition(
            &mut rels,
            &[(idle(i), true)],
            &[(wait_l(i), true), (wait_r(i), true), (idle(i), false)],
        ));
        // acquire the left fork
        relations.push(transition(
            &mut rels,
            &[(fork(i), true), (wait_l(i), true)],
            &[(has_l(i), true), (fork(i), false), (wait_l(i), false)],
        ));
        // acquire the right fork
        relations.push(transition(
            &mut rels,
            &[(fork(i + 1), true), (wait_r(i), true)],
            &[(has_r(i), true), (fork(i + 1), false), (wait_r(i), false)],
        ));
    }
    assert_eq!(relations.len(), 4 * N);

    // initially every fork is on the table and every philosopher idles
    let mut init = vec![Some(false); 6 * N];
    for i in 0..N {
        init[fork(i)] = Some(true);
        init[idle(i)] = Some(true);
    }
    let mut xs = ExplicitFunc::new_set(L, Value::Int(0));
    xs.add_row(&init, Value::Int(1)).unwrap();
    let s0 = xs.build(&mut sets).unwrap();

    let reached = saturate_post(&mut sets, s0, &rels, &relations).unwrap();
    // fib(10) + fib(8) reachable markings
    assert_eq!(sets.cardinality(reached).unwrap(), 76);
}
