//! Saturation: least fixed point over a disjunctively partitioned relation
//!
//! Relations are grouped by the level they must fire at: the root edge's
//! target for identity-ruled roots (levels above are held fixed, the
//! locality the partition exploits), the top level for long `X` roots
//! (levels above admit every pair). At each level, once the children of
//! the current set are saturated, the relations grouped there are fired
//! until the set stops growing; results of every firing are saturated
//! below before being unioned in.

use rustc_hash::FxHashMap;

use crate::cache::OpCode;
use crate::edge::{Edge, EdgeLabel};
use crate::forest::Forest;
use crate::ops::nonzero;
use crate::{DdResult, Level};

/// Least fixed point of `S ↦ S ∪ POST_IMAGE(S, ∨relations)` starting from
/// `s0`
pub fn saturate_post(
    sets: &mut Forest,
    s0: Edge,
    rels: &Forest,
    relations: &[Edge],
) -> DdResult<Edge> {
    saturate(sets, s0, rels, relations, false)
}

/// Least fixed point of `S ↦ S ∪ PRE_IMAGE(S, ∨relations)` starting from
/// `s0`
pub fn saturate_pre(
    sets: &mut Forest,
    s0: Edge,
    rels: &Forest,
    relations: &[Edge],
) -> DdResult<Edge> {
    saturate(sets, s0, rels, relations, true)
}

struct Saturator<'a> {
    rels: &'a Forest,
    /// relation edges grouped by top level; index 0 holds level-1 roots
    by_top: Vec<Vec<Edge>>,
    pre: bool,
    sat_memo: FxHashMap<(Level, Edge), Edge>,
    img_memo: FxHashMap<(Level, Edge, Edge), Edge>,
}

fn saturate(
    sets: &mut Forest,
    s0: Edge,
    rels: &Forest,
    relations: &[Edge],
    pre: bool,
) -> DdResult<Edge> {
    stat!(call OpCode::Saturate);
    sets.require(!sets.is_relation(), "saturation needs a set forest")?;
    sets.require(rels.is_relation(), "saturation needs a relation forest")?;
    sets.require(
        sets.num_vars() == rels.num_vars(),
        "set and relation forests must share the variable count",
    )?;
    sets.maybe_gc(&[s0]);

    let mut by_top: Vec<Vec<Edge>> = vec![Vec::new(); sets.num_vars() as usize];
    for &r in relations {
        if rels.const01(r) == Some(false) {
            continue; // an empty relation never fires
        }
        // Identity rules above the target hold the upper variables fixed,
        // so such a relation fires locally at its target level. A long `X`
        // root allows every (from, to) pair above the target instead and
        // must fire at the top level to honour that.
        let top = if r.rule().is_x() && r.target_level() < sets.num_vars() {
            sets.num_vars()
        } else {
            r.target_level().max(1)
        };
        by_top[top as usize - 1].push(r);
    }
    let mut sat = Saturator {
        rels,
        by_top,
        pre,
        sat_memo: FxHashMap::default(),
        img_memo: FxHashMap::default(),
    };
    let top = sets.num_vars();
    let res = sat.saturate_rec(sets, top, s0)?;
    sets.normalize_edge(top, res)
}

impl Saturator<'_> {
    fn saturate_rec(&mut self, sets: &mut Forest, k: Level, s: Edge) -> DdResult<Edge> {
        if k == 0 {
            return Ok(s);
        }
        if let Some(e) = self.sat_memo.get(&(k, s)) {
            return Ok(*e);
        }
        let c0 = sets.cofactor(k, s, 0);
        let c1 = sets.cofactor(k, s, 1);
        let r0 = self.saturate_rec(sets, k - 1, c0)?;
        let r1 = self.saturate_rec(sets, k - 1, c1)?;
        let mut t = sets.reduce_edge(k, EdgeLabel::default(), k, &[r0, r1], 0)?;

        // fire the relations rooted here until nothing grows
        loop {
            let mut changed = false;
            let rels_here = self.by_top[k as usize - 1].clone();
            for r in rels_here {
                let img = self.sat_image(sets, k, t, r)?;
                let u = sets.apply_rec(OpCode::Union, k, t, img)?;
                if u != t {
                    t = u;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        self.sat_memo.insert((k, s), t);
        Ok(t)
    }

    /// One-step image whose sub-results are saturated before the node is
    /// rebuilt
    fn sat_image(&mut self, sets: &mut Forest, k: Level, s: Edge, r: Edge) -> DdResult<Edge> {
        if k == 0 {
            let sv = nonzero(sets.terminal_denotation(s));
            let rv = nonzero(self.rels.terminal_denotation(r));
            return Ok(sets.bool_terminal(sv && rv));
        }
        if sets.const01(s) == Some(false) || self.rels.const01(r) == Some(false) {
            return Ok(sets.bool_terminal(false));
        }
        if let Some(e) = self.img_memo.get(&(k, s, r)) {
            return Ok(*e);
        }
        let s0 = sets.cofactor(k, s, 0);
        let s1 = sets.cofactor(k, s, 1);
        let mut children = [Edge::default(); 2];
        for (out_bit, slot) in children.iter_mut().enumerate() {
            let (ra, rb) = if self.pre {
                (
                    self.rels.cofactor_rel(k, r, out_bit << 1),
                    self.rels.cofactor_rel(k, r, (out_bit << 1) | 1),
                )
            } else {
                (
                    self.rels.cofactor_rel(k, r, out_bit),
                    self.rels.cofactor_rel(k, r, 0b10 | out_bit),
                )
            };
            let p0 = self.sat_image(sets, k - 1, s0, ra)?;
            let p1 = self.sat_image(sets, k - 1, s1, rb)?;
            let joined = sets.apply_rec(OpCode::Union, k - 1, p0, p1)?;
            *slot = self.saturate_rec(sets, k - 1, joined)?;
        }
        let res = sets.reduce_edge(k, EdgeLabel::default(), k, &children, 0)?;
        self.img_memo.insert((k, s, r), res);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForestConfig, Predef};
    use crate::explicit::ExplicitFunc;
    use crate::terminal::Value;

    /// Modulo-4 counter: saturation from {0} reaches everything
    #[test]
    fn counter_reaches_all_states() {
        let mut sets = Forest::new(ForestConfig::predef(Predef::Fbdd, 2)).unwrap();
        let mut fr = Forest::new(ForestConfig::predef(Predef::Mxd, 2)).unwrap();
        let mut xf = ExplicitFunc::new_relation(2, Value::Int(0));
        for s in 0..4u8 {
            let t = (s + 1) % 4;
            xf.add_rel_row(
                &[Some(s & 1 != 0), Some(s & 2 != 0)],
                &[Some(t & 1 != 0), Some(t & 2 != 0)],
                Value::Int(1),
            )
            .unwrap();
        }
        let r = xf.build(&mut fr).unwrap();

        let mut xs = ExplicitFunc::new_set(2, Value::Int(0));
        xs.add_row(&[Some(false), Some(false)], Value::Int(1)).unwrap();
        let s0 = xs.build(&mut sets).unwrap();

        let reached = saturate_post(&mut sets, s0, &fr, &[r]).unwrap();
        assert_eq!(sets.cardinality(reached).unwrap(), 4);
    }
}
