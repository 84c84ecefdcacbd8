//! Relational pre- and post-image

use rustc_hash::FxHashMap;

use crate::cache::OpCode;
use crate::edge::{Edge, EdgeLabel};
use crate::forest::Forest;
use crate::ops::nonzero;
use crate::{DdResult, Level};

pub(crate) type ImageMemo = FxHashMap<(Level, Edge, Edge), Edge>;

/// States reachable in one step: `{ t | ∃ s ∈ S: (s, t) ∈ R }`.
///
/// `sets` holds `s` (a set forest) and receives the result; `rels` holds
/// the relation `r` and is only read.
pub fn post_image(sets: &mut Forest, s: Edge, rels: &Forest, r: Edge) -> DdResult<Edge> {
    image(sets, s, rels, r, false)
}

/// States with a successor in the set: `{ s | ∃ t ∈ S: (s, t) ∈ R }`
pub fn pre_image(sets: &mut Forest, s: Edge, rels: &Forest, r: Edge) -> DdResult<Edge> {
    image(sets, s, rels, r, true)
}

fn image(sets: &mut Forest, s: Edge, rels: &Forest, r: Edge, pre: bool) -> DdResult<Edge> {
    stat!(call OpCode::Image);
    sets.require(!sets.is_relation(), "image needs a set forest as first operand")?;
    sets.require(rels.is_relation(), "image needs a relation forest as second operand")?;
    sets.require(
        sets.num_vars() == rels.num_vars(),
        "set and relation forests must share the variable count",
    )?;
    sets.maybe_gc(&[s]);
    let mut memo = ImageMemo::default();
    let top = sets.num_vars();
    let res = image_rec(sets, rels, top, s, r, pre, &mut memo)?;
    sets.normalize_edge(top, res)
}

pub(crate) fn image_rec(
    sets: &mut Forest,
    rels: &Forest,
    k: Level,
    s: Edge,
    r: Edge,
    pre: bool,
    memo: &mut ImageMemo,
) -> DdResult<Edge> {
    if k == 0 {
        let sv = nonzero(sets.terminal_denotation(s));
        let rv = nonzero(rels.terminal_denotation(r));
        return Ok(sets.bool_terminal(sv && rv));
    }
    if sets.const01(s) == Some(false) || rels.const01(r) == Some(false) {
        return Ok(sets.bool_terminal(false));
    }
    if let Some(e) = memo.get(&(k, s, r)) {
        return Ok(*e);
    }

    let s0 = sets.cofactor(k, s, 0);
    let s1 = sets.cofactor(k, s, 1);
    let mut children = [Edge::default(); 2];
    for (out_bit, slot) in children.iter_mut().enumerate() {
        // post: result bit is the `to` bit; pre: it is the `from` bit
        let (ra, rb) = if pre {
            (
                rels.cofactor_rel(k, r, out_bit << 1),
                rels.cofactor_rel(k, r, (out_bit << 1) | 1),
            )
        } else {
            (
                rels.cofactor_rel(k, r, out_bit),
                rels.cofactor_rel(k, r, 0b10 | out_bit),
            )
        };
        let p0 = image_rec(sets, rels, k - 1, s0, ra, pre, memo)?;
        let p1 = image_rec(sets, rels, k - 1, s1, rb, pre, memo)?;
        *slot = sets.apply_rec(OpCode::Union, k - 1, p0, p1)?;
    }
    let res = sets.reduce_edge(k, EdgeLabel::default(), k, &children, 0)?;
    memo.insert((k, s, r), res);
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForestConfig, Predef};
    use crate::explicit::ExplicitFunc;
    use crate::terminal::Value;

    /// Exhaustive check of post-image against enumeration for L = 2
    #[test]
    fn post_image_matches_enumeration() {
        let mut sets = Forest::new(ForestConfig::predef(Predef::Fbdd, 2)).unwrap();
        let rels = {
            let mut fr = Forest::new(ForestConfig::predef(Predef::Mxd, 2)).unwrap();
            // relation: (s, t) with t = s + 1 mod 4 over two bits
            let mut xf = ExplicitFunc::new_relation(2, Value::Int(0));
            for s in 0..4u8 {
                let t = (s + 1) % 4;
                let from = [s & 1 != 0, s & 2 != 0];
                let to = [t & 1 != 0, t & 2 != 0];
                xf.add_rel_row(
                    &[Some(from[0]), Some(from[1])],
                    &[Some(to[0]), Some(to[1])],
                    Value::Int(1),
                )
                .unwrap();
            }
            let r = xf.build(&mut fr).unwrap();
            (fr, r)
        };
        let (fr, r) = rels;

        // S = {1, 2}
        let mut xs = ExplicitFunc::new_set(2, Value::Int(0));
        xs.add_row(&[Some(true), Some(false)], Value::Int(1)).unwrap();
        xs.add_row(&[Some(false), Some(true)], Value::Int(1)).unwrap();
        let s = xs.build(&mut sets).unwrap();

        let img = post_image(&mut sets, s, &fr, r).unwrap();
        for t in 0..4u8 {
            let vars = [t & 1 != 0, t & 2 != 0];
            let expected = t == 2 || t == 3;
            assert_eq!(
                sets.evaluate(img, &vars).unwrap(),
                Value::Int(expected as i64),
                "t = {t}"
            );
        }

        let pre = pre_image(&mut sets, s, &fr, r).unwrap();
        for t in 0..4u8 {
            let vars = [t & 1 != 0, t & 2 != 0];
            let expected = t == 0 || t == 1;
            assert_eq!(
                sets.evaluate(pre, &vars).unwrap(),
                Value::Int(expected as i64),
                "pre t = {t}"
            );
        }
    }
}
