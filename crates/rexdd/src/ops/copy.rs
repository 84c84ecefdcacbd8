//! Rebuilding a function in another forest

use rustc_hash::FxHashMap;

use crate::edge::{Edge, EdgeLabel};
use crate::forest::Forest;
use crate::{DdResult, Level};

/// Rebuild `edge` from `src` inside `dst`, inserting every node through the
/// destination forest's reduction algebra. The forests may differ in
/// ruleset, flag policies and encoding; they must agree on variable count
/// and dimension.
///
/// The memo table lives for this call only: it keys on source-forest edges,
/// which the destination's persistent cache must never hold.
pub fn copy_into(dst: &mut Forest, src: &Forest, edge: Edge) -> DdResult<Edge> {
    stat!(call crate::cache::OpCode::Copy);
    dst.require(
        dst.num_vars() == src.num_vars(),
        "copy needs forests over the same variables",
    )?;
    dst.require(
        dst.is_relation() == src.is_relation(),
        "copy needs forests of the same dimension",
    )?;
    let mut memo = FxHashMap::default();
    let top = dst.num_vars();
    let r = copy_rec(dst, src, top, edge, &mut memo)?;
    dst.normalize_edge(top, r)
}

fn copy_rec(
    dst: &mut Forest,
    src: &Forest,
    k: Level,
    e: Edge,
    memo: &mut FxHashMap<(Level, Edge), Edge>,
) -> DdResult<Edge> {
    if k == 0 {
        let v = src.resolve_terminal(e);
        return dst.terminal(v);
    }
    if let Some(r) = memo.get(&(k, e)) {
        return Ok(*r);
    }
    let arity = src.arity();
    let mut children = [Edge::default(); 4];
    for (i, slot) in children[..arity].iter_mut().enumerate() {
        let c = if src.is_relation() {
            src.cofactor_rel(k, e, i)
        } else {
            src.cofactor(k, e, i)
        };
        *slot = copy_rec(dst, src, k - 1, c, memo)?;
    }
    let r = dst.reduce_edge(k, EdgeLabel::default(), k, &children[..arity], 0)?;
    memo.insert((k, e), r);
    Ok(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForestConfig, Predef};
    use crate::terminal::Value;

    #[test]
    fn copy_between_rulesets_preserves_semantics() {
        let mut a = Forest::new(ForestConfig::predef(Predef::Rexbdd, 4)).unwrap();
        let mut b = Forest::new(ForestConfig::predef(Predef::Zbdd, 4)).unwrap();
        let x = a.variable(0).unwrap();
        let y = a.variable(3).unwrap();
        let g = a.xor(x, y).unwrap();

        let h = copy_into(&mut b, &a, g).unwrap();
        for bits in 0..16u8 {
            let vars: Vec<bool> = (0..4).map(|i| bits & (1 << i) != 0).collect();
            assert_eq!(
                a.evaluate(g, &vars).unwrap(),
                b.evaluate(h, &vars).unwrap()
            );
        }
    }

    #[test]
    fn copy_is_canonical_in_the_destination() {
        let mut a = Forest::new(ForestConfig::predef(Predef::Qbdd, 3)).unwrap();
        let mut b = Forest::new(ForestConfig::predef(Predef::Fbdd, 3)).unwrap();
        let x = a.variable(1).unwrap();
        let copied = copy_into(&mut b, &a, x).unwrap();
        let native = b.variable(1).unwrap();
        assert_eq!(copied, native);
        let _ = a.constant(Value::Int(0)).unwrap();
    }
}
