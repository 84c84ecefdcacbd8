//! Concretization of partial functions
//!
//! A partial function carries the `undef` special value on the assignments
//! it leaves open. Concretization materialises a total function agreeing
//! with it everywhere it is defined:
//!
//! * **Restrict** drops a node whenever one child is wholly undefined,
//!   keeping the other child;
//! * **one-sided match** (OSM) compares the two children and collapses the
//!   node when one child can be completed into the other;
//! * **two-sided match** (TSM) collapses a node when both children can be
//!   completed into a common function, and recurses on that common
//!   completion.
//!
//! Any undefinedness remaining at the root is resolved to constant 0.

use crate::cache::{CacheValue, OpCode};
use crate::config::Encoding;
use crate::edge::{Edge, EdgeLabel};
use crate::forest::Forest;
use crate::ops::edge_key;
use crate::rules::ReductionRule;
use crate::terminal::Value;
use crate::{DdResult, Level};

/// Strategy for completing a partial function
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Concretization {
    /// Replace one-sided undefined children by the defined sibling
    Restrict,
    /// Collapse children when one can be completed into the other
    OneSidedMatch,
    /// Collapse children when both complete into a common function
    TwoSidedMatch,
}

/// Outcome of comparing two partial functions
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(i8)]
enum Cmp {
    Equal = 0,
    /// The left side's undefs can be filled so it equals the right side
    FillsLeft = 1,
    /// The right side's undefs can be filled so it equals the left side
    FillsRight = 2,
    Incomparable = 3,
}

impl Cmp {
    fn from_i8(v: i8) -> Cmp {
        match v {
            0 => Cmp::Equal,
            1 => Cmp::FillsLeft,
            2 => Cmp::FillsRight,
            _ => Cmp::Incomparable,
        }
    }

    fn flipped(self, flip: bool) -> Cmp {
        match (self, flip) {
            (Cmp::FillsLeft, true) => Cmp::FillsRight,
            (Cmp::FillsRight, true) => Cmp::FillsLeft,
            (c, _) => c,
        }
    }
}

impl Forest {
    /// Materialise a total function from a partial one.
    pub fn concretize(&mut self, e: Edge, how: Concretization) -> DdResult<Edge> {
        self.require(
            !self.is_relation() && self.config.encoding == Encoding::Terminal,
            "concretization needs a terminal-encoded set forest",
        )?;
        self.require(self.config.has_undef, "the forest range has no undef value")?;
        self.require(
            self.config.rules.has(ReductionRule::X),
            "concretization needs the X rule for undefined-subgraph detection",
        )?;
        self.maybe_gc(&[e]);
        let top = self.num_vars();
        let res = match how {
            Concretization::Restrict => self.rst_rec(top, e)?,
            Concretization::OneSidedMatch => self.osm_rec(top, e)?,
            Concretization::TwoSidedMatch => self.tsm_rec(top, e)?,
        };
        let res = if self.const_undef(res) {
            self.constant(Value::Int(0))?
        } else {
            self.normalize_edge(top, res)?
        };
        Ok(res)
    }

    /// A terminal-targeted edge with no undefinedness underneath is already
    /// total; an undef-targeted rule edge still needs expansion.
    fn settled(&self, k: Level, e: Edge) -> bool {
        k == 0
            || self.const_undef(e)
            || (e.is_terminal() && !self.terminal_denotation(e).is_undef())
    }

    fn rst_rec(&mut self, k: Level, e: Edge) -> DdResult<Edge> {
        stat!(call OpCode::Restrict);
        if self.settled(k, e) {
            return Ok(e);
        }
        stat!(cache_query OpCode::Restrict);
        if let Some(CacheValue::Edge(r)) = self.cache.lookup(OpCode::Restrict, k, &[e]) {
            stat!(cache_hit OpCode::Restrict);
            return Ok(r);
        }
        let c0 = self.cofactor(k, e, 0);
        let c1 = self.cofactor(k, e, 1);
        let res = if self.const_undef(c0) {
            let r = self.rst_rec(k - 1, c1)?;
            self.redundant_at(k, r)?
        } else if self.const_undef(c1) {
            let r = self.rst_rec(k - 1, c0)?;
            self.redundant_at(k, r)?
        } else {
            let r0 = self.rst_rec(k - 1, c0)?;
            let r1 = self.rst_rec(k - 1, c1)?;
            self.reduce_edge(k, EdgeLabel::default(), k, &[r0, r1], 0)?
        };
        self.cache.insert(OpCode::Restrict, k, &[e], CacheValue::Edge(res));
        Ok(res)
    }

    fn osm_rec(&mut self, k: Level, e: Edge) -> DdResult<Edge> {
        stat!(call OpCode::Osm);
        if self.settled(k, e) {
            return Ok(e);
        }
        stat!(cache_query OpCode::Osm);
        if let Some(CacheValue::Edge(r)) = self.cache.lookup(OpCode::Osm, k, &[e]) {
            stat!(cache_hit OpCode::Osm);
            return Ok(r);
        }
        let c0 = self.cofactor(k, e, 0);
        let c1 = self.cofactor(k, e, 1);
        let res = match self.cmp_rec(k - 1, c0, c1)? {
            Cmp::FillsLeft | Cmp::Equal => {
                let r = self.osm_rec(k - 1, c1)?;
                self.redundant_at(k, r)?
            }
            Cmp::FillsRight => {
                let r = self.osm_rec(k - 1, c0)?;
                self.redundant_at(k, r)?
            }
            Cmp::Incomparable => {
                let r0 = self.osm_rec(k - 1, c0)?;
                let r1 = self.osm_rec(k - 1, c1)?;
                self.reduce_edge(k, EdgeLabel::default(), k, &[r0, r1], 0)?
            }
        };
        self.cache.insert(OpCode::Osm, k, &[e], CacheValue::Edge(res));
        Ok(res)
    }

    fn tsm_rec(&mut self, k: Level, e: Edge) -> DdResult<Edge> {
        stat!(call OpCode::Tsm);
        if self.settled(k, e) {
            return Ok(e);
        }
        stat!(cache_query OpCode::Tsm);
        if let Some(CacheValue::Edge(r)) = self.cache.lookup(OpCode::Tsm, k, &[e]) {
            stat!(cache_hit OpCode::Tsm);
            return Ok(r);
        }
        let c0 = self.cofactor(k, e, 0);
        let c1 = self.cofactor(k, e, 1);
        let res = if self.has_common_rec(k - 1, c0, c1)? {
            let common = self.common_rec(k - 1, c0, c1)?;
            let r = self.tsm_rec(k - 1, common)?;
            self.redundant_at(k, r)?
        } else {
            let r0 = self.tsm_rec(k - 1, c0)?;
            let r1 = self.tsm_rec(k - 1, c1)?;
            self.reduce_edge(k, EdgeLabel::default(), k, &[r0, r1], 0)?
        };
        self.cache.insert(OpCode::Tsm, k, &[e], CacheValue::Edge(res));
        Ok(res)
    }

    /// Compare two partial functions viewed at level `k`.
    fn cmp_rec(&mut self, k: Level, p: Edge, q: Edge) -> DdResult<Cmp> {
        if p == q {
            return Ok(Cmp::Equal);
        }
        if self.const_undef(p) {
            return Ok(Cmp::FillsLeft);
        }
        if self.const_undef(q) {
            return Ok(Cmp::FillsRight);
        }
        if k == 0 {
            return Ok(Cmp::Incomparable);
        }
        // almost-commutative: canonicalise the order, flip on the way out
        let flip = edge_key(q) < edge_key(p);
        let (p, q) = if flip { (q, p) } else { (p, q) };
        stat!(cache_query OpCode::Compare);
        if let Some(CacheValue::Cmp(v)) = self.cache.lookup(OpCode::Compare, k, &[p, q]) {
            stat!(cache_hit OpCode::Compare);
            return Ok(Cmp::from_i8(v).flipped(flip));
        }
        let c0 = self.cmp_rec(k - 1, self.cofactor(k, p, 0), self.cofactor(k, q, 0))?;
        let res = if c0 == Cmp::Incomparable {
            Cmp::Incomparable
        } else {
            let c1 = self.cmp_rec(k - 1, self.cofactor(k, p, 1), self.cofactor(k, q, 1))?;
            if c0 == Cmp::Equal {
                c1
            } else if c1 == Cmp::Equal || c0 == c1 {
                c0
            } else {
                Cmp::Incomparable
            }
        };
        self.cache
            .insert(OpCode::Compare, k, &[p, q], CacheValue::Cmp(res as i8));
        Ok(res.flipped(flip))
    }

    /// Can both partial functions be completed into a common total one?
    fn has_common_rec(&mut self, k: Level, p: Edge, q: Edge) -> DdResult<bool> {
        if p == q || self.const_undef(p) || self.const_undef(q) {
            return Ok(true);
        }
        if k == 0 {
            return Ok(false);
        }
        let (p, q) = if edge_key(q) < edge_key(p) { (q, p) } else { (p, q) };
        stat!(cache_query OpCode::HasCommon);
        if let Some(CacheValue::Flag(v)) = self.cache.lookup(OpCode::HasCommon, k, &[p, q]) {
            stat!(cache_hit OpCode::HasCommon);
            return Ok(v);
        }
        let a0 = self.has_common_rec(k - 1, self.cofactor(k, p, 0), self.cofactor(k, q, 0))?;
        let res = a0
            && self.has_common_rec(k - 1, self.cofactor(k, p, 1), self.cofactor(k, q, 1))?;
        self.cache
            .insert(OpCode::HasCommon, k, &[p, q], CacheValue::Flag(res));
        Ok(res)
    }

    /// The least-defined common completion of two overlapping partial
    /// functions
    fn common_rec(&mut self, k: Level, p: Edge, q: Edge) -> DdResult<Edge> {
        if p == q || self.const_undef(q) {
            return Ok(p);
        }
        if self.const_undef(p) {
            return Ok(q);
        }
        debug_assert!(k > 0, "distinct defined terminals have no common completion");
        let (p, q) = if edge_key(q) < edge_key(p) { (q, p) } else { (p, q) };
        stat!(cache_query OpCode::Common);
        if let Some(CacheValue::Edge(r)) = self.cache.lookup(OpCode::Common, k, &[p, q]) {
            stat!(cache_hit OpCode::Common);
            return Ok(r);
        }
        let r0 = self.common_rec(k - 1, self.cofactor(k, p, 0), self.cofactor(k, q, 0))?;
        let r1 = self.common_rec(k - 1, self.cofactor(k, p, 1), self.cofactor(k, q, 1))?;
        let res = self.reduce_edge(k, EdgeLabel::default(), k, &[r0, r1], 0)?;
        self.cache
            .insert(OpCode::Common, k, &[p, q], CacheValue::Edge(res));
        Ok(res)
    }

    /// Wrap a level-(k−1) result as a function redundant in `x_k`
    fn redundant_at(&mut self, k: Level, r: Edge) -> DdResult<Edge> {
        self.reduce_edge(k, EdgeLabel::default(), k, &[r, r], 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForestConfig, Predef, RangeType};
    use crate::explicit::ExplicitFunc;
    use crate::terminal::Special;

    fn partial_forest() -> Forest {
        let mut cfg = ForestConfig::predef(Predef::Fbdd, 3);
        cfg.range = RangeType::Boolean;
        cfg.has_undef = true;
        Forest::new(cfg).unwrap()
    }

    #[test]
    fn concretizations_agree_on_defined_points() {
        let mut f = partial_forest();
        let mut xf = ExplicitFunc::new_set(3, Value::Special(Special::Undef));
        // 011 -> 1 and 101 -> 1 with vars listed low level first
        xf.add_row(&[Some(true), Some(true), Some(false)], Value::Int(1))
            .unwrap();
        xf.add_row(&[Some(true), Some(false), Some(true)], Value::Int(1))
            .unwrap();
        let partial = xf.build(&mut f).unwrap();
        let baseline = f.count_nodes(partial);

        for how in [
            Concretization::Restrict,
            Concretization::OneSidedMatch,
            Concretization::TwoSidedMatch,
        ] {
            let total = f.concretize(partial, how).unwrap();
            assert_eq!(
                f.evaluate(total, &[true, true, false]).unwrap(),
                Value::Int(1),
                "{how:?} keeps 011"
            );
            assert_eq!(
                f.evaluate(total, &[true, false, true]).unwrap(),
                Value::Int(1),
                "{how:?} keeps 101"
            );
            // a concretion never needs undef
            for bits in 0..8u8 {
                let vars = [bits & 1 != 0, bits & 2 != 0, bits & 4 != 0];
                assert!(!f.evaluate(total, &vars).unwrap().is_undef(), "{how:?}");
            }
            assert!(
                f.count_nodes(total) <= baseline,
                "{how:?} must not grow the diagram"
            );
        }
    }
}
