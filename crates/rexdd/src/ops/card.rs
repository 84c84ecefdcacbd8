//! Cardinality and node counting

use rustc_hash::FxHashSet;

use crate::cache::{CacheValue, OpCode};
use crate::edge::Edge;
use crate::forest::Forest;
use crate::ops::nonzero;
use crate::rules::ReductionRule;
use crate::{DdError, DdResult, Level, NodeHandle};

impl Forest {
    /// Number of assignments on which the function is nonzero. For relation
    /// forests this counts (from, to) pairs.
    ///
    /// Memoised per (level, edge). Skipped levels contribute in closed form
    /// derived from the rule semantics instead of being expanded.
    pub fn cardinality(&mut self, e: Edge) -> DdResult<u64> {
        self.require(
            self.config.encoding == crate::config::Encoding::Terminal,
            "cardinality counts terminal-encoded functions",
        )?;
        let bits_per_level = self.config.dimension as u32;
        if u64::from(self.num_vars()) * u64::from(bits_per_level) > 62 {
            return Err(DdError::IncompatibleOperation(
                "domain too large for a 64-bit count",
            ));
        }
        let top = self.num_vars();
        self.card_rec(top, e)
    }

    fn card_rec(&mut self, k: Level, e: Edge) -> DdResult<u64> {
        stat!(call OpCode::Cardinality);
        if k == 0 {
            return Ok(nonzero(self.terminal_denotation(e)) as u64);
        }
        let j = e.target_level();
        let skip = (k - j) as u32;
        // one minterm per skipped level for sets, one per pair for relations
        let d = self.config.dimension as u32;
        if skip == 0 {
            stat!(cache_query OpCode::Cardinality);
            if let Some(CacheValue::Count(n)) = self.cache.lookup(OpCode::Cardinality, k, &[e]) {
                stat!(cache_hit OpCode::Cardinality);
                return Ok(n);
            }
            let arity = self.arity();
            let mut n: u64 = 0;
            for i in 0..arity {
                let c = if self.is_relation() {
                    self.cofactor_rel(k, e, i)
                } else {
                    self.cofactor(k, e, i)
                };
                n += self.card_rec(k - 1, c)?;
            }
            self.cache.insert(OpCode::Cardinality, k, &[e], CacheValue::Count(n));
            return Ok(n);
        }

        // closed-form contribution of the skipped range
        let g = self.card_rec(j, e.with_rule(ReductionRule::X))?;
        let below = 1u64 << (d * j as u32);
        let rule = e.rule();
        let count = match rule {
            ReductionRule::X => (1u64 << (d * skip)) * g,
            r if r.is_el() || r.is_eh() => {
                g + (r.else_one() as u64) * ((1u64 << skip) - 1) * below
            }
            r if r.is_al() || r.is_ah() => {
                ((1u64 << skip) - 1) * g + (r.else_one() as u64) * below
            }
            r => {
                // identity rules: 2^skip diagonal pair patterns reach the
                // target, the remaining 4^skip − 2^skip get the constant
                debug_assert!(r.is_identity());
                (1u64 << skip) * g
                    + (r.else_one() as u64) * ((1u64 << (2 * skip)) - (1u64 << skip)) * below
            }
        };
        Ok(count)
    }

    /// Number of distinct nonterminal nodes reachable from `e` (not to be
    /// confused with cardinality)
    pub fn count_nodes(&self, e: Edge) -> u64 {
        fn walk(
            f: &Forest,
            e: Edge,
            seen: &mut FxHashSet<(Level, NodeHandle)>,
        ) {
            if e.is_terminal() {
                return;
            }
            let key = (e.target_level(), e.node());
            if !seen.insert(key) {
                return;
            }
            for i in 0..f.arity() {
                walk(f, f.raw_child(e, i), seen);
            }
        }
        let mut seen = FxHashSet::default();
        walk(self, e, &mut seen);
        seen.len() as u64
    }
}
