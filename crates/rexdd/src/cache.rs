//! Operation cache (compute table)
//!
//! A direct-mapped table from (op code, level, operand edges) to a result.
//! Collisions overwrite the slot. The table follows the same prime
//! progression as the unique tables and is enlarged with rehashing when its
//! density crosses 3/4. GC invalidates entries whose key or result edges
//! target swept nodes.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::edge::Edge;
use crate::primes::PRIMES;
use crate::{Level, NodeHandle};

/// Operator identifiers for cache keys and statistics
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
#[allow(missing_docs)]
pub(crate) enum OpCode {
    Union = 0,
    Intersect = 1,
    Difference = 2,
    Xor = 3,
    Not = 4,
    Min = 5,
    Max = 6,
    Plus = 7,
    Cardinality = 8,
    NodeCount = 9,
    Restrict = 10,
    Osm = 11,
    Tsm = 12,
    Compare = 13,
    HasCommon = 14,
    Common = 15,
    Highest = 16,
    Lowest = 17,
    Copy = 18,
    Image = 19,
    Saturate = 20,
}

impl OpCode {
    pub(crate) const COUNT: usize = 21;

    pub(crate) fn name(self) -> &'static str {
        match self {
            OpCode::Union => "Union",
            OpCode::Intersect => "Intersection",
            OpCode::Difference => "Difference",
            OpCode::Xor => "Xor",
            OpCode::Not => "Complement",
            OpCode::Min => "Minimum",
            OpCode::Max => "Maximum",
            OpCode::Plus => "Plus",
            OpCode::Cardinality => "Cardinality",
            OpCode::NodeCount => "NodeCount",
            OpCode::Restrict => "Concretize_Rst",
            OpCode::Osm => "Concretize_OSM",
            OpCode::Tsm => "Concretize_TSM",
            OpCode::Compare => "Compare",
            OpCode::HasCommon => "HasCommon",
            OpCode::Common => "Common",
            OpCode::Highest => "Highest",
            OpCode::Lowest => "Lowest",
            OpCode::Copy => "Copy",
            OpCode::Image => "Image",
            OpCode::Saturate => "Saturation",
        }
    }
}

/// A cached result: an edge, a scalar count, a comparison, or a flag
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum CacheValue {
    Edge(Edge),
    Count(u64),
    Cmp(i8),
    Flag(bool),
}

#[derive(Clone, Copy)]
struct CacheEntry {
    op: OpCode,
    level: Level,
    key: [Edge; 2],
    key_len: u8,
    result: CacheValue,
    in_use: bool,
}

impl CacheEntry {
    fn empty() -> CacheEntry {
        CacheEntry {
            op: OpCode::Union,
            level: 0,
            key: [Edge::default(); 2],
            key_len: 0,
            result: CacheValue::Count(0),
            in_use: false,
        }
    }

    fn matches(&self, op: OpCode, level: Level, key: &[Edge]) -> bool {
        self.in_use
            && self.op == op
            && self.level == level
            && self.key_len as usize == key.len()
            && self.key[..key.len()] == *key
    }
}

fn key_hash(op: OpCode, level: Level, key: &[Edge]) -> u64 {
    let mut h = FxHasher::default();
    (op as u8).hash(&mut h);
    level.hash(&mut h);
    for e in key {
        e.label().bits().hash(&mut h);
        e.target().bits().hash(&mut h);
        e.value().hash(&mut h);
    }
    h.finish()
}

/// The per-forest compute table
pub(crate) struct OpCache {
    table: Vec<CacheEntry>,
    size_index: usize,
    entries: u64,
    calls: u64,
    hits: u64,
    overwrites: u64,
}

/// Hit/miss counters of the operation cache
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups
    pub calls: u64,
    /// Number of successful lookups
    pub hits: u64,
    /// Number of insertions that displaced a different key
    pub overwrites: u64,
    /// Number of live entries
    pub entries: u64,
}

impl OpCache {
    pub(crate) fn new() -> OpCache {
        OpCache {
            table: vec![CacheEntry::empty(); PRIMES[0] as usize],
            size_index: 0,
            entries: 0,
            calls: 0,
            hits: 0,
            overwrites: 0,
        }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            calls: self.calls,
            hits: self.hits,
            overwrites: self.overwrites,
            entries: self.entries,
        }
    }

    pub(crate) fn lookup(&mut self, op: OpCode, level: Level, key: &[Edge]) -> Option<CacheValue> {
        self.calls += 1;
        let idx = (key_hash(op, level, key) % self.table.len() as u64) as usize;
        let e = &self.table[idx];
        if e.matches(op, level, key) {
            self.hits += 1;
            Some(e.result)
        } else {
            None
        }
    }

    pub(crate) fn insert(&mut self, op: OpCode, level: Level, key: &[Edge], result: CacheValue) {
        debug_assert!(key.len() <= 2);
        if self.entries * 4 >= self.table.len() as u64 * 3 {
            self.enlarge();
        }
        let idx = (key_hash(op, level, key) % self.table.len() as u64) as usize;
        let slot = &mut self.table[idx];
        if slot.in_use {
            if !slot.matches(op, level, key) {
                self.overwrites += 1;
            }
        } else {
            self.entries += 1;
        }
        let mut k = [Edge::default(); 2];
        k[..key.len()].copy_from_slice(key);
        *slot = CacheEntry {
            op,
            level,
            key: k,
            key_len: key.len() as u8,
            result,
            in_use: true,
        };
    }

    fn enlarge(&mut self) {
        if self.size_index + 1 >= PRIMES.len() {
            return;
        }
        self.size_index += 1;
        let new_size = PRIMES[self.size_index] as usize;
        let old = std::mem::replace(&mut self.table, vec![CacheEntry::empty(); new_size]);
        self.entries = 0;
        for e in old {
            if e.in_use {
                let idx = (key_hash(e.op, e.level, &e.key[..e.key_len as usize])
                    % new_size as u64) as usize;
                if !self.table[idx].in_use {
                    self.entries += 1;
                } else {
                    self.overwrites += 1;
                }
                self.table[idx] = e;
            }
        }
    }

    /// Drop every entry mentioning an unmarked node. `is_marked` is queried
    /// with (level, handle) for each nonterminal target of the key and the
    /// result.
    pub(crate) fn sweep(&mut self, is_marked: impl Fn(Level, NodeHandle) -> bool) {
        let stale_edge = |e: &Edge| !e.is_terminal() && !is_marked(e.target_level(), e.node());
        for entry in &mut self.table {
            if !entry.in_use {
                continue;
            }
            let mut stale = entry.key[..entry.key_len as usize].iter().any(stale_edge);
            if let CacheValue::Edge(e) = &entry.result {
                stale |= stale_edge(e);
            }
            if stale {
                entry.in_use = false;
                self.entries -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_and_overwrite() {
        let mut c = OpCache::new();
        let a = Edge::int_terminal(1);
        let b = Edge::int_terminal(0);
        assert_eq!(c.lookup(OpCode::Union, 3, &[a, b]), None);
        c.insert(OpCode::Union, 3, &[a, b], CacheValue::Edge(a));
        assert_eq!(
            c.lookup(OpCode::Union, 3, &[a, b]),
            Some(CacheValue::Edge(a))
        );
        // a different level is a different key
        assert_eq!(c.lookup(OpCode::Union, 2, &[a, b]), None);
    }

    #[test]
    fn sweep_invalidates_stale_entries() {
        let mut c = OpCache::new();
        let t = Edge::int_terminal(1);
        let n = Edge::to_node(2, 5);
        c.insert(OpCode::Union, 2, &[t, n], CacheValue::Edge(t));
        c.insert(OpCode::Not, 1, &[t], CacheValue::Edge(t));
        c.sweep(|_, _| false);
        assert_eq!(c.lookup(OpCode::Union, 2, &[t, n]), None, "stale key dropped");
        assert!(
            c.lookup(OpCode::Not, 1, &[t]).is_some(),
            "terminal-only entry survives"
        );
    }
}
