//! The forest: a closed universe of nodes over a common domain

use crate::cache::{CacheStats, OpCache};
use crate::config::{CompPolicy, Encoding, ForestConfig, RangeType, SwapPolicy};
use crate::edge::Edge;
use crate::node::PackedNode;
use crate::roots::{RootId, RootRegistry};
use crate::rules::ReductionRule;
use crate::store::LevelStore;
use crate::terminal::{Special, Value};
use crate::unique::UniqueTable;
use crate::{DdError, DdResult, Level, NodeHandle};

/// A collection of functions (or sets, or relations) represented in a
/// single decision-diagram forest over a common domain.
///
/// All operators are methods or free functions taking the forest by
/// (mutable) reference; the engine is sequential and no operation may
/// overlap another on the same forest.
pub struct Forest {
    pub(crate) config: ForestConfig,
    pub(crate) stores: Vec<LevelStore>,
    pub(crate) unique: UniqueTable,
    pub(crate) cache: OpCache,
    pub(crate) roots: RootRegistry,
    /// Live-node threshold beyond which operator entry points collect
    /// garbage first
    pub(crate) gc_threshold: Option<u64>,
}

impl Forest {
    /// Create a forest from a configuration descriptor.
    pub fn new(config: ForestConfig) -> DdResult<Forest> {
        config.validate()?;
        let levels = config.num_vars as usize;
        Ok(Forest {
            config,
            stores: (1..=levels as Level).map(LevelStore::new).collect(),
            unique: UniqueTable::new(levels),
            cache: OpCache::new(),
            roots: RootRegistry::new(),
            gc_threshold: None,
        })
    }

    /// The configuration this forest was created with
    #[inline]
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Number of variables (and levels)
    #[inline]
    pub fn num_vars(&self) -> Level {
        self.config.num_vars
    }

    #[inline]
    pub(crate) fn arity(&self) -> usize {
        self.config.arity()
    }

    /// Is this a relation forest?
    #[inline]
    pub fn is_relation(&self) -> bool {
        self.config.is_relation()
    }

    // --- Node access ---------------------------------------------------------

    #[inline]
    pub(crate) fn store(&self, level: Level) -> &LevelStore {
        &self.stores[level as usize - 1]
    }

    #[inline]
    pub(crate) fn store_mut(&mut self, level: Level) -> &mut LevelStore {
        &mut self.stores[level as usize - 1]
    }

    /// Child `i` of the node targeted by `e` (raw, without flag pushing)
    #[inline]
    pub(crate) fn raw_child(&self, e: Edge, i: usize) -> Edge {
        self.store(e.target_level()).child(e.node(), i)
    }

    /// The stored child edges of the node targeted by `e`, without flag
    /// pushing; empty for terminal targets. Intended for serialisation and
    /// visualisation.
    pub fn node_edges(&self, e: Edge) -> Vec<Edge> {
        if e.is_terminal() {
            return Vec::new();
        }
        (0..self.arity()).map(|i| self.raw_child(e, i)).collect()
    }

    /// The denoted constant of an edge targeting a terminal, folding the
    /// complement flag; for serialisation.
    pub fn terminal_value_of(&self, e: Edge) -> Option<Value> {
        if e.is_terminal() {
            Some(self.terminal_denotation(e))
        } else {
            None
        }
    }

    /// Submit a packed node to the unique table; returns the canonical
    /// handle.
    pub(crate) fn insert_node(&mut self, level: Level, children: &[Edge]) -> DdResult<NodeHandle> {
        debug_assert_eq!(children.len(), self.config.arity());
        for c in children {
            debug_assert!(
                c.target_level() < level,
                "child level must lie below the node level"
            );
        }
        let arity = self.config.arity();
        let Forest { stores, unique, .. } = self;
        let store = &mut stores[level as usize - 1];
        unique
            .level_mut(level as usize)
            .insert_or_find(store, PackedNode::new(children), arity)
    }

    // --- Terminals -----------------------------------------------------------

    /// Terminal edge for a plain Boolean constant, honouring the value type
    pub(crate) fn bool_terminal(&self, b: bool) -> Edge {
        if self.config.value_type.is_float() {
            Edge::float_terminal(b as u8 as f32)
        } else {
            Edge::int_terminal(b as i32)
        }
    }

    /// Encode `value` as a terminal edge, checking it against the range.
    pub fn terminal(&self, value: Value) -> DdResult<Edge> {
        match value {
            Value::Int(v) => {
                let ok = match self.config.range {
                    RangeType::Boolean => (0..=1).contains(&v),
                    RangeType::Finite(n) => v >= 0 && (v as u64) < n,
                    RangeType::NonNegInt => v >= 0,
                    RangeType::Int | RangeType::Real => true,
                };
                if !ok || v < i32::MIN as i64 || v > i32::MAX as i64 {
                    return Err(DdError::ValueOutOfRange);
                }
                if self.config.encoding != Encoding::Terminal {
                    // value lives on the edge, the target is Ω
                    return Ok(Edge::omega(v));
                }
                if self.config.value_type.is_float() {
                    Ok(Edge::float_terminal(v as f32))
                } else {
                    Ok(Edge::int_terminal(v as i32))
                }
            }
            Value::Float(v) => {
                if !matches!(self.config.range, RangeType::Real)
                    && !self.config.value_type.is_float()
                {
                    return Err(DdError::ValueOutOfRange);
                }
                Ok(Edge::float_terminal(v as f32))
            }
            Value::Special(s) => {
                let ok = match s {
                    Special::PosInf => self.config.has_pos_inf,
                    Special::NegInf => self.config.has_neg_inf,
                    Special::Undef => self.config.has_undef,
                    Special::Omega => self.config.encoding != Encoding::Terminal,
                };
                if ok {
                    Ok(Edge::special(s))
                } else {
                    Err(DdError::ValueOutOfRange)
                }
            }
        }
    }

    /// The constant value denoted by a terminal target under `comp`
    pub(crate) fn terminal_denotation(&self, e: Edge) -> Value {
        debug_assert!(e.is_terminal());
        let raw = e.target().terminal_value();
        if !e.complement() {
            return raw;
        }
        match raw {
            Value::Int(v) => Value::Int(self.config.max_value() - v),
            Value::Float(v) => Value::Float(self.config.max_value() as f64 - v),
            Value::Special(Special::PosInf) => Value::Special(Special::NegInf),
            Value::Special(Special::NegInf) => Value::Special(Special::PosInf),
            Value::Special(s) => Value::Special(s),
        }
    }

    /// If `e` denotes a constant Boolean function, return it.
    ///
    /// True when the target is a 0/1 terminal and the rule either has no
    /// skipping effect or its else-constant equals the target constant.
    pub(crate) fn const01(&self, e: Edge) -> Option<bool> {
        if !e.is_terminal() {
            return None;
        }
        let denoted = self.terminal_denotation(e);
        let c = if denoted.is_one() {
            true
        } else if denoted.is_zero() {
            false
        } else {
            return None;
        };
        if e.rule().is_x() || e.rule().else_one() == c {
            Some(c)
        } else {
            None
        }
    }

    /// Does `e` denote the constant-undefined function?
    pub(crate) fn const_undef(&self, e: Edge) -> bool {
        e.is_terminal()
            && self.terminal_denotation(e).is_undef()
            && e.rule().is_x()
    }

    // --- Cofactors -----------------------------------------------------------

    /// Cofactor `i` of `e` viewed at level `k` (set forests): the edge for
    /// `f|_{x_k = i}`, itself viewed at level `k-1`. Long edges follow their
    /// rule's semantics at `k`; complement and swap flags are pushed into
    /// the returned edge.
    pub fn cofactor(&self, k: Level, e: Edge, i: usize) -> Edge {
        debug_assert!(k >= 1 && e.target_level() <= k);
        debug_assert!(i < 2);
        let j = e.target_level();
        if j == k {
            let swapped = e.swap()
                && matches!(self.config.swap, SwapPolicy::One | SwapPolicy::All);
            let idx = if swapped { 1 - i } else { i };
            let mut child = self.raw_child(e, idx);
            if swapped && self.config.swap == SwapPolicy::All {
                child = child.toggle_swap();
            }
            if e.complement() {
                child = child.complemented();
            }
            if self.config.encoding != Encoding::Terminal {
                child = child.with_value(self.add_values(child.value(), e.value()));
            }
            return child;
        }
        // long edge: level k is skipped
        let continuation = if j + 1 == k { e.with_rule(ReductionRule::X) } else { e };
        match e.rule() {
            ReductionRule::X => e,
            r if r.is_el() => {
                if i == 0 {
                    continuation
                } else {
                    self.bool_terminal(r.else_one())
                }
            }
            r if r.is_eh() => {
                if i == 1 {
                    continuation
                } else {
                    self.bool_terminal(r.else_one())
                }
            }
            r if r.is_al() => {
                if i == 0 {
                    e.with_rule(ReductionRule::X)
                } else if j + 1 == k {
                    self.bool_terminal(r.else_one())
                } else {
                    e
                }
            }
            r if r.is_ah() => {
                if i == 1 {
                    e.with_rule(ReductionRule::X)
                } else if j + 1 == k {
                    self.bool_terminal(r.else_one())
                } else {
                    e
                }
            }
            _ => {
                debug_assert!(false, "identity rule in a set forest");
                e
            }
        }
    }

    /// Cofactor of a relation edge at level `k`; `i = from_bit * 2 + to_bit`.
    pub fn cofactor_rel(&self, k: Level, e: Edge, i: usize) -> Edge {
        debug_assert!(k >= 1 && e.target_level() <= k);
        debug_assert!(i < 4);
        let j = e.target_level();
        if j == k {
            let mut idx = i;
            if e.swap() && matches!(self.config.swap, SwapPolicy::From | SwapPolicy::FromTo) {
                idx ^= 0b10;
            }
            if e.swap_to() && matches!(self.config.swap, SwapPolicy::To | SwapPolicy::FromTo) {
                idx ^= 0b01;
            }
            let mut child = self.raw_child(e, idx);
            if e.complement() {
                child = child.complemented();
            }
            return child;
        }
        let continuation = if j + 1 == k { e.with_rule(ReductionRule::X) } else { e };
        match e.rule() {
            ReductionRule::X => e,
            r if r.is_identity() => {
                if i == 0b00 || i == 0b11 {
                    continuation
                } else {
                    self.bool_terminal(r.else_one())
                }
            }
            _ => {
                debug_assert!(false, "set rule skipping a relation level");
                e
            }
        }
    }

    /// Edge-value addition under the forest's encoding
    pub(crate) fn add_values(&self, a: i64, b: i64) -> i64 {
        match self.config.encoding {
            Encoding::EdgePlusMod => {
                let m = self.config.modulus().unwrap_or(0) as i64;
                if m > 0 {
                    (((a + b) % m) + m) % m
                } else {
                    a + b
                }
            }
            _ => a + b,
        }
    }

    // --- Roots and introspection --------------------------------------------

    /// Pin `edge` across garbage collection.
    pub fn register_root(&mut self, edge: Edge) -> RootId {
        self.roots.register(edge)
    }

    /// Remove a pin; returns the pinned edge if the id was live.
    pub fn deregister_root(&mut self, id: RootId) -> Option<Edge> {
        self.roots.deregister(id)
    }

    /// The edge pinned under `id`, if any
    pub fn root(&self, id: RootId) -> Option<Edge> {
        self.roots.get(id)
    }

    /// Number of registered roots
    pub fn num_roots(&self) -> usize {
        self.roots.len()
    }

    /// Current number of live nodes at `level`
    pub fn num_nodes_at(&self, level: Level) -> u64 {
        self.store(level).used() as u64
    }

    /// Current number of live nodes across all levels
    pub fn num_nodes(&self) -> u64 {
        self.stores.iter().map(|s| s.used() as u64).sum()
    }

    /// Peak number of live nodes at `level`
    pub fn peak_nodes_at(&self, level: Level) -> u64 {
        self.store(level).peak() as u64
    }

    /// Peak number of live nodes across all levels
    pub fn peak_nodes(&self) -> u64 {
        self.stores.iter().map(|s| s.peak() as u64).sum()
    }

    /// Operation cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Have operator entry points collect garbage once the live node count
    /// exceeds `threshold`; `None` disables automatic collection.
    pub fn set_gc_threshold(&mut self, threshold: Option<u64>) {
        self.gc_threshold = threshold;
    }

    /// Per-level node counts, for progress reports
    pub fn node_report(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        let mut total = 0u64;
        for k in 1..=self.num_vars() {
            let used = self.num_nodes_at(k);
            let _ = writeln!(out, "Level {k}: {used}");
            total += used;
        }
        let _ = writeln!(out, "Total nodes: {total}");
        out
    }

    // --- Edge construction ---------------------------------------------------

    /// Canonical edge for the constant function `value`.
    pub fn constant(&mut self, value: Value) -> DdResult<Edge> {
        let raw = self.terminal(value)?;
        let top = self.num_vars();
        self.normalize_edge(top, raw)
    }

    /// Canonical edge for the function of variable `index` (set forests):
    /// 0 ↦ 0, 1 ↦ 1. For edge-valued forests the function maps into {0, 1}
    /// additively.
    pub fn variable(&mut self, index: usize) -> DdResult<Edge> {
        if self.is_relation() {
            return Err(DdError::IncompatibleOperation(
                "variable edges exist in set forests only",
            ));
        }
        let level = self.config.level_of_var(index)?;
        let children = match self.config.encoding {
            Encoding::Terminal => [self.bool_terminal(false), self.bool_terminal(true)],
            _ => [Edge::omega(0), Edge::omega(1)],
        };
        let top = self.num_vars();
        self.reduce_edge(top, crate::edge::EdgeLabel::default(), level, &children, 0)
    }

    /// Relation-forest function of a single state bit: the from-bit of
    /// variable `index` when `primed` is false, the to-bit when true.
    pub fn rel_var(&mut self, index: usize, primed: bool) -> DdResult<Edge> {
        self.require(self.is_relation(), "rel_var needs a relation forest")?;
        let level = self.config.level_of_var(index)?;
        let zero = self.bool_terminal(false);
        let one = self.bool_terminal(true);
        // children indexed by (from, to) pairs 00, 01, 10, 11
        let children = if primed {
            [zero, one, zero, one]
        } else {
            [zero, zero, one, one]
        };
        let top = self.num_vars();
        self.reduce_edge(top, crate::edge::EdgeLabel::default(), level, &children, 0)
    }

    /// Relation-forest function that is 1 iff the from- and to-bits of
    /// variable `index` are equal
    pub fn identity_at(&mut self, index: usize) -> DdResult<Edge> {
        self.require(self.is_relation(), "identity_at needs a relation forest")?;
        let level = self.config.level_of_var(index)?;
        let zero = self.bool_terminal(false);
        let one = self.bool_terminal(true);
        let children = [one, zero, zero, one];
        let top = self.num_vars();
        self.reduce_edge(top, crate::edge::EdgeLabel::default(), level, &children, 0)
    }

    /// Does the complement policy allow complement bits?
    #[inline]
    pub(crate) fn comp_allowed(&self) -> bool {
        self.config.complement == CompPolicy::Allowed
    }

    /// Value-type aware terminal for a rule's else-constant
    #[inline]
    pub(crate) fn else_terminal(&self, rule: ReductionRule) -> Edge {
        self.bool_terminal(rule.else_one())
    }

    /// Operator entry points turn unmet family preconditions into typed
    /// failures through this helper.
    pub(crate) fn require(&self, cond: bool, what: &'static str) -> DdResult<()> {
        if cond {
            Ok(())
        } else {
            Err(DdError::IncompatibleOperation(what))
        }
    }

    /// Run automatic garbage collection when the threshold is exceeded,
    /// keeping `protect` alive in addition to the registered roots.
    pub(crate) fn maybe_gc(&mut self, protect: &[Edge]) {
        if let Some(t) = self.gc_threshold {
            if self.num_nodes() > t {
                self.collect_with(protect);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Predef;

    #[test]
    fn terminal_range_checks() {
        let f = Forest::new(ForestConfig::predef(Predef::Fbdd, 3)).unwrap();
        assert!(f.terminal(Value::Int(0)).is_ok());
        assert!(f.terminal(Value::Int(1)).is_ok());
        assert_eq!(f.terminal(Value::Int(2)), Err(DdError::ValueOutOfRange));
        assert_eq!(
            f.terminal(Value::Special(Special::Undef)),
            Err(DdError::ValueOutOfRange)
        );
    }

    #[test]
    fn terminal_denotation_folds_complement() {
        let mut cfg = ForestConfig::predef(Predef::Cfbdd, 3);
        cfg.name = "test".into();
        let f = Forest::new(cfg).unwrap();
        let one = Edge::int_terminal(1);
        assert_eq!(f.terminal_denotation(one), Value::Int(1));
        assert_eq!(f.terminal_denotation(one.complemented()), Value::Int(0));
    }
}
