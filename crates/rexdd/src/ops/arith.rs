//! Min / max / plus over edge-valued forests
//!
//! Edge values are pushed through the recursion: each step factors a base
//! offset out of the operands so the cache is keyed on offset-free operand
//! pairs, and re-attaches the base to the result edge.

use crate::cache::{CacheValue, OpCode};
use crate::config::Encoding;
use crate::edge::{Edge, EdgeLabel};
use crate::forest::Forest;
use crate::ops::edge_key;
use crate::terminal::{Special, Value};
use crate::{DdResult, Level};

impl Forest {
    /// Pointwise minimum of two edge-valued functions
    pub fn min_edge(&mut self, a: Edge, b: Edge) -> DdResult<Edge> {
        self.require(
            self.config.encoding == Encoding::EdgePlus,
            "minimum needs an additively edge-valued forest",
        )?;
        self.ev_apply(OpCode::Min, a, b)
    }

    /// Pointwise maximum of two edge-valued functions
    pub fn max_edge(&mut self, a: Edge, b: Edge) -> DdResult<Edge> {
        self.require(
            self.config.encoding == Encoding::EdgePlus,
            "maximum needs an additively edge-valued forest",
        )?;
        self.ev_apply(OpCode::Max, a, b)
    }

    /// Pointwise sum of two edge-valued functions
    pub fn plus(&mut self, a: Edge, b: Edge) -> DdResult<Edge> {
        self.require(
            self.config.encoding != Encoding::Terminal,
            "plus needs an edge-valued forest",
        )?;
        self.ev_apply(OpCode::Plus, a, b)
    }

    fn ev_apply(&mut self, op: OpCode, a: Edge, b: Edge) -> DdResult<Edge> {
        self.require(!self.is_relation(), "edge-valued relations are not supported")?;
        self.maybe_gc(&[a, b]);
        let top = self.num_vars();
        let r = self.ev_rec(op, top, a, b)?;
        self.normalize_edge(top, r)
    }

    fn ev_rec(&mut self, op: OpCode, k: Level, a: Edge, b: Edge) -> DdResult<Edge> {
        stat!(call op);
        // dead-branch specials decide without recursion
        if let Some(e) = self.ev_shortcut(op, a, b) {
            return Ok(e);
        }
        if k == 0 {
            return Ok(self.ev_terminal(op, a, b));
        }

        // factor the common offset out of the operands
        let (base, a, b) = match op {
            OpCode::Plus => {
                let base = self.add_values(a.value(), b.value());
                (base, a.with_value(0), b.with_value(0))
            }
            _ => {
                let base = a.value().min(b.value());
                (base, a.with_value(a.value() - base), b.with_value(b.value() - base))
            }
        };
        let (a, b) = if edge_key(b) < edge_key(a) { (b, a) } else { (a, b) };

        stat!(cache_query op);
        if let Some(CacheValue::Edge(e)) = self.cache.lookup(op, k, &[a, b]) {
            stat!(cache_hit op);
            return Ok(e.with_value(self.add_values(e.value(), base)));
        }

        let mut children = [Edge::default(); 2];
        for (i, slot) in children.iter_mut().enumerate() {
            let ca = self.cofactor(k, a, i);
            let cb = self.cofactor(k, b, i);
            *slot = self.ev_rec(op, k - 1, ca, cb)?;
        }
        let res = self.reduce_edge(k, EdgeLabel::default(), k, &children, base)?;
        let cached = res.with_value(self.sub_values(res.value(), base));
        self.cache.insert(op, k, &[a, b], CacheValue::Edge(cached));
        Ok(res)
    }

    fn sub_values(&self, a: i64, b: i64) -> i64 {
        match self.config.encoding {
            Encoding::EdgePlusMod => {
                let m = self.config.modulus().unwrap_or(0) as i64;
                if m > 0 {
                    (a - b).rem_euclid(m)
                } else {
                    a - b
                }
            }
            _ => a - b,
        }
    }

    /// Special-terminal short circuits valid at any level
    fn ev_shortcut(&self, op: OpCode, a: Edge, b: Edge) -> Option<Edge> {
        let undef = |e: Edge| e.is_special(Special::Undef);
        if undef(a) || undef(b) {
            return Some(Edge::special(Special::Undef));
        }
        let pos = |e: Edge| e.is_special(Special::PosInf);
        let neg = |e: Edge| e.is_special(Special::NegInf);
        match op {
            OpCode::Min => {
                if pos(a) || neg(b) {
                    return Some(b);
                }
                if pos(b) || neg(a) {
                    return Some(a);
                }
            }
            OpCode::Max => {
                if pos(a) || neg(b) {
                    return Some(a);
                }
                if pos(b) || neg(a) {
                    return Some(b);
                }
            }
            OpCode::Plus => {
                if (pos(a) && neg(b)) || (neg(a) && pos(b)) {
                    return Some(Edge::special(Special::Undef));
                }
                if pos(a) || neg(a) {
                    return Some(a);
                }
                if pos(b) || neg(b) {
                    return Some(b);
                }
            }
            _ => {}
        }
        None
    }

    fn ev_terminal(&self, op: OpCode, a: Edge, b: Edge) -> Edge {
        let va = match self.resolve_terminal(a) {
            Value::Int(v) => v,
            other => {
                debug_assert!(false, "unhandled terminal {other:?}");
                0
            }
        };
        let vb = match self.resolve_terminal(b) {
            Value::Int(v) => v,
            _ => 0,
        };
        let out = match op {
            OpCode::Min => va.min(vb),
            OpCode::Max => va.max(vb),
            _ => self.add_values(va, vb),
        };
        Edge::omega(out)
    }

    /// Greatest finite value the function attains, or +∞/−∞
    pub fn highest_value(&mut self, e: Edge) -> DdResult<Value> {
        self.require(
            self.config.encoding != Encoding::Terminal && !self.is_relation(),
            "extrema need an edge-valued set forest",
        )?;
        let top = self.num_vars();
        self.extreme_rec(OpCode::Highest, top, e)
    }

    /// Least finite value the function attains, or +∞/−∞
    pub fn lowest_value(&mut self, e: Edge) -> DdResult<Value> {
        self.require(
            self.config.encoding != Encoding::Terminal && !self.is_relation(),
            "extrema need an edge-valued set forest",
        )?;
        let top = self.num_vars();
        self.extreme_rec(OpCode::Lowest, top, e)
    }

    fn extreme_rec(&mut self, op: OpCode, k: Level, e: Edge) -> DdResult<Value> {
        stat!(call op);
        if e.is_terminal() {
            return Ok(self.resolve_terminal(e));
        }
        // offset-free memoisation; the edge value is re-added afterwards
        let base = e.value();
        let keyed = e.with_value(0);
        stat!(cache_query op);
        if let Some(CacheValue::Count(bits)) = self.cache.lookup(op, k, &[keyed]) {
            stat!(cache_hit op);
            return Ok(Value::Int(bits as i64 + base));
        }
        let mut best: Option<i64> = None;
        let mut special: Option<Special> = None;
        for i in 0..2 {
            let c = self.cofactor(k, keyed, i);
            match self.extreme_rec(op, k - 1, c)? {
                Value::Int(v) => {
                    best = Some(match (best, op) {
                        (None, _) => v,
                        (Some(b), OpCode::Highest) => b.max(v),
                        (Some(b), _) => b.min(v),
                    });
                }
                Value::Special(s) => special = Some(s),
                Value::Float(_) => unreachable!("edge values are integral"),
            }
        }
        match (best, special) {
            (Some(v), _) => {
                self.cache.insert(op, k, &[keyed], CacheValue::Count(v as u64));
                Ok(Value::Int(v + base))
            }
            (None, Some(s)) => Ok(Value::Special(s)),
            (None, None) => Ok(Value::Int(base)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForestConfig, Predef};

    #[test]
    fn plus_accumulates() {
        let mut f = Forest::new(ForestConfig::predef(Predef::Evpbdd, 3)).unwrap();
        let x0 = f.variable(0).unwrap();
        let x1 = f.variable(1).unwrap();
        let sum = f.plus(x0, x1).unwrap();
        for bits in 0..8u8 {
            let vars = [bits & 1 != 0, bits & 2 != 0, bits & 4 != 0];
            let expected = (vars[0] as i64) + (vars[1] as i64);
            assert_eq!(f.evaluate(sum, &vars).unwrap(), Value::Int(expected));
        }
        assert_eq!(f.highest_value(sum).unwrap(), Value::Int(2));
        assert_eq!(f.lowest_value(sum).unwrap(), Value::Int(0));
    }

    #[test]
    fn min_max_laws() {
        let mut f = Forest::new(ForestConfig::predef(Predef::Evpbdd, 3)).unwrap();
        let x0 = f.variable(0).unwrap();
        let x2 = f.variable(2).unwrap();
        let a = f.plus(x0, x2).unwrap();
        let b = f.plus(x2, x2).unwrap();
        let m1 = f.min_edge(a, b).unwrap();
        let m2 = f.min_edge(b, a).unwrap();
        assert_eq!(m1, m2, "min is commutative up to bit equality");
        for bits in 0..8u8 {
            let vars = [bits & 1 != 0, bits & 2 != 0, bits & 4 != 0];
            let va = f.evaluate(a, &vars).unwrap().as_int().unwrap();
            let vb = f.evaluate(b, &vars).unwrap().as_int().unwrap();
            assert_eq!(f.evaluate(m1, &vars).unwrap(), Value::Int(va.min(vb)));
            let mx = f.max_edge(a, b).unwrap();
            assert_eq!(f.evaluate(mx, &vars).unwrap(), Value::Int(va.max(vb)));
        }
    }

    #[test]
    fn modular_plus_wraps() {
        let mut f = Forest::new(ForestConfig::ev_mod(2, 3)).unwrap();
        let x0 = f.variable(0).unwrap();
        let two = f.constant(Value::Int(2)).unwrap();
        let s = f.plus(x0, two).unwrap();
        assert_eq!(f.evaluate(s, &[false, false]).unwrap(), Value::Int(2));
        assert_eq!(f.evaluate(s, &[true, false]).unwrap(), Value::Int(0), "wraps mod 3");
    }
}
