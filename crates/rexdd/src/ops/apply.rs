//! Boolean apply and complement

use crate::cache::{CacheValue, OpCode};
use crate::config::Encoding;
use crate::edge::{Edge, EdgeLabel};
use crate::forest::Forest;
use crate::ops::{edge_key, nonzero};
use crate::terminal::Special;
use crate::{DdResult, Level};

impl Forest {
    /// Union (disjunction) of two edges
    pub fn union(&mut self, a: Edge, b: Edge) -> DdResult<Edge> {
        self.boolean_apply(OpCode::Union, a, b)
    }

    /// Intersection (conjunction) of two edges
    pub fn intersect(&mut self, a: Edge, b: Edge) -> DdResult<Edge> {
        self.boolean_apply(OpCode::Intersect, a, b)
    }

    /// Set difference `a ∧ ¬b`
    pub fn difference(&mut self, a: Edge, b: Edge) -> DdResult<Edge> {
        self.boolean_apply(OpCode::Difference, a, b)
    }

    /// Symmetric difference `a ⊕ b`
    pub fn xor(&mut self, a: Edge, b: Edge) -> DdResult<Edge> {
        self.boolean_apply(OpCode::Xor, a, b)
    }

    /// Complement `¬a`
    pub fn complement(&mut self, a: Edge) -> DdResult<Edge> {
        self.require(
            self.config.encoding == Encoding::Terminal,
            "complement needs terminal encoding",
        )?;
        self.maybe_gc(&[a]);
        let top = self.num_vars();
        let r = self.not_rec(top, a)?;
        self.normalize_edge(top, r)
    }

    fn boolean_apply(&mut self, op: OpCode, a: Edge, b: Edge) -> DdResult<Edge> {
        self.require(
            self.config.encoding == Encoding::Terminal,
            "boolean apply needs terminal encoding",
        )?;
        self.maybe_gc(&[a, b]);
        let top = self.num_vars();
        let r = self.apply_rec(op, top, a, b)?;
        self.normalize_edge(top, r)
    }

    /// One recursion level of a binary Boolean operator. `a` and `b` are
    /// viewed at level `k`; the result is too.
    pub(crate) fn apply_rec(&mut self, op: OpCode, k: Level, a: Edge, b: Edge) -> DdResult<Edge> {
        stat!(call op);
        if let Some(e) = self.apply_shortcut(op, k, a, b)? {
            return Ok(e);
        }
        // canonical operand order for the commutative operators
        let (a, b) = match op {
            OpCode::Union | OpCode::Intersect | OpCode::Xor if edge_key(b) < edge_key(a) => (b, a),
            _ => (a, b),
        };
        stat!(cache_query op);
        if let Some(CacheValue::Edge(e)) = self.cache.lookup(op, k, &[a, b]) {
            stat!(cache_hit op);
            return Ok(e);
        }

        let arity = self.arity();
        let mut children = [Edge::default(); 4];
        for (i, slot) in children[..arity].iter_mut().enumerate() {
            let (ca, cb) = if self.is_relation() {
                (self.cofactor_rel(k, a, i), self.cofactor_rel(k, b, i))
            } else {
                (self.cofactor(k, a, i), self.cofactor(k, b, i))
            };
            *slot = self.apply_rec(op, k - 1, ca, cb)?;
        }
        let res = self.reduce_edge(k, EdgeLabel::default(), k, &children[..arity], 0)?;
        self.cache.insert(op, k, &[a, b], CacheValue::Edge(res));
        Ok(res)
    }

    /// Terminal cases and trivial short-circuits; `None` means recursion is
    /// required.
    fn apply_shortcut(&mut self, op: OpCode, k: Level, a: Edge, b: Edge) -> DdResult<Option<Edge>> {
        let zero = self.bool_terminal(false);
        let one = self.bool_terminal(true);
        // undefined operands poison the result
        if self.config.has_undef
            && (self.const_undef(a) || self.const_undef(b))
        {
            return Ok(Some(Edge::special(Special::Undef)));
        }
        if a == b {
            return Ok(Some(match op {
                OpCode::Union | OpCode::Intersect => a,
                _ => zero,
            }));
        }
        let ka = self.const01(a);
        let kb = self.const01(b);
        let r = match op {
            OpCode::Union => match (ka, kb) {
                (Some(true), _) | (_, Some(true)) => Some(one),
                (Some(false), _) => Some(b),
                (_, Some(false)) => Some(a),
                _ => None,
            },
            OpCode::Intersect => match (ka, kb) {
                (Some(false), _) | (_, Some(false)) => Some(zero),
                (Some(true), _) => Some(b),
                (_, Some(true)) => Some(a),
                _ => None,
            },
            OpCode::Difference => match (ka, kb) {
                (Some(false), _) | (_, Some(true)) => Some(zero),
                (_, Some(false)) => Some(a),
                (Some(true), _) => Some(self.not_rec(k, b)?),
                _ => None,
            },
            OpCode::Xor => match (ka, kb) {
                (Some(false), _) => Some(b),
                (_, Some(false)) => Some(a),
                (Some(true), _) => Some(self.not_rec(k, b)?),
                (_, Some(true)) => Some(self.not_rec(k, a)?),
                _ => None,
            },
            _ => None,
        };
        if k == 0 && r.is_none() {
            // distinct non-constant terminals (e.g. multi-valued); treat
            // nonzero as membership
            let va = nonzero(self.terminal_denotation(a));
            let vb = nonzero(self.terminal_denotation(b));
            let out = match op {
                OpCode::Union => va || vb,
                OpCode::Intersect => va && vb,
                OpCode::Difference => va && !vb,
                _ => va != vb,
            };
            return Ok(Some(self.bool_terminal(out)));
        }
        Ok(r)
    }

    /// Recursive complement; an O(1) flag flip in complement-allowed
    /// forests.
    pub(crate) fn not_rec(&mut self, k: Level, e: Edge) -> DdResult<Edge> {
        stat!(call OpCode::Not);
        if self.comp_allowed() {
            return self.normalize_edge(k, e.complemented());
        }
        if self.const_undef(e) {
            return Ok(e);
        }
        if let Some(c) = self.const01(e) {
            return Ok(self.bool_terminal(!c));
        }
        if k == 0 {
            let d = self.terminal_denotation(e);
            return Ok(self.bool_terminal(!nonzero(d)));
        }
        stat!(cache_query OpCode::Not);
        if let Some(CacheValue::Edge(r)) = self.cache.lookup(OpCode::Not, k, &[e]) {
            stat!(cache_hit OpCode::Not);
            return Ok(r);
        }
        let arity = self.arity();
        let mut children = [Edge::default(); 4];
        for (i, slot) in children[..arity].iter_mut().enumerate() {
            let c = if self.is_relation() {
                self.cofactor_rel(k, e, i)
            } else {
                self.cofactor(k, e, i)
            };
            *slot = self.not_rec(k - 1, c)?;
        }
        let res = self.reduce_edge(k, EdgeLabel::default(), k, &children[..arity], 0)?;
        self.cache.insert(OpCode::Not, k, &[e], CacheValue::Edge(res));
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForestConfig, Predef};
    use crate::terminal::Value;

    fn eval_bool(f: &Forest, e: Edge, bits: u8, n: u8) -> bool {
        let vars: Vec<bool> = (0..n).map(|i| bits & (1 << i) != 0).collect();
        f.evaluate(e, &vars).unwrap() == Value::Int(1)
    }

    #[test]
    fn two_variable_and() {
        let mut f = Forest::new(ForestConfig::predef(Predef::Fbdd, 2)).unwrap();
        let x1 = f.variable(0).unwrap();
        let x2 = f.variable(1).unwrap();
        let and = f.intersect(x1, x2).unwrap();
        for bits in 0..4u8 {
            assert_eq!(eval_bool(&f, and, bits, 2), bits == 0b11);
        }
        assert_eq!(f.cardinality(and).unwrap(), 1);
    }

    #[test]
    fn demorgan() {
        for kind in [Predef::Fbdd, Predef::Cfbdd, Predef::Rexbdd, Predef::Zbdd] {
            let mut f = Forest::new(ForestConfig::predef(kind, 3)).unwrap();
            let x = f.variable(0).unwrap();
            let y = f.variable(2).unwrap();
            let lhs = {
                let u = f.union(x, y).unwrap();
                f.complement(u).unwrap()
            };
            let rhs = {
                let nx = f.complement(x).unwrap();
                let ny = f.complement(y).unwrap();
                f.intersect(nx, ny).unwrap()
            };
            assert_eq!(lhs, rhs, "De Morgan as bit equality in {kind:?}");
        }
    }

    #[test]
    fn involution() {
        let mut f = Forest::new(ForestConfig::predef(Predef::Cfbdd, 3)).unwrap();
        let x = f.variable(1).unwrap();
        let y = f.variable(2).unwrap();
        let g = f.xor(x, y).unwrap();
        let ng = f.complement(g).unwrap();
        let nng = f.complement(ng).unwrap();
        assert_eq!(g, nng);
    }
}
