//! Explicit-function bridge
//!
//! An [`ExplicitFunc`] holds (assignment, value) rows, where assignments
//! may contain don't-cares, and materialises a DD root by a top-down radix
//! scan: at each level the current row set is partitioned by the bit(s)
//! tested there, the branches are built recursively, and the node is
//! combined through the reduction algebra. Building N rows over L
//! variables costs O(N·L) partition work.

use bitvec::vec::BitVec;

use crate::edge::{Edge, EdgeLabel};
use crate::forest::Forest;
use crate::terminal::Value;
use crate::{DdError, DdResult, Level};

#[derive(Debug)]
struct Row {
    /// bit values; positions without care are 0 and ignored
    bits: BitVec,
    /// which positions are specified
    care: BitVec,
    value: Value,
}

/// A list of (assignment, value) rows over a fixed variable count
#[derive(Debug)]
pub struct ExplicitFunc {
    num_vars: Level,
    relation: bool,
    default: Value,
    rows: Vec<Row>,
}

impl ExplicitFunc {
    /// Empty set-function container; unspecified assignments map to
    /// `default`.
    pub fn new_set(num_vars: Level, default: Value) -> ExplicitFunc {
        ExplicitFunc {
            num_vars,
            relation: false,
            default,
            rows: Vec::new(),
        }
    }

    /// Empty relation container over (from, to) assignment pairs
    pub fn new_relation(num_vars: Level, default: Value) -> ExplicitFunc {
        ExplicitFunc {
            num_vars,
            relation: true,
            default,
            rows: Vec::new(),
        }
    }

    /// Number of rows added so far
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of variables
    pub fn num_vars(&self) -> Level {
        self.num_vars
    }

    /// Add a set row. `assignment[k-1]` is the bit at level `k`; `None`
    /// means don't-care. On overlapping assignments, later rows win.
    pub fn add_row(&mut self, assignment: &[Option<bool>], value: Value) -> DdResult<()> {
        if self.relation || assignment.len() != self.num_vars as usize {
            return Err(DdError::AssignmentLength {
                expected: self.num_vars as usize,
                got: assignment.len(),
            });
        }
        self.rows.push(Self::pack(assignment, value));
        Ok(())
    }

    /// Add a set row from a minterm pattern of `0`, `1` and `-` characters,
    /// leftmost character at level 1.
    pub fn add_minterm(&mut self, pattern: &str, value: Value) -> DdResult<()> {
        let assignment: Vec<Option<bool>> = pattern
            .chars()
            .map(|c| match c {
                '0' => Ok(Some(false)),
                '1' => Ok(Some(true)),
                '-' => Ok(None),
                _ => Err(DdError::ValueOutOfRange),
            })
            .collect::<DdResult<_>>()?;
        self.add_row(&assignment, value)
    }

    /// Add a relation row over a (from, to) pair of assignments.
    pub fn add_rel_row(
        &mut self,
        from: &[Option<bool>],
        to: &[Option<bool>],
        value: Value,
    ) -> DdResult<()> {
        if !self.relation
            || from.len() != self.num_vars as usize
            || to.len() != self.num_vars as usize
        {
            return Err(DdError::AssignmentLength {
                expected: self.num_vars as usize,
                got: from.len().max(to.len()),
            });
        }
        // interleave: positions 2(k−1) and 2(k−1)+1 hold the from/to bits
        // of level k
        let mut inter = Vec::with_capacity(2 * self.num_vars as usize);
        for k in 0..self.num_vars as usize {
            inter.push(from[k]);
            inter.push(to[k]);
        }
        self.rows.push(Self::pack(&inter, value));
        Ok(())
    }

    fn pack(assignment: &[Option<bool>], value: Value) -> Row {
        let mut bits = BitVec::with_capacity(assignment.len());
        let mut care = BitVec::with_capacity(assignment.len());
        for a in assignment {
            bits.push(a.unwrap_or(false));
            care.push(a.is_some());
        }
        Row { bits, care, value }
    }

    /// Materialise a root edge for these rows in `forest`.
    pub fn build(&self, forest: &mut Forest) -> DdResult<Edge> {
        forest.require(
            forest.num_vars() == self.num_vars,
            "forest and explicit function must share the variable count",
        )?;
        forest.require(
            forest.is_relation() == self.relation,
            "forest and explicit function must share the dimension",
        )?;
        let idxs: Vec<u32> = (0..self.rows.len() as u32).collect();
        let top = self.num_vars;
        let e = self.build_rec(forest, top, &idxs)?;
        forest.normalize_edge(top, e)
    }

    fn build_rec(&self, forest: &mut Forest, k: Level, idxs: &[u32]) -> DdResult<Edge> {
        if idxs.is_empty() {
            return forest.terminal(self.default);
        }
        if k == 0 {
            // later rows take precedence on duplicates
            let last = &self.rows[*idxs.last().unwrap() as usize];
            return forest.terminal(last.value);
        }
        let arity = forest.arity();
        let mut children = [Edge::default(); 4];
        if !self.relation {
            let pos = k as usize - 1;
            for (branch, slot) in children[..2].iter_mut().enumerate() {
                let part: Vec<u32> = idxs
                    .iter()
                    .copied()
                    .filter(|&i| {
                        let row = &self.rows[i as usize];
                        !row.care[pos] || row.bits[pos] == (branch == 1)
                    })
                    .collect();
                *slot = self.build_rec(forest, k - 1, &part)?;
            }
        } else {
            let fpos = 2 * (k as usize - 1);
            let tpos = fpos + 1;
            for branch in 0..4usize {
                let (fb, tb) = (branch & 0b10 != 0, branch & 0b01 != 0);
                let part: Vec<u32> = idxs
                    .iter()
                    .copied()
                    .filter(|&i| {
                        let row = &self.rows[i as usize];
                        (!row.care[fpos] || row.bits[fpos] == fb)
                            && (!row.care[tpos] || row.bits[tpos] == tb)
                    })
                    .collect();
                children[branch] = self.build_rec(forest, k - 1, &part)?;
            }
        }
        forest.reduce_edge(k, EdgeLabel::default(), k, &children[..arity], 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForestConfig, Predef};

    #[test]
    fn rows_round_trip_through_evaluation() {
        let mut f = Forest::new(ForestConfig::predef(Predef::Rexbdd, 4)).unwrap();
        let mut xf = ExplicitFunc::new_set(4, Value::Int(0));
        xf.add_minterm("0110", Value::Int(1)).unwrap();
        xf.add_minterm("1-01", Value::Int(1)).unwrap();
        let e = xf.build(&mut f).unwrap();

        for bits in 0..16u8 {
            let vars: Vec<bool> = (0..4).map(|i| bits & (1 << i) != 0).collect();
            let expect = (!vars[0] && vars[1] && vars[2] && !vars[3])
                || (vars[0] && !vars[2] && vars[3]);
            assert_eq!(f.evaluate(e, &vars).unwrap(), Value::Int(expect as i64));
        }
        assert_eq!(f.cardinality(e).unwrap(), 3);
    }

    #[test]
    fn later_rows_overwrite() {
        let mut f = Forest::new(ForestConfig::predef(Predef::Fbdd, 2)).unwrap();
        let mut xf = ExplicitFunc::new_set(2, Value::Int(0));
        xf.add_minterm("11", Value::Int(1)).unwrap();
        xf.add_minterm("11", Value::Int(0)).unwrap();
        let e = xf.build(&mut f).unwrap();
        assert_eq!(f.cardinality(e).unwrap(), 0);
    }
}
