//! Evaluation of an edge at a concrete assignment

use crate::config::Encoding;
use crate::edge::Edge;
use crate::forest::Forest;
use crate::terminal::{Special, Value};
use crate::{DdError, DdResult};

impl Forest {
    /// Evaluate a set-forest edge at an assignment. `vars[k-1]` is the
    /// value of the variable tested at level `k`.
    pub fn evaluate(&self, edge: Edge, vars: &[bool]) -> DdResult<Value> {
        self.require(!self.is_relation(), "use evaluate_rel on relation forests")?;
        if vars.len() != self.num_vars() as usize {
            return Err(DdError::AssignmentLength {
                expected: self.num_vars() as usize,
                got: vars.len(),
            });
        }
        let mut e = edge;
        for k in (1..=self.num_vars()).rev() {
            e = self.cofactor(k, e, vars[k as usize - 1] as usize);
        }
        Ok(self.resolve_terminal(e))
    }

    /// Evaluate a relation-forest edge at a (from, to) assignment pair.
    pub fn evaluate_rel(&self, edge: Edge, from: &[bool], to: &[bool]) -> DdResult<Value> {
        self.require(self.is_relation(), "evaluate_rel needs a relation forest")?;
        if from.len() != self.num_vars() as usize || to.len() != self.num_vars() as usize {
            return Err(DdError::AssignmentLength {
                expected: self.num_vars() as usize,
                got: from.len().max(to.len()),
            });
        }
        let mut e = edge;
        for k in (1..=self.num_vars()).rev() {
            let i = ((from[k as usize - 1] as usize) << 1) | to[k as usize - 1] as usize;
            e = self.cofactor_rel(k, e, i);
        }
        Ok(self.resolve_terminal(e))
    }

    /// Final value of a fully-cofactored edge (target level 0)
    pub(crate) fn resolve_terminal(&self, e: Edge) -> Value {
        debug_assert!(e.is_terminal());
        match self.config.encoding {
            Encoding::Terminal => self.terminal_denotation(e),
            Encoding::EdgePlus | Encoding::EdgePlusMod => {
                match e.target().terminal_value() {
                    Value::Special(Special::Omega) => Value::Int(e.value()),
                    Value::Int(v) => Value::Int(self.add_values(e.value(), v)),
                    other => other,
                }
            }
        }
    }
}
