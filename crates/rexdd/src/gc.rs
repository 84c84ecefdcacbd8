//! Mark-and-sweep garbage collection

use crate::edge::Edge;
use crate::forest::Forest;
use crate::{Level, NodeHandle};

impl Forest {
    /// Stop-the-world collection: mark everything reachable from the
    /// registered roots, drop stale unique-table chains and cache entries,
    /// sweep the per-level arenas, and clear marks. Returns the number of
    /// nodes reclaimed.
    ///
    /// The operation cache is not a root; its contents are disposable.
    pub fn mark_and_sweep(&mut self) -> u64 {
        self.collect_with(&[])
    }

    /// Collection that additionally keeps `protect` alive; used by operator
    /// entry points that trigger collection while holding operand edges the
    /// client has not registered.
    pub(crate) fn collect_with(&mut self, protect: &[Edge]) -> u64 {
        let before = self.num_nodes();

        let roots: Vec<Edge> = self.roots.iter().collect();
        for e in roots {
            self.mark_edge(e);
        }
        for e in protect {
            self.mark_edge(*e);
        }

        for level in 1..=self.num_vars() {
            let Forest { stores, unique, .. } = self;
            unique
                .level_mut(level as usize)
                .sweep(&mut stores[level as usize - 1]);
        }

        {
            let Forest { stores, cache, .. } = self;
            cache.sweep(|level: Level, h: NodeHandle| {
                stores[level as usize - 1].is_marked(h)
            });
        }

        for s in self.stores.iter_mut() {
            s.sweep();
        }
        before - self.num_nodes()
    }

    /// Mark all nonterminal nodes reachable from `edge`.
    fn mark_edge(&mut self, edge: Edge) {
        if edge.is_terminal() {
            return;
        }
        let level = edge.target_level();
        let handle = edge.node();
        if self.store(level).is_marked(handle) {
            return;
        }
        self.store_mut(level).mark(handle);
        let arity = self.arity();
        for i in 0..arity {
            let child = self.store(level).child(handle, i);
            self.mark_edge(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ForestConfig, Predef};
    use crate::forest::Forest;
    use crate::terminal::Value;

    #[test]
    fn unreachable_nodes_are_reclaimed() {
        let mut f = Forest::new(ForestConfig::predef(Predef::Qbdd, 4)).unwrap();
        let kept = f.constant(Value::Int(1)).unwrap();
        let root = f.register_root(kept);
        let dropped = f.variable(0).unwrap();
        assert!(f.num_nodes() > 4);

        let reclaimed = f.mark_and_sweep();
        assert!(reclaimed > 0);
        assert_eq!(f.num_nodes(), 4, "only the pinned chain survives");
        // the pinned structure is still intact
        assert_eq!(f.evaluate(kept, &[false, true, false, true]).unwrap(), Value::Int(1));
        let _ = dropped;
        f.deregister_root(root);
        let reclaimed = f.mark_and_sweep();
        assert_eq!(reclaimed, 4);
        assert_eq!(f.num_nodes(), 0);
    }
}
