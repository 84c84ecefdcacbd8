//! Fixed-width packed nodes

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::edge::Edge;
use crate::NodeHandle;

pub(crate) const MAX_ARITY: usize = 4;

/// A packed node: unique-table chain link, mark bit, and up to four child
/// edges. Only the first `arity` children of a forest's nodes are
/// meaningful; the layout is fixed-width so arenas stay densely packed and
/// randomly accessible.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PackedNode {
    /// Unique-table chain when live, free-list link when recycled
    pub(crate) next: NodeHandle,
    pub(crate) marked: bool,
    pub(crate) children: [Edge; MAX_ARITY],
}

impl PackedNode {
    pub(crate) fn new(children: &[Edge]) -> PackedNode {
        debug_assert!(children.len() <= MAX_ARITY);
        let mut cs = [Edge::default(); MAX_ARITY];
        cs[..children.len()].copy_from_slice(children);
        PackedNode {
            next: 0,
            marked: false,
            children: cs,
        }
    }

    pub(crate) fn empty() -> PackedNode {
        PackedNode::new(&[])
    }

    #[inline]
    pub(crate) fn child(&self, i: usize) -> Edge {
        self.children[i]
    }

    /// Structural equality over the first `arity` children; the chain link
    /// and mark bit do not participate.
    #[inline]
    pub(crate) fn same_children(&self, other: &PackedNode, arity: usize) -> bool {
        self.children[..arity] == other.children[..arity]
    }

    /// Content hash over the first `arity` children
    pub(crate) fn content_hash(&self, arity: usize) -> u64 {
        let mut h = FxHasher::default();
        for c in &self.children[..arity] {
            c.label().bits().hash(&mut h);
            c.target().bits().hash(&mut h);
            c.value().hash(&mut h);
        }
        h.finish()
    }
}
