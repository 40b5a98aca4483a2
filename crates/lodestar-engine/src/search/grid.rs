//! Per-direction dense map from cells to published nodes.

use std::sync::atomic::{AtomicU64, Ordering};

use lodestar_core::{Layout, Pos};

use crate::search::node::{NO_NODE, NodeRef};

/// Row-major `rows × cols` table of packed node references.
///
/// Each slot has a single writer — the worker owning the cell's hash — and
/// three kinds of readers: the writer itself, the opposite direction's
/// workers probing for meetings, and the controller walking parent chains
/// after join. Publication is a `Release` store so an `Acquire` read of a
/// non-empty slot observes a fully initialized node.
pub struct Grid {
    cols: usize,
    slots: Box<[AtomicU64]>,
}

impl Grid {
    /// Create an all-empty grid for `layout`.
    pub fn new(layout: &Layout) -> Grid {
        Grid {
            cols: layout.cols(),
            slots: (0..layout.cells()).map(|_| AtomicU64::new(NO_NODE)).collect(),
        }
    }

    /// The node published at `pos`, if any.
    #[inline]
    pub fn get(&self, pos: Pos) -> Option<NodeRef> {
        NodeRef::from_raw(self.slots[pos.index(self.cols)].load(Ordering::Acquire))
    }

    /// Publish a freshly initialized node at `pos`. Called once per cell,
    /// by the cell's owner.
    #[inline]
    pub fn publish(&self, pos: Pos, node: NodeRef) {
        debug_assert!(self.get(pos).is_none(), "cell already published");
        self.slots[pos.index(self.cols)].store(node.raw(), Ordering::Release);
    }
}
