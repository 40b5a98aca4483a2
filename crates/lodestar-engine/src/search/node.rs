//! Search vertices and their packed references.
//!
//! Nodes live in per-worker arenas and are shared read-only across threads,
//! so every mutable field is an atomic accessed with `Relaxed` ordering.
//! Cross-thread visibility of a fresh node comes from grid publication: the
//! owning worker fills `pos`, `gs`, `fs`, and `parent` before the `Release`
//! store of the node's reference into the grid, so any `Acquire` reader of
//! the slot observes an initialized node. After publication only the owner
//! writes, and `gs`/`fs` only ever decrease — a stale read is merely a
//! conservative overestimate.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use lodestar_core::Pos;

use crate::search::arena::Arena;

/// g/f-score infinity: the score of a cell no message has reached.
pub const INF: u32 = u32::MAX;

/// Raw bits meaning "no node": empty grid slot, or the seed's parent.
pub const NO_NODE: u64 = u64::MAX;

// ── Node references ──────────────────────────────────────────────────────────

/// Packed reference to a node: owning worker in the high 32 bits, arena slot
/// in the low 32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef(u64);

impl NodeRef {
    /// Reference slot `slot` of `worker`'s arena.
    #[inline]
    pub fn new(worker: usize, slot: u32) -> NodeRef {
        NodeRef((worker as u64) << 32 | slot as u64)
    }

    /// Decode raw bits; `None` for the [`NO_NODE`] sentinel.
    #[inline]
    pub fn from_raw(bits: u64) -> Option<NodeRef> {
        if bits == NO_NODE { None } else { Some(NodeRef(bits)) }
    }

    /// The packed representation.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Index of the owning worker within its direction.
    #[inline]
    pub fn worker(self) -> usize {
        (self.0 >> 32) as usize
    }

    /// Slot within the owning worker's arena.
    #[inline]
    pub fn slot(self) -> u32 {
        self.0 as u32
    }
}

// ── Node ─────────────────────────────────────────────────────────────────────

/// A search vertex at one grid cell.
///
/// `heap_index` is 0 when the node is not in its owner's heap, otherwise its
/// 1-based position there. `parent` points back along the currently-best
/// path from the direction's seed.
pub struct Node {
    pos: AtomicU32,
    gs: AtomicU32,
    fs: AtomicU32,
    heap_index: AtomicU32,
    parent: AtomicU64,
}

// Nodes cross thread boundaries inside shared arenas.
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn check() {
        assert_send_sync::<Node>();
    }
    let _ = check;
};

impl Default for Node {
    fn default() -> Node {
        Node {
            pos: AtomicU32::new(0),
            gs: AtomicU32::new(INF),
            fs: AtomicU32::new(INF),
            heap_index: AtomicU32::new(0),
            parent: AtomicU64::new(NO_NODE),
        }
    }
}

impl Node {
    /// The cell this node stands on.
    #[inline]
    pub fn pos(&self) -> Pos {
        Pos::unpack(self.pos.load(Ordering::Relaxed))
    }

    /// Record the cell. Written once, before grid publication.
    #[inline]
    pub fn set_pos(&self, pos: Pos) {
        self.pos.store(pos.pack(), Ordering::Relaxed);
    }

    /// Path cost from the direction's seed (cells, not edges).
    #[inline]
    pub fn gs(&self) -> u32 {
        self.gs.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_gs(&self, gs: u32) {
        self.gs.store(gs, Ordering::Relaxed);
    }

    /// g plus the heuristic toward the direction's goal.
    #[inline]
    pub fn fs(&self) -> u32 {
        self.fs.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_fs(&self, fs: u32) {
        self.fs.store(fs, Ordering::Relaxed);
    }

    /// 1-based heap position, 0 when absent. Owner-only.
    #[inline]
    pub fn heap_index(&self) -> u32 {
        self.heap_index.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_heap_index(&self, index: u32) {
        self.heap_index.store(index, Ordering::Relaxed);
    }

    /// Back-pointer along the best known path, `None` at the seed.
    #[inline]
    pub fn parent(&self) -> Option<NodeRef> {
        NodeRef::from_raw(self.parent.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_parent(&self, parent: NodeRef) {
        self.parent.store(parent.raw(), Ordering::Relaxed);
    }
}

/// Per-worker node storage.
pub type NodeArena = Arena<Node>;
