//! Lock-free successor mailboxes.
//!
//! Every worker in a direction owns one mailbox: a Treiber-style LIFO stack
//! of messages pushed by any worker (single CAS per send) and drained by the
//! owner with a single exchange. Messages live in per-worker arenas; a
//! drained chain is recycled into the consumer's free bin in one splice, so
//! records migrate to whichever worker last consumed them and steady-state
//! traffic allocates nothing.
//!
//! Delivery order is LIFO, not FIFO. That is fine for the search: a node
//! accepts a proposal only when it strictly improves the g-score, so
//! reordered proposals merely get discarded.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use lodestar_core::Pos;

use crate::search::arena::Arena;
use crate::search::node::NodeRef;

/// Raw bits meaning "no message": empty mailbox, empty bin, end of chain.
pub const NO_MSG: u64 = u64::MAX;

// ── Message references ───────────────────────────────────────────────────────

/// Packed reference to a message: allocating worker in the high 32 bits,
/// arena slot in the low 32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgRef(u64);

impl MsgRef {
    #[inline]
    fn new(worker: usize, slot: u32) -> MsgRef {
        MsgRef((worker as u64) << 32 | slot as u64)
    }

    /// Decode raw bits; `None` for the [`NO_MSG`] sentinel.
    #[inline]
    pub fn from_raw(bits: u64) -> Option<MsgRef> {
        if bits == NO_MSG { None } else { Some(MsgRef(bits)) }
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    fn worker(self) -> usize {
        (self.0 >> 32) as usize
    }

    #[inline]
    fn slot(self) -> u32 {
        self.0 as u32
    }
}

// ── Message ──────────────────────────────────────────────────────────────────

/// A successor proposal: reach `pos` with cost `gs` by stepping from
/// `parent`. `next` is the intrusive mailbox / free-bin link.
///
/// Fields are written by whichever worker currently owns the record and are
/// published to the consumer by the mailbox-head CAS, so plain `Relaxed`
/// access suffices everywhere else.
pub struct Message {
    parent: AtomicU64,
    pos: AtomicU32,
    gs: AtomicU32,
    next: AtomicU64,
}

impl Default for Message {
    fn default() -> Message {
        Message {
            parent: AtomicU64::new(0),
            pos: AtomicU32::new(0),
            gs: AtomicU32::new(0),
            next: AtomicU64::new(NO_MSG),
        }
    }
}

impl Message {
    /// Fill the payload before pushing.
    #[inline]
    pub fn write(&self, parent: NodeRef, pos: Pos, gs: u32) {
        self.parent.store(parent.raw(), Ordering::Relaxed);
        self.pos.store(pos.pack(), Ordering::Relaxed);
        self.gs.store(gs, Ordering::Relaxed);
    }

    /// The proposing node.
    #[inline]
    pub fn parent(&self) -> NodeRef {
        NodeRef::from_raw(self.parent.load(Ordering::Relaxed))
            .expect("message without a parent node")
    }

    /// The destination cell.
    #[inline]
    pub fn pos(&self) -> Pos {
        Pos::unpack(self.pos.load(Ordering::Relaxed))
    }

    /// The tentative g-score for the destination.
    #[inline]
    pub fn gs(&self) -> u32 {
        self.gs.load(Ordering::Relaxed)
    }

    #[inline]
    fn next_raw(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

// ── Mailboxes ────────────────────────────────────────────────────────────────

struct Mailbox {
    /// Top of the LIFO chain of pending messages.
    head: AtomicU64,
    /// Owner-private free list of recycled messages.
    bin: AtomicU64,
    arena: Arena<Message>,
}

/// One direction's mailboxes, indexed by worker.
///
/// Ownership discipline: `alloc`, `drain`, `recycle`, and bin access are
/// owner-only for the given worker index; `push` and `resolve` are free for
/// all workers of the direction.
pub struct Mailboxes {
    boxes: Box<[Mailbox]>,
}

impl Mailboxes {
    /// Create `workers` empty mailboxes.
    pub fn new(workers: usize) -> Mailboxes {
        Mailboxes {
            boxes: (0..workers)
                .map(|_| Mailbox {
                    head: AtomicU64::new(NO_MSG),
                    bin: AtomicU64::new(NO_MSG),
                    arena: Arena::new(),
                })
                .collect(),
        }
    }

    /// Resolve a message reference.
    #[inline]
    pub fn resolve(&self, mref: MsgRef) -> &Message {
        self.boxes[mref.worker()].arena.get(mref.slot())
    }

    /// Take a free message record: the owner's bin first, a fresh arena slot
    /// otherwise. Owner-only.
    pub fn alloc(&self, owner: usize) -> MsgRef {
        let bin = &self.boxes[owner].bin;
        match MsgRef::from_raw(bin.load(Ordering::Relaxed)) {
            Some(recycled) => {
                bin.store(self.resolve(recycled).next_raw(), Ordering::Relaxed);
                recycled
            }
            None => MsgRef::new(owner, self.boxes[owner].arena.alloc()),
        }
    }

    /// Push a filled message onto `target`'s mailbox. Any worker.
    pub fn push(&self, target: usize, mref: MsgRef) {
        let msg = self.resolve(mref);
        let head = &self.boxes[target].head;
        let mut current = head.load(Ordering::Relaxed);
        loop {
            msg.next.store(current, Ordering::Relaxed);
            match head.compare_exchange_weak(
                current,
                mref.raw(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    /// Take the whole pending chain, newest first. Owner-only.
    #[inline]
    pub fn drain(&self, owner: usize) -> Option<MsgRef> {
        MsgRef::from_raw(self.boxes[owner].head.swap(NO_MSG, Ordering::Acquire))
    }

    /// Walk one link of a drained chain.
    #[inline]
    pub fn next_in_chain(&self, mref: MsgRef) -> Option<MsgRef> {
        MsgRef::from_raw(self.resolve(mref).next_raw())
    }

    /// Splice a fully processed chain onto the owner's bin. Owner-only.
    pub fn recycle(&self, owner: usize, chain_head: MsgRef, chain_tail: MsgRef) {
        let bin = &self.boxes[owner].bin;
        self.resolve(chain_tail)
            .next
            .store(bin.load(Ordering::Relaxed), Ordering::Relaxed);
        bin.store(chain_head.raw(), Ordering::Relaxed);
    }

    /// Whether `owner`'s mailbox has pending messages. Cheap probe for the
    /// idle loop; a racing push may land right after a `false`.
    #[inline]
    pub fn has_mail(&self, owner: usize) -> bool {
        self.boxes[owner].head.load(Ordering::Relaxed) != NO_MSG
    }
}
