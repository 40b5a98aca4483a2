//! The HDA\* worker loop.
//!
//! Each worker owns one slice of its direction's cells — cell `(x, y)`
//! belongs to worker `(x + y) % n` — and is the only thread that creates or
//! rewrites nodes there. Successor proposals for cells it does not own are
//! routed to the owner's mailbox; its own mailbox is drained once per
//! iteration.
//!
//! Accounting rule: a proposal is credited to `sent` when pushed and to
//! `received` exactly once — when it is discarded as no improvement, merged
//! into an already-queued node, or (for proposals that became a heap entry)
//! when that entry is popped or flushed by the dominance gate. Sends are
//! always credited before the expansion credit, and the idle loop sums
//! received before sent, so balanced totals mean true global quiescence.

use lodestar_core::{Pos, manhattan};
use lodestar_maze::MazeFile;

use crate::search::control::Control;
use crate::search::heap::OpenHeap;
use crate::search::node::{NodeArena, NodeRef};
use crate::search::pool::Direction;

/// Why the idle loop returned.
enum IdleOutcome {
    /// The run is over; leave the main loop.
    Done,
    /// The mailbox filled up again; go drain it.
    Mail,
}

/// One search thread of one direction.
pub(crate) struct Worker<'a> {
    id: usize,
    dir: &'a Direction,
    other: &'a Direction,
    maze: &'a MazeFile,
    control: &'a Control,
    heap: OpenHeap,
}

impl<'a> Worker<'a> {
    pub(crate) fn new(
        id: usize,
        dir: &'a Direction,
        other: &'a Direction,
        maze: &'a MazeFile,
        control: &'a Control,
    ) -> Worker<'a> {
        Worker {
            id,
            dir,
            other,
            maze,
            control,
            heap: OpenHeap::new(),
        }
    }

    /// Run until the search finishes.
    pub(crate) fn run(mut self) {
        self.adopt_seed();
        loop {
            if self.control.finished() {
                break;
            }
            if let Some(slot) = self.heap.pop(self.arena()) {
                self.process(slot);
            } else if let IdleOutcome::Done = self.idle() {
                break;
            }
            self.drain();
        }
    }

    /// Queue the direction's seed if this worker owns its cell. The pool
    /// published the node and booked its send credit before spawning.
    fn adopt_seed(&mut self) {
        let seed = self.dir.endpoints.seed;
        if self.dir.owner_of(seed) != self.id {
            return;
        }
        let nref = self
            .dir
            .grid
            .get(seed)
            .expect("seed node published before spawn");
        self.heap.insert(self.arena(), nref.slot());
    }

    /// Expand one popped node.
    fn process(&mut self, slot: u32) {
        let node = self.arena().get(slot);
        let gs = node.gs();

        // Dominance gate: once g reaches the best meeting length, neither
        // this node nor anything else queued here can improve the path —
        // every queued f is at least this node's f, and f bounds any
        // completion through the node. Flush the lot.
        if gs >= self.control.min_len() {
            let dropped = 1 + self.heap.clear(self.arena());
            self.control.credit_received(self.counter_index(), dropped);
            return;
        }

        let pos = node.pos();
        if let Some(other_ref) = self.other.grid.get(pos) {
            // Reached from both sides. The other g may shrink after this
            // read; a stale value only overestimates the candidate, and the
            // improving side re-offers when it pops this cell itself.
            let len = gs.saturating_add(self.other.node(other_ref).gs());
            if len < self.control.min_len() {
                self.control.offer_meeting(pos, len);
            }
            self.control.credit_received(self.counter_index(), 1);
            return;
        }

        let succ_gs = gs + 1;
        for neighbor in pos.neighbors() {
            if self.maze.is_wall(neighbor) {
                continue;
            }
            // Skip proposals the owner would discard anyway. The read may
            // be stale; the owner re-checks under its own writes.
            if let Some(existing) = self.dir.grid.get(neighbor)
                && self.dir.node(existing).gs() <= succ_gs
            {
                continue;
            }
            let mref = self.dir.mail.alloc(self.id);
            self.dir
                .mail
                .resolve(mref)
                .write(NodeRef::new(self.id, slot), neighbor, succ_gs);
            self.dir.mail.push(self.dir.owner_of(neighbor), mref);
            self.control.credit_sent(self.counter_index(), 1);
        }
        self.control.credit_received(self.counter_index(), 1);
    }

    /// Drain the mailbox once, applying every proposal, then recycle the
    /// chain into the bin.
    fn drain(&mut self) {
        let Some(chain) = self.dir.mail.drain(self.id) else {
            return;
        };
        let mut current = chain;
        loop {
            let msg = self.dir.mail.resolve(current);
            self.deliver(msg.parent(), msg.pos(), msg.gs());
            match self.dir.mail.next_in_chain(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        self.dir.mail.recycle(self.id, chain, current);
    }

    /// Apply one proposal to the local grid.
    fn deliver(&mut self, parent: NodeRef, pos: Pos, gs: u32) {
        debug_assert_eq!(
            self.dir.owner_of(pos),
            self.id,
            "proposal routed to the wrong worker"
        );
        match self.dir.grid.get(pos) {
            None => {
                let slot = self.arena().alloc();
                let node = self.arena().get(slot);
                node.set_pos(pos);
                node.set_parent(parent);
                node.set_gs(gs);
                node.set_fs(gs + manhattan(pos, self.dir.endpoints.goal));
                // Publish only after g is real: meeting probes from the
                // other direction must never see an unscored node.
                self.dir.grid.publish(pos, NodeRef::new(self.id, slot));
                // The heap entry inherits the proposal's receipt obligation.
                self.heap.insert(self.arena(), slot);
            }
            Some(nref) => {
                let node = self.dir.node(nref);
                if gs < node.gs() {
                    node.set_parent(parent);
                    node.set_gs(gs);
                    node.set_fs(gs + manhattan(pos, self.dir.endpoints.goal));
                    if node.heap_index() != 0 {
                        self.heap.update(self.arena(), nref.slot());
                        // The entry already owes one receipt; settle this
                        // proposal now.
                        self.control.credit_received(self.counter_index(), 1);
                    } else {
                        self.heap.insert(self.arena(), nref.slot());
                    }
                } else {
                    self.control.credit_received(self.counter_index(), 1);
                }
            }
        }
    }

    /// Busy-wait with an empty heap until the run ends or mail arrives.
    fn idle(&self) -> IdleOutcome {
        loop {
            if self.control.finished() {
                return IdleOutcome::Done;
            }
            let (sent, received) = self.control.totals();
            if sent == received {
                // Globally quiescent: every proposal was consumed and every
                // heap is empty. With a meeting recorded this is the
                // optimum; without one the maze has no path, and the run
                // must still wind down rather than spin forever.
                self.control.finish();
                return IdleOutcome::Done;
            }
            if self.dir.mail.has_mail(self.id) {
                return IdleOutcome::Mail;
            }
            std::hint::spin_loop();
        }
    }

    #[inline]
    fn arena(&self) -> &'a NodeArena {
        &self.dir.arenas[self.id]
    }

    #[inline]
    fn counter_index(&self) -> usize {
        self.dir.counter_base + self.id
    }
}
