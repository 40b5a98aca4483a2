//! The search pool: one worker pool per direction over shared run state.

use std::num::NonZeroUsize;

use tracing::debug;

use lodestar_core::{Endpoints, Layout, Pos, manhattan};
use lodestar_maze::MazeFile;

use crate::search::PathReport;
use crate::search::control::Control;
use crate::search::grid::Grid;
use crate::search::node::{Node, NodeArena, NodeRef};
use crate::search::queue::Mailboxes;
use crate::search::worker::Worker;

/// One direction's search state: its grid, per-worker node arenas and
/// mailboxes, and its endpoints.
pub(crate) struct Direction {
    pub(crate) grid: Grid,
    pub(crate) arenas: Box<[NodeArena]>,
    pub(crate) mail: Mailboxes,
    pub(crate) endpoints: Endpoints,
    /// This direction's first row in the shared counter table.
    pub(crate) counter_base: usize,
}

impl Direction {
    fn new(
        layout: &Layout,
        endpoints: Endpoints,
        workers: usize,
        counter_base: usize,
    ) -> Direction {
        let dir = Direction {
            grid: Grid::new(layout),
            arenas: (0..workers).map(|_| NodeArena::new()).collect(),
            mail: Mailboxes::new(workers),
            endpoints,
            counter_base,
        };
        dir.plant_seed();
        dir
    }

    /// Publish the seed node before any worker runs. Seeding up front means
    /// a frontier sweeping all the way to the opposite seed always finds a
    /// meeting there, however unevenly the two pools are scheduled.
    fn plant_seed(&self) {
        let seed = self.endpoints.seed;
        let owner = self.owner_of(seed);
        let slot = self.arenas[owner].alloc();
        let node = self.arenas[owner].get(slot);
        node.set_pos(seed);
        node.set_gs(1);
        node.set_fs(1 + manhattan(seed, self.endpoints.goal));
        self.grid.publish(seed, NodeRef::new(owner, slot));
    }

    /// Worker count of this direction.
    #[inline]
    pub(crate) fn workers(&self) -> usize {
        self.arenas.len()
    }

    /// The worker owning cell `pos`.
    #[inline]
    pub(crate) fn owner_of(&self, pos: Pos) -> usize {
        (pos.x as usize + pos.y as usize) % self.workers()
    }

    /// Resolve a node reference against this direction's arenas.
    #[inline]
    pub(crate) fn node(&self, nref: NodeRef) -> &Node {
        self.arenas[nref.worker()].get(nref.slot())
    }

    fn seed_owner(&self) -> usize {
        self.owner_of(self.endpoints.seed)
    }
}

/// Bidirectional search pool — spawns and joins both directions' workers.
pub struct SearchPool {
    workers_per_side: usize,
}

impl SearchPool {
    /// Create a pool sized to half the machine's processors per direction,
    /// so the two directions together fill the machine.
    pub fn new() -> SearchPool {
        let parallelism = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        SearchPool {
            workers_per_side: (parallelism / 2).max(1),
        }
    }

    /// Create a pool with an explicit per-direction worker count.
    ///
    /// # Panics
    ///
    /// Panics if `workers_per_side` is zero.
    pub fn with_workers(workers_per_side: usize) -> SearchPool {
        assert!(workers_per_side >= 1, "a direction needs at least one worker");
        SearchPool { workers_per_side }
    }

    /// Workers spawned per direction.
    #[inline]
    pub fn workers_per_side(&self) -> usize {
        self.workers_per_side
    }

    /// Run the bidirectional search over `maze` (openings already sealed).
    ///
    /// Returns `None` when both frontiers drained without meeting — the
    /// maze has no path between its openings.
    pub fn run(&self, maze: &MazeFile) -> Option<PathReport> {
        let layout = maze.layout();
        let n = self.workers_per_side;
        let forward = Direction::new(&layout, layout.forward(), n, 0);
        let reverse = Direction::new(&layout, layout.reverse(), n, n);
        let control = Control::new(2 * n);

        // Book the two seeds' implicit self-messages before anything runs;
        // the idle sums must never balance while a frontier is still
        // untouched.
        control.credit_sent(forward.counter_base + forward.seed_owner(), 1);
        control.credit_sent(reverse.counter_base + reverse.seed_owner(), 1);

        debug!(
            workers = n,
            rows = layout.rows(),
            cols = layout.cols(),
            "starting bidirectional search"
        );

        std::thread::scope(|s| {
            for id in 0..n {
                let (fwd, rev, control) = (&forward, &reverse, &control);
                s.spawn(move || Worker::new(id, fwd, rev, maze, control).run());
                s.spawn(move || Worker::new(id, rev, fwd, maze, control).run());
            }
        });
        // scope joined every worker; all state is quiescent from here on.

        let (sent, received) = control.totals();
        let meeting = control.meeting()?;

        let mut cells = vec![meeting.pos];
        collect_parents(&forward, meeting.pos, &mut cells);
        collect_parents(&reverse, meeting.pos, &mut cells);

        debug!(
            len = meeting.len,
            cells = cells.len(),
            sent,
            received,
            "search finished"
        );

        Some(PathReport {
            cells,
            min_len: meeting.len,
            sent,
            received,
        })
    }
}

impl Default for SearchPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk one direction's parent chain from the meeting cell, excluding the
/// meeting cell itself.
fn collect_parents(dir: &Direction, meeting: Pos, cells: &mut Vec<Pos>) {
    let nref = dir
        .grid
        .get(meeting)
        .expect("meeting cell is published in both grids");
    let mut node = dir.node(nref);
    while let Some(parent) = node.parent() {
        node = dir.node(parent);
        cells.push(node.pos());
    }
}
