//! Parallel bidirectional A\* over a block maze.
//!
//! Two frontiers — one rooted inside each opening — each run as a pool of
//! workers cooperating through hash-distributed lock-free mailboxes (the
//! HDA\* pattern). Workers keep private heaps and arenas, detect meetings
//! against the opposite direction's grid under a shared best-so-far, and
//! terminate through distributed sent/received counting.

pub mod arena;
pub mod control;
pub mod grid;
pub mod heap;
pub mod node;
pub mod pool;
pub mod queue;
mod worker;

use lodestar_core::Pos;

pub use control::Meeting;
pub use pool::SearchPool;

/// Outcome of a search that found a path.
#[derive(Debug, Clone)]
pub struct PathReport {
    /// Every cell on the chosen shortest path: the meeting cell plus both
    /// parent chains. No particular order.
    pub cells: Vec<Pos>,
    /// Summed g-scores at the meeting cell. The path holds `min_len - 1`
    /// cells, both directions counting the meeting cell once.
    pub min_len: u32,
    /// Total proposals sent, including the two seed self-messages.
    pub sent: u64,
    /// Total proposals consumed. Equals [`sent`](PathReport::sent) once the
    /// workers have joined.
    pub received: u64,
}
