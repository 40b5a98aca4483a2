//! Maze source-file adapter: memory-mapped reads, in-place path write-back.

mod error;
mod file;

pub use error::MazeError;
pub use file::{GOAL, MazeFile, PATH, START, WALL};
