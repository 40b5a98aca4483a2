//! Error types for maze file access.

use lodestar_core::{LayoutError, Pos};

/// Errors from opening or parsing a maze source file.
#[derive(Debug, thiserror::Error)]
pub enum MazeError {
    /// Opening, mapping, or flushing the file failed.
    #[error("maze file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The first line is not `"<rows> <cols>\n"`.
    #[error("malformed maze header")]
    BadHeader,
    /// The header dimensions are outside the supported range.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// A maze row ends before `cols` characters.
    #[error("maze row {row} is shorter than the declared width")]
    ShortRow {
        /// Zero-based row index.
        row: usize,
    },
    /// An opening is missing from the position the format fixes.
    #[error("expected opening '{expected}' at {pos}, found '{found}'")]
    BadOpening {
        /// The opening character the format requires here.
        expected: char,
        /// Where it must appear.
        pos: Pos,
        /// The character actually present.
        found: char,
    },
}
