//! Error types for maze geometry validation.

/// Errors from validating maze dimensions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// The maze is too small to hold a walled border and an interior.
    #[error("maze must be at least 3x3, got {rows}x{cols}")]
    TooSmall {
        /// Number of rows found.
        rows: usize,
        /// Number of columns found.
        cols: usize,
    },
    /// A dimension does not fit the 16-bit coordinate space.
    #[error("maze dimensions {rows}x{cols} exceed the supported 65535 limit")]
    TooLarge {
        /// Number of rows found.
        rows: usize,
        /// Number of columns found.
        cols: usize,
    },
}
