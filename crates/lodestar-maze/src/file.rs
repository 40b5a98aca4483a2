//! Memory-mapped access to a maze source file.
//!
//! The file is opened read-write and mapped shared, so the path written at
//! the end lands in the original file without a copy. During the search the
//! two openings are sealed to `#`; workers then read the mapped bytes
//! directly and never need a passability copy.

use std::fs::OpenOptions;
use std::path::Path;

use memmap2::MmapMut;
use tracing::debug;

use lodestar_core::{Layout, Pos};

use crate::error::MazeError;

/// Wall character.
pub const WALL: u8 = b'#';
/// Start-opening character on the left edge.
pub const START: u8 = b'@';
/// Goal-opening character on the right edge.
pub const GOAL: u8 = b'%';
/// Character written along the computed shortest path.
pub const PATH: u8 = b'*';

/// A maze source file mapped read-write.
///
/// Cell reads go straight to the mapping; all mutation (sealing, marking,
/// restoring) takes `&mut self`, so a `&MazeFile` shared across search
/// threads is immutable for the duration of the borrow.
pub struct MazeFile {
    map: MmapMut,
    layout: Layout,
    /// Byte offset of each maze row in the mapping.
    line_offsets: Vec<usize>,
}

impl MazeFile {
    /// Open and map `path`, parse the header, and index the rows.
    ///
    /// Validates that every row carries at least `cols` bytes and that both
    /// openings sit where the format fixes them.
    pub fn open(path: &Path) -> Result<MazeFile, MazeError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        // Safety: the mapping is dropped before the file handle and nothing
        // else truncates the file while this process holds it.
        let map = unsafe { MmapMut::map_mut(&file)? };

        let (layout, body_start) = parse_header(&map)?;
        let line_offsets = index_lines(&map, &layout, body_start)?;

        let maze = MazeFile {
            map,
            layout,
            line_offsets,
        };
        maze.check_opening(maze.layout.start_opening(), START)?;
        maze.check_opening(maze.layout.goal_opening(), GOAL)?;

        debug!(
            rows = layout.rows(),
            cols = layout.cols(),
            "mapped maze file"
        );
        Ok(maze)
    }

    /// The validated maze geometry.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// The character stored at `pos`.
    #[inline]
    pub fn at(&self, pos: Pos) -> u8 {
        self.map[self.offset(pos)]
    }

    /// Whether `pos` currently reads as a wall.
    #[inline]
    pub fn is_wall(&self, pos: Pos) -> bool {
        self.at(pos) == WALL
    }

    /// One maze row as raw bytes, `cols` wide.
    pub fn row(&self, y: usize) -> &[u8] {
        let start = self.line_offsets[y];
        &self.map[start..start + self.layout.cols()]
    }

    /// Seal both openings to `#` so the search treats them as walls.
    pub fn seal_openings(&mut self) {
        let start = self.layout.start_opening();
        let goal = self.layout.goal_opening();
        self.set(start, WALL);
        self.set(goal, WALL);
    }

    /// Restore the sealed openings to `@` and `%`.
    pub fn restore_openings(&mut self) {
        let start = self.layout.start_opening();
        let goal = self.layout.goal_opening();
        self.set(start, START);
        self.set(goal, GOAL);
    }

    /// Mark one path cell with `*`.
    ///
    /// Callers pass interior cells only; the parent chains can never reach
    /// the sealed openings.
    pub fn mark(&mut self, pos: Pos) {
        debug_assert!(
            pos != self.layout.start_opening() && pos != self.layout.goal_opening(),
            "path marking must not touch an opening"
        );
        self.set(pos, PATH);
    }

    /// Flush the mapping back to the file.
    pub fn flush(&self) -> Result<(), MazeError> {
        self.map.flush()?;
        Ok(())
    }

    fn set(&mut self, pos: Pos, byte: u8) {
        let offset = self.offset(pos);
        self.map[offset] = byte;
    }

    #[inline]
    fn offset(&self, pos: Pos) -> usize {
        self.line_offsets[pos.y as usize] + pos.x as usize
    }

    fn check_opening(&self, pos: Pos, expected: u8) -> Result<(), MazeError> {
        let found = self.at(pos);
        if found != expected {
            return Err(MazeError::BadOpening {
                expected: expected as char,
                pos,
                found: found as char,
            });
        }
        Ok(())
    }
}

/// Parse the `"<rows> <cols>\n"` header. Returns the layout and the byte
/// offset of the first maze row.
fn parse_header(map: &[u8]) -> Result<(Layout, usize), MazeError> {
    let newline = map
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(MazeError::BadHeader)?;
    let header = std::str::from_utf8(&map[..newline]).map_err(|_| MazeError::BadHeader)?;

    let mut fields = header.split_ascii_whitespace();
    let rows: usize = fields
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or(MazeError::BadHeader)?;
    let cols: usize = fields
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or(MazeError::BadHeader)?;
    if fields.next().is_some() {
        return Err(MazeError::BadHeader);
    }

    Ok((Layout::new(rows, cols)?, newline + 1))
}

/// Record the byte offset of each maze row, scanning forward to each row's
/// newline rather than assuming a fixed stride.
fn index_lines(map: &[u8], layout: &Layout, body_start: usize) -> Result<Vec<usize>, MazeError> {
    let cols = layout.cols();
    let mut offsets = Vec::with_capacity(layout.rows());
    let mut cursor = body_start;

    for row in 0..layout.rows() {
        if cursor + cols > map.len() {
            return Err(MazeError::ShortRow { row });
        }
        if map[cursor..cursor + cols].contains(&b'\n') {
            return Err(MazeError::ShortRow { row });
        }
        offsets.push(cursor);
        cursor += cols;
        // Skip any trailing bytes up to and including the row's newline.
        while cursor < map.len() && map[cursor] != b'\n' {
            cursor += 1;
        }
        cursor += 1;
    }

    Ok(offsets)
}
