//! End-to-end tests for the bidirectional search pool.
//!
//! Each scenario runs the full pipeline — map the file, seal the openings,
//! search, mark, restore — and checks the rewritten file against the format
//! guarantees: exactly optimal path length, one path among equal optima,
//! bit-exact round-trip of untouched cells, and clean termination
//! accounting under various worker counts.

use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use lodestar_core::Layout;
use lodestar_engine::{PathReport, SearchPool};
use lodestar_maze::MazeFile;

const CORRIDOR: &str = "3 5\n#####\n@   %\n#####\n";

const SINGLE_TURN: &str = "\
5 5
#####
@ ###
# ###
#   %
#####
";

/// Two disjoint equal-length routes between the openings.
const ALTERNATES: &str = "\
5 7
#######
@     #
# ### #
#     %
#######
";

/// The interior behind `@` is sealed off.
const WALLED_OFF: &str = "\
5 5
#####
@ ###
#####
# # %
#####
";

fn write_maze(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create scratch maze");
    file.write_all(text.as_bytes()).expect("write scratch maze");
    file
}

/// Run the whole solve pipeline on `path`, the way the binary does.
fn solve_file(path: &Path, workers: usize) -> Option<PathReport> {
    let mut maze = MazeFile::open(path).expect("open maze");
    maze.seal_openings();
    let report = SearchPool::with_workers(workers).run(&maze);
    maze.restore_openings();
    if let Some(report) = &report {
        for &cell in &report.cells {
            maze.mark(cell);
        }
    }
    maze.flush().expect("flush maze");
    report
}

/// Solve `text` in a scratch file; returns the report and the rewritten file.
fn solve(text: &str, workers: usize) -> (Option<PathReport>, String) {
    let file = write_maze(text);
    let report = solve_file(file.path(), workers);
    let written = std::fs::read_to_string(file.path()).expect("read back maze");
    (report, written)
}

fn count_stars(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'*').count()
}

/// Reference check: plain BFS between the two seed cells with the openings
/// treated as walls. Returns the shortest path's cell count.
fn bfs_cells(text: &str) -> Option<usize> {
    let mut lines = text.lines();
    let header = lines.next().expect("header line");
    let mut fields = header.split_ascii_whitespace();
    let rows: usize = fields.next().unwrap().parse().unwrap();
    let cols: usize = fields.next().unwrap().parse().unwrap();
    let grid: Vec<&[u8]> = lines.take(rows).map(str::as_bytes).collect();
    let layout = Layout::new(rows, cols).unwrap();

    let start = layout.forward().seed;
    let target = layout.reverse().seed;
    let passable = |x: usize, y: usize| {
        let byte = grid[y][x];
        byte != b'#' && byte != b'@' && byte != b'%'
    };
    if !passable(start.x as usize, start.y as usize)
        || !passable(target.x as usize, target.y as usize)
    {
        return None;
    }

    let mut dist = vec![usize::MAX; rows * cols];
    let mut queue = VecDeque::new();
    dist[start.y as usize * cols + start.x as usize] = 0;
    queue.push_back((start.x as usize, start.y as usize));
    while let Some((x, y)) = queue.pop_front() {
        if (x, y) == (target.x as usize, target.y as usize) {
            return Some(dist[y * cols + x] + 1);
        }
        let steps = dist[y * cols + x] + 1;
        for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
            if passable(nx, ny) && dist[ny * cols + nx] > steps {
                dist[ny * cols + nx] = steps;
                queue.push_back((nx, ny));
            }
        }
    }
    None
}

// ── Literal scenarios ─────────────────────────────────────────────────────────

#[test]
fn corridor_is_fully_starred() {
    let (report, written) = solve(CORRIDOR, 1);
    assert_eq!(written, "3 5\n#####\n@***%\n#####\n");

    let report = report.expect("corridor is solvable");
    assert_eq!(report.min_len, 4);
    assert_eq!(report.cells.len(), 3);
}

#[test]
fn corridor_with_many_workers() {
    let (report, written) = solve(CORRIDOR, 4);
    assert_eq!(written, "3 5\n#####\n@***%\n#####\n");
    assert_eq!(report.unwrap().min_len, 4);
}

#[test]
fn single_turn_marks_exactly_the_one_path() {
    for workers in [1, 2, 4] {
        let (report, written) = solve(SINGLE_TURN, workers);
        assert_eq!(
            count_stars(&written),
            5,
            "the only path holds 5 cells ({workers} workers)"
        );
        assert_eq!(report.unwrap().cells.len(), 5);
        // The unique path is fully determined.
        assert_eq!(written, "5 5\n#####\n@*###\n#*###\n#***%\n#####\n");
    }
}

#[test]
fn equal_alternates_mark_one_route_not_both() {
    let top: Vec<(u16, u16)> = vec![(1, 1), (2, 1), (3, 1), (4, 1), (5, 1), (5, 2), (5, 3)];
    let bottom: Vec<(u16, u16)> = vec![(1, 1), (1, 2), (1, 3), (2, 3), (3, 3), (4, 3), (5, 3)];

    for workers in [1, 2, 4] {
        let (report, written) = solve(ALTERNATES, workers);
        let report = report.expect("alternates maze is solvable");
        assert_eq!(report.min_len, 8);
        assert_eq!(count_stars(&written), 7, "{workers} workers");

        let grid: Vec<&[u8]> = written.lines().skip(1).map(str::as_bytes).collect();
        let starred: Vec<(u16, u16)> = (0..5u16)
            .flat_map(|y| (0..7u16).map(move |x| (x, y)))
            .filter(|&(x, y)| grid[y as usize][x as usize] == b'*')
            .collect();

        let is_top = top.iter().all(|cell| starred.contains(cell));
        let is_bottom = bottom.iter().all(|cell| starred.contains(cell));
        assert!(
            is_top != is_bottom,
            "stars must cover exactly one of the two routes, got {starred:?}"
        );
    }
}

#[test]
fn rerunning_on_solved_output_is_idempotent() {
    let file = write_maze(SINGLE_TURN);
    solve_file(file.path(), 2).expect("first run solves");
    let first = std::fs::read_to_string(file.path()).unwrap();

    solve_file(file.path(), 2).expect("second run solves");
    let second = std::fs::read_to_string(file.path()).unwrap();

    assert_eq!(first, second, "solving an already-solved maze changes nothing");
}

#[test]
fn empty_room_has_exact_manhattan_length() {
    let rows = 101;
    let cols = 101;
    let mut text = format!("{rows} {cols}\n");
    for y in 0..rows {
        for x in 0..cols {
            let border = y == 0 || y == rows - 1 || x == 0 || x == cols - 1;
            text.push(match (x, y) {
                (0, 1) => '@',
                _ if (x, y) == (cols - 1, rows - 2) => '%',
                _ if border => '#',
                _ => ' ',
            });
        }
        text.push('\n');
    }

    let expected = (cols - 2) + (rows - 2) - 1;
    for workers in [1, 4] {
        let (report, written) = solve(&text, workers);
        let report = report.expect("open room is solvable");
        assert_eq!(
            report.cells.len(),
            expected,
            "open-room path must be pure manhattan ({workers} workers)"
        );
        assert_eq!(count_stars(&written), expected);
        assert_eq!(report.min_len as usize, expected + 1);
    }
}

#[test]
fn walled_off_maze_exits_without_marking() {
    for workers in [1, 4] {
        let (report, written) = solve(WALLED_OFF, workers);
        assert!(report.is_none(), "no path exists ({workers} workers)");
        assert_eq!(count_stars(&written), 0);
        assert_eq!(written, WALLED_OFF, "file must come back untouched");
    }
}

// ── Cross-cutting properties ──────────────────────────────────────────────────

#[test]
fn path_length_is_deterministic_across_runs_and_workers() {
    let mut lengths = Vec::new();
    for workers in [1, 2, 3, 4] {
        for _ in 0..5 {
            let (report, _) = solve(ALTERNATES, workers);
            lengths.push(report.expect("solvable").min_len);
        }
    }
    assert!(
        lengths.iter().all(|&len| len == lengths[0]),
        "min_len must not depend on scheduling: {lengths:?}"
    );
}

#[test]
fn every_sent_proposal_is_received_by_join() {
    for (name, text) in [
        ("corridor", CORRIDOR),
        ("single-turn", SINGLE_TURN),
        ("alternates", ALTERNATES),
    ] {
        for workers in [1, 2, 4] {
            let (report, _) = solve(text, workers);
            let report = report.expect("solvable");
            assert_eq!(
                report.sent, report.received,
                "{name} with {workers} workers left proposals in flight"
            );
        }
    }
}

#[test]
fn stripping_stars_restores_the_original_body() {
    let (_, written) = solve(ALTERNATES, 2);
    assert_eq!(written.replace('*', " "), ALTERNATES);
}

#[test]
fn matches_bfs_reference_on_random_mazes() {
    let rows = 15;
    let cols = 23;
    let mut state: u64 = 0xA076_1D64_78BD_642F;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut solvable_seen = 0;
    for round in 0..24usize {
        let mut text = format!("{rows} {cols}\n");
        for y in 0..rows {
            for x in 0..cols {
                let border = y == 0 || y == rows - 1 || x == 0 || x == cols - 1;
                let forced_open = (x, y) == (1, 1) || (x, y) == (cols - 2, rows - 2);
                text.push(match (x, y) {
                    (0, 1) => '@',
                    _ if (x, y) == (cols - 1, rows - 2) => '%',
                    _ if border => '#',
                    _ if forced_open => ' ',
                    _ if next() % 10 < 3 => '#',
                    _ => ' ',
                });
            }
            text.push('\n');
        }

        let expected = bfs_cells(&text);
        let workers = 1 + (round % 4);
        let (report, written) = solve(&text, workers);
        match expected {
            Some(cells) => {
                solvable_seen += 1;
                let report = report.unwrap_or_else(|| {
                    panic!("round {round}: solver found nothing, BFS found {cells} cells")
                });
                assert_eq!(
                    report.cells.len(),
                    cells,
                    "round {round}: wrong path length"
                );
                assert_eq!(count_stars(&written), cells, "round {round}");
                assert_eq!(report.sent, report.received, "round {round}");
            }
            None => {
                assert!(report.is_none(), "round {round}: solver invented a path");
            }
        }
    }
    assert!(solvable_seen > 5, "generator produced too few solvable mazes");
}
