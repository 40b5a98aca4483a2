use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::info;

use lodestar_engine::SearchPool;
use lodestar_maze::MazeFile;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args_os().skip(1);
    let (Some(path), None) = (args.next(), args.next()) else {
        bail!("usage: lodestar <maze-file>");
    };
    let path = PathBuf::from(path);

    let started = Instant::now();
    let mut maze = MazeFile::open(&path)
        .with_context(|| format!("cannot open maze file {}", path.display()))?;
    maze.seal_openings();

    let pool = SearchPool::new();
    let report = pool.run(&maze);
    maze.restore_openings();

    let Some(report) = report else {
        maze.flush()?;
        bail!("maze has no path between its openings");
    };

    for &cell in &report.cells {
        maze.mark(cell);
    }
    maze.flush()
        .with_context(|| format!("cannot write the path back to {}", path.display()))?;

    info!(
        len = report.cells.len(),
        workers = pool.workers_per_side(),
        sent = report.sent,
        received = report.received,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "shortest path written"
    );
    println!("{}", report.cells.len());
    Ok(())
}
