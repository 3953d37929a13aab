//! Fault-isolated tile scheduling
//!
//! Every tile is an independent job. Errors and panics are caught per tile
//! and recorded in its report; the remaining tiles run regardless.

use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::strategy::{ParallelStrategy, ProcessingMode};

/// What a successful tile job did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileOutcome {
    Completed,
    /// Nothing to do, e.g. outputs already exist
    Skipped(String),
}

/// Final state of one tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileStatus {
    Completed,
    Skipped(String),
    Failed(String),
}

/// Outcome and timing of one tile job
#[derive(Debug, Clone)]
pub struct TileReport {
    pub tile: String,
    pub status: TileStatus,
    pub elapsed: Duration,
}

impl TileReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, TileStatus::Failed(_))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `job` on every tile under `mode`, one report per tile in input order
pub fn run_tiles<T, E, F>(mode: ProcessingMode, tiles: &[T], job: F) -> Vec<TileReport>
where
    T: Display + Sync,
    E: Display,
    F: Fn(&T) -> Result<TileOutcome, E> + Sync + Send,
{
    mode.par_map(tiles, |tile| {
        let start = Instant::now();
        let status = match catch_unwind(AssertUnwindSafe(|| job(tile))) {
            Ok(Ok(TileOutcome::Completed)) => TileStatus::Completed,
            Ok(Ok(TileOutcome::Skipped(reason))) => TileStatus::Skipped(reason),
            Ok(Err(e)) => TileStatus::Failed(e.to_string()),
            Err(payload) => TileStatus::Failed(format!("panicked: {}", panic_message(payload.as_ref()))),
        };
        let elapsed = start.elapsed();
        match &status {
            TileStatus::Failed(msg) => error!("Tile {} failed: {}", tile, msg),
            TileStatus::Skipped(reason) => info!("Tile {} skipped: {}", tile, reason),
            TileStatus::Completed => info!("Tile {} completed in {:.1?}", tile, elapsed),
        }
        TileReport {
            tile: tile.to_string(),
            status,
            elapsed,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_are_isolated() {
        let tiles = ["x1y1", "x1y2", "x2y1", "x2y2"];
        for mode in [ProcessingMode::Sequential, ProcessingMode::ParallelWith(2)] {
            let reports = run_tiles(mode, &tiles, |t| match *t {
                "x1y2" => Err("no observations".to_string()),
                "x2y1" => panic!("boom"),
                "x2y2" => Ok(TileOutcome::Skipped("sentinel exists".into())),
                _ => Ok(TileOutcome::Completed),
            });
            assert_eq!(reports.len(), 4);
            assert_eq!(reports[0].status, TileStatus::Completed);
            assert_eq!(reports[1].status, TileStatus::Failed("no observations".into()));
            assert!(matches!(&reports[2].status, TileStatus::Failed(m) if m.contains("boom")));
            assert_eq!(reports[3].status, TileStatus::Skipped("sentinel exists".into()));
            assert_eq!(reports.iter().filter(|r| r.is_failed()).count(), 2);
        }
    }
}
