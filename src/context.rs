use std::sync::Arc;
use std::time::{Duration, Instant};

use fixedbitset::FixedBitSet;

use crate::algorithm::parallel::SharedSearchState;
use crate::board::{Board, Placement};
use crate::collaborators::{Logger, NullLogger, NullSaveProvider, NullVisualizer, SaveProvider, Visualizer};
use crate::config::SolverConfig;
use crate::domain::DomainManager;
use crate::error::SolverError;
use crate::heuristics::MrvIndex;
use crate::history::{HistoryEntry, PlacementHistory};
use crate::propagate::ConstraintPropagator;
use crate::stats::{ProgressEstimator, ProgressReporter, Statistics};
use crate::tile::TileSet;

/// Everything one solve thread needs, bundled so the driver's recursive
/// `step` doesn't thread a dozen separate borrows through every call (§4.8).
///
/// Mirrors how the donor's `algorithm/*.rs` functions each closed over one
/// `&mut Map` plus a couple of side tables; here the side tables (domains,
/// MRV index, used set, history, stats) have multiplied enough with AC-3 and
/// resumability that bundling them is the only way to keep the driver's
/// signature readable. `tiles` is borrowed rather than owned because both
/// the single-solve and parallel-coordinator entry points already hold a
/// `TileSet` they want to keep using after the solve returns.
pub struct SolveContext<'a> {
    pub board: Board,
    pub tiles: &'a TileSet,
    pub used: FixedBitSet,
    pub domains: DomainManager,
    pub mrv: MrvIndex,
    pub history: PlacementHistory,
    pub stats: Statistics,
    pub progress: ProgressEstimator,
    /// `indicatif`-backed bar driven by placements/backtracks when
    /// `config.verbose` is set (§4.11); hidden (no terminal output)
    /// otherwise.
    pub progress_reporter: ProgressReporter,
    pub config: SolverConfig,
    pub logger: Box<dyn Logger>,
    pub save_provider: Box<dyn SaveProvider>,
    pub visualizer: Box<dyn Visualizer>,
    /// Cross-worker coordination state, set only when this context belongs
    /// to one worker of a [`crate::algorithm::parallel::solve_parallel`] or
    /// [`crate::algorithm::parallel::solve_work_stealing`] run. `None` for a
    /// plain single-threaded [`crate::solve`]/[`crate::solve_with_history`].
    pub shared: Option<Arc<SharedSearchState>>,
    /// Wall-clock of the last [`SaveProvider::save`] snapshot, compared
    /// against `config.thread_state_save_interval_ms` by the driver (§4.8
    /// step 4). Seeded at construction so the first check never fires
    /// immediately on a freshly started worker.
    pub(crate) last_thread_state_save: Instant,
}

impl<'a> SolveContext<'a> {
    /// Build a context for `board`, deriving the used-tile set from
    /// whatever is already fixed on it and initializing domains/MRV/history
    /// accordingly. Collaborators default to the `Null*` no-ops.
    #[must_use]
    pub fn new(board: Board, tiles: &'a TileSet, config: SolverConfig) -> Self {
        let (rows, cols) = board.size();
        let mut used = FixedBitSet::with_capacity(tiles.len());
        for r in 0..rows {
            for c in 0..cols {
                if let Some(placement) = board.get(r, c) {
                    used.insert(placement.tile_id - 1);
                }
            }
        }

        let mut domains = DomainManager::with_cache_mode(rows, cols, tiles.len(), config.use_domain_cache);
        domains.initialize(&board, tiles, &used);

        let mut mrv = MrvIndex::new();
        mrv.rebuild(&domains, &board);

        let history = PlacementHistory::new(&board.fixed_entries());
        let progress_reporter = ProgressReporter::new(config.verbose, (rows * cols) as u64);

        Self {
            board,
            tiles,
            used,
            domains,
            mrv,
            history,
            stats: Statistics::new(),
            progress: ProgressEstimator::new(),
            progress_reporter,
            config,
            logger: Box::new(NullLogger),
            save_provider: Box::new(NullSaveProvider),
            visualizer: Box::new(NullVisualizer),
            shared: None,
            last_thread_state_save: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Box<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Attach the shared cross-worker coordination state (§4.10). Only
    /// [`crate::algorithm::parallel`] callers need this.
    #[must_use]
    pub fn with_shared(mut self, shared: Arc<SharedSearchState>) -> Self {
        self.shared = Some(shared);
        self
    }

    #[must_use]
    pub fn with_save_provider(mut self, save_provider: Box<dyn SaveProvider>) -> Self {
        self.save_provider = save_provider;
        self
    }

    #[must_use]
    pub fn with_visualizer(mut self, visualizer: Box<dyn Visualizer>) -> Self {
        self.visualizer = visualizer;
        self
    }

    /// Commit `tile_id` at rotation `rotation` into `(r, c)`: updates the
    /// board, used set, history, and MRV index, and bumps the placement
    /// counter. Caller must have already checked [`crate::validator::PlacementValidator`]
    /// and [`crate::symmetry::SymmetryBreaker`].
    pub fn commit(&mut self, r: usize, c: usize, tile_id: usize, rotation: u8) {
        let edges = self.tiles.get(tile_id).rotated(rotation);
        let placement = Placement { tile_id, rotation, edges };
        self.board.place(r, c, placement);
        self.used.insert(tile_id - 1);
        self.history.record(r, c, placement);
        self.mrv.remove(r, c);
        self.stats.record_placement();
    }

    /// Propagate the consequences of the last commit out from `(r, c)`, if
    /// AC-3 is enabled, updating the MRV index for every cell whose domain
    /// changed.
    pub fn propagate_from(&mut self, r: usize, c: usize) -> Result<(), SolverError> {
        if !self.config.use_ac3 {
            return Ok(());
        }
        ConstraintPropagator::propagate(&mut self.domains, &self.board, self.tiles, &self.used, r, c)?;
        for side in crate::tile::ALL_SIDES {
            if let Some((nr, nc)) = self.board.neighbor(r, c, side) {
                if self.board.is_empty(nr, nc) {
                    self.mrv.update(&self.domains, nr, nc);
                }
            }
        }
        Ok(())
    }

    /// Hand a thread-state snapshot to the save collaborator if at least
    /// `config.thread_state_save_interval_ms` has elapsed since the last
    /// one (§4.8 step 4, §6). A save failure is narrated through the
    /// logger rather than aborting the search — losing one checkpoint
    /// isn't worth discarding however much of the tree has been explored.
    pub(crate) fn maybe_save_thread_state(&mut self) {
        let interval = Duration::from_millis(self.config.thread_state_save_interval_ms);
        if self.last_thread_state_save.elapsed() < interval {
            return;
        }
        let label = format!("{}-{}", self.config.thread_label, self.config.thread_id);
        if let Err(err) = self.save_provider.save(&label, &self.board) {
            self.logger.log(self.history.depth(), &format!("thread state save failed: {err}"));
        }
        self.last_thread_state_save = Instant::now();
    }

    /// Whether AC-3 (or, with it disabled, a direct scan) has left any empty
    /// cell with zero surviving options.
    #[must_use]
    pub fn has_dead_end(&self) -> bool {
        ConstraintPropagator::would_cause_dead_end(&self.domains, &self.board)
    }

    /// Undo the most recent non-fixed commit: pop history, clear the board
    /// cell and used bit, restore domains for the cell and its neighbors,
    /// and reinsert the cell into the MRV index. Returns the entry that was
    /// undone, or `None` if history is back at the fixed prefix.
    pub fn rollback(&mut self) -> Option<HistoryEntry> {
        let entry = self.history.pop()?;
        self.board.remove(entry.row, entry.col);
        self.used.set(entry.placement.tile_id - 1, false);
        self.domains.restore_after_remove(&self.board, self.tiles, &self.used, entry.row, entry.col);

        self.mrv.update(&self.domains, entry.row, entry.col);
        for side in crate::tile::ALL_SIDES {
            if let Some((nr, nc)) = self.board.neighbor(entry.row, entry.col, side) {
                if self.board.is_empty(nr, nc) {
                    self.mrv.update(&self.domains, nr, nc);
                }
            }
        }
        self.stats.record_backtrack();
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Tile, BORDER};

    #[test]
    fn commit_then_rollback_restores_domains() {
        let board = Board::empty(1, 2).unwrap();
        let tiles = TileSet::new(vec![
            Tile::new(1, [BORDER, 9, BORDER, BORDER]),
            Tile::new(2, [BORDER, BORDER, BORDER, 9]),
        ])
        .unwrap();
        let mut ctx = SolveContext::new(board, &tiles, SolverConfig::default());
        let before = ctx.domains.distinct_tile_count(0, 1);

        ctx.commit(0, 0, 1, 0);
        ctx.propagate_from(0, 0).unwrap();
        assert!(ctx.domains.distinct_tile_count(0, 1) <= before);

        ctx.rollback();
        assert_eq!(ctx.domains.distinct_tile_count(0, 1), before);
        assert!(ctx.board.is_empty(0, 0));
    }
}
