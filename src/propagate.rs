use std::collections::VecDeque;

use fixedbitset::FixedBitSet;

use crate::board::Board;
use crate::domain::DomainManager;
use crate::error::SolverError;
use crate::tile::{TileSet, ALL_SIDES};

/// Hard cap on the number of cell revisions a single [`ConstraintPropagator::propagate`]
/// call may perform before it gives up and reports [`SolverError::Propagation`].
/// Every revision strictly shrinks some cell's domain or is never re-queued, so a
/// correct implementation terminates in `O(cells * num_tiles * 4)` revisions; this
/// cap is a generous multiple of that bound, guarding only against a latent bug
/// that reinserts a cell whose domain did not actually shrink.
pub const MAX_PROPAGATION_ITERATIONS: usize = 200_000;

/// Arc-consistency propagation over empty-cell domains (§4.3).
///
/// Unlike textbook AC-3, which revises one directed arc `(x, y)` at a time
/// against a binary constraint table, a cell's domain here is a function of
/// the whole board (border rule plus up to four placed neighbors), so each
/// queue entry revises one *cell* wholesale via [`DomainManager::revise`] and
/// re-queues that cell's empty neighbors only if its domain actually shrank.
/// This is the natural generalisation of the donor crate's domain-narrowing
/// loop in `WaveFunction::propagate` (`wave_function.rs`), which also worked
/// cell-by-cell off a `VecDeque` rather than arc-by-arc.
pub struct ConstraintPropagator;

impl ConstraintPropagator {
    /// Propagate the consequences of a change at `(r, c)` (a placement or a
    /// rollback) outward through the domain graph. Seeds the queue with
    /// `(r, c)`'s empty neighbors and drains it until stable or the
    /// iteration cap is hit.
    pub fn propagate(
        domains: &mut DomainManager,
        board: &Board,
        tiles: &TileSet,
        used: &FixedBitSet,
        r: usize,
        c: usize,
    ) -> Result<(), SolverError> {
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
        let mut queued = std::collections::HashSet::new();

        for side in ALL_SIDES {
            if let Some((nr, nc)) = board.neighbor(r, c, side) {
                if board.is_empty(nr, nc) && queued.insert((nr, nc)) {
                    queue.push_back((nr, nc));
                }
            }
        }

        let mut iterations = 0usize;
        while let Some((cr, cc)) = queue.pop_front() {
            queued.remove(&(cr, cc));
            iterations += 1;
            if iterations > MAX_PROPAGATION_ITERATIONS {
                return Err(SolverError::Propagation { row: cr, col: cc });
            }

            if !board.is_empty(cr, cc) {
                continue;
            }
            if !domains.revise(board, tiles, used, cr, cc) {
                continue;
            }

            for side in ALL_SIDES {
                if let Some((nr, nc)) = board.neighbor(cr, cc, side) {
                    if board.is_empty(nr, nc) && queued.insert((nr, nc)) {
                        queue.push_back((nr, nc));
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether propagation has left any empty cell with no surviving
    /// `(tile, rotation)` pair — the driver's signal to abandon the current
    /// branch and backtrack (§4.3, §4.8 step 6).
    #[must_use]
    pub fn would_cause_dead_end(domains: &DomainManager, board: &Board) -> bool {
        let (rows, cols) = board.size();
        for r in 0..rows {
            for c in 0..cols {
                if board.is_empty(r, c) && domains.pair_count(r, c) == 0 {
                    return true;
                }
            }
        }
        false
    }
}
