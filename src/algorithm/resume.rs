use crate::algorithm::driver::{solve as fresh_solve, BacktrackingDriver, SolveOutcome};
use crate::board::Board;
use crate::config::SolverConfig;
use crate::context::SolveContext;
use crate::error::SolverError;
use crate::heuristics::order_by_lcv;
use crate::history::PlacementHistory;
use crate::symmetry::SymmetryBreaker;
use crate::tile::TileSet;
use crate::validator::PlacementValidator;

/// Resumes a search from a previously saved [`PlacementHistory`] (§4.9).
///
/// Step 2 of the resume contract replays every saved placement and runs the
/// driver once from that state *with the deepest entry still committed* —
/// if the crashed worker's last guess was correct, continuing forward from
/// it is what finds the solution. Only when that returns `false` does step
/// 3 pop the deepest entry and try the next untried alternative in that
/// cell's LCV ordering, the rotation-alternative replay the donor crate has
/// no equivalent of (it never resumed a run; see `WaveFunction`'s lack of
/// any saved-state constructor), built by analogy to a debugger's "step
/// over, then try the other branch".
pub struct HistoryResumer;

impl HistoryResumer {
    /// Replay `saved` onto `ctx`'s fresh state, run the driver once with the
    /// deepest entry intact, and only on failure back up into the first
    /// untried alternative at that cell.
    pub fn resume(ctx: &mut SolveContext<'_>, saved: &PlacementHistory) -> Result<bool, SolverError> {
        for entry in &saved.entries()[saved.fixed_len()..] {
            ctx.commit(entry.row, entry.col, entry.placement.tile_id, entry.placement.rotation);
            ctx.propagate_from(entry.row, entry.col)?;
        }

        let Some(tried) = ctx.history.last().copied() else {
            return BacktrackingDriver::run(ctx);
        };

        if BacktrackingDriver::run(ctx)? {
            return Ok(true);
        }
        ctx.rollback();

        let depth = ctx.history.depth();
        let ordered = order_by_lcv(&ctx.domains, &ctx.board, ctx.tiles, tried.row, tried.col, ctx.config.sort_order);
        let tried_index = ordered
            .iter()
            .position(|c| c.tile_id == tried.placement.tile_id && c.rotation == tried.placement.rotation);
        let remaining: Vec<_> = match tried_index {
            Some(i) => ordered.into_iter().skip(i + 1).collect(),
            None => ordered,
        };
        let remaining_count = remaining.len();

        for (index, candidate) in remaining.into_iter().enumerate() {
            if ctx.used.contains(candidate.tile_id - 1) {
                continue;
            }
            if !SymmetryBreaker::is_placement_allowed(&ctx.board, tried.row, tried.col, candidate.tile_id, candidate.rotation) {
                continue;
            }
            let edges = ctx.tiles.get(candidate.tile_id).rotated(candidate.rotation);
            ctx.stats.record_fit_check();
            if !PlacementValidator::fits(&ctx.board, tried.row, tried.col, edges) {
                continue;
            }
            if !PlacementValidator::forward_check(&ctx.board, ctx.tiles, tried.row, tried.col, edges, &ctx.used, candidate.tile_id) {
                ctx.stats.record_forward_check_reject();
                continue;
            }

            ctx.commit(tried.row, tried.col, candidate.tile_id, candidate.rotation);
            ctx.propagate_from(tried.row, tried.col)?;
            ctx.progress.observe(depth, index, remaining_count);
            ctx.progress_reporter.set_depth(ctx.history.depth() as u64);

            let dead_end = ctx.has_dead_end();
            if dead_end {
                ctx.stats.record_dead_end();
            }
            let solved = !dead_end && BacktrackingDriver::run(ctx)?;
            if solved {
                return Ok(true);
            }
            ctx.progress_reporter.set_message(format!("backtrack at depth {depth}"));
            ctx.rollback();
        }
        Ok(false)
    }
}

/// Resume a solve from `saved` history over `board`. Falls back to a fresh
/// [`fresh_solve`] when `saved` carries no placements past the fixed prefix.
/// The public entry point re-exported as [`crate::solve_with_history`].
pub fn solve_with_history(
    board: Board,
    tiles: &TileSet,
    config: SolverConfig,
    saved: PlacementHistory,
) -> Result<SolveOutcome, SolverError> {
    if saved.depth() == 0 {
        return fresh_solve(board, tiles, config);
    }
    let mut ctx = SolveContext::new(board, tiles, config);
    let solved = HistoryResumer::resume(&mut ctx, &saved)?;
    ctx.progress_reporter.finish();
    Ok(SolveOutcome { solved, board: ctx.board, history: ctx.history, stats: ctx.stats.snapshot() })
}
