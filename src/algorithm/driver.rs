use std::time::Duration;

use crate::board::Board;
use crate::config::SolverConfig;
use crate::context::SolveContext;
use crate::error::SolverError;
use crate::heuristics::{order_by_lcv, ScoredCandidate};
use crate::history::PlacementHistory;
use crate::singleton::{SingletonDetector, SingletonOutcome};
use crate::stats::StatisticsSnapshot;
use crate::symmetry::SymmetryBreaker;
use crate::tile::TileSet;
use crate::validator::PlacementValidator;

/// Minimum search depth a depth/score record must reach before the save
/// collaborator is asked to persist it (§4.8 step 3) — shallow records
/// churn too fast near the root to be worth writing to disk.
const RECORD_SAVE_MIN_DEPTH: usize = 10;

/// The result of a finished (or time-boxed) solve.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Whether a complete, fully-matched board was found.
    pub solved: bool,
    /// The board as it stood when the search stopped — complete if `solved`,
    /// otherwise the deepest branch explored before giving up or the wall
    /// clock ran out.
    pub board: Board,
    /// Every placement made, fixed prefix included.
    pub history: PlacementHistory,
    /// Counters captured the instant the search stopped.
    pub stats: StatisticsSnapshot,
}

/// The outcome of [`BacktrackingDriver::choose_cell`]: either a cell to fill
/// (with an optional forced singleton candidate), a dead-end signaled by
/// [`crate::singleton::SingletonOutcome::DeadEnd`], or nothing left to pick
/// because the board is already complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CellChoice {
    Cell(usize, usize, Option<ScoredCandidate>),
    DeadEnd,
    None,
}

/// Recursive depth-first backtracking search with MRV cell selection, LCV
/// value ordering, a singleton shortcut, AC-3 propagation, and symmetry
/// pruning (§4.8). Implemented as native recursion rather than an explicit
/// stack: the donor crate's `algorithm/backtracking.rs` also recursed
/// directly, and board sizes in this domain (bounded by the puzzle's
/// tile count) never approach a depth that would risk overflowing the
/// call stack.
pub struct BacktrackingDriver;

impl BacktrackingDriver {
    /// Drive `ctx` to completion or exhaustion. Returns `Ok(true)` iff a
    /// complete board was found; `Ok(false)` means the tree below `ctx`'s
    /// current position was exhausted (or the time budget elapsed) with no
    /// solution. Errors only escape via [`crate::propagate`]'s iteration
    /// cap — a sign that something upstream produced a malformed domain,
    /// not a normal "no solution" outcome.
    pub fn run(ctx: &mut SolveContext<'_>) -> Result<bool, SolverError> {
        Self::step(ctx)
    }

    fn step(ctx: &mut SolveContext<'_>) -> Result<bool, SolverError> {
        ctx.stats.record_recursive_call();
        ctx.maybe_save_thread_state();
        if ctx.board.is_complete() {
            if let Some(shared) = &ctx.shared {
                shared.claim_solution(ctx.config.thread_id, &ctx.board);
            }
            return Ok(true);
        }
        // Cheap atomic load, checked at the top of every recursion per §5:
        // another worker may have already solved the puzzle.
        if let Some(shared) = &ctx.shared {
            if shared.solution_found() {
                return Ok(false);
            }
        }
        if let Some(limit_ms) = ctx.config.max_execution_time_ms {
            if ctx.stats.elapsed() >= Duration::from_millis(limit_ms) {
                return Ok(false);
            }
        }

        let depth = ctx.history.depth();

        let (r, c, forced) = match Self::choose_cell(ctx) {
            CellChoice::Cell(r, c, forced) => (r, c, forced),
            CellChoice::DeadEnd => {
                ctx.stats.record_dead_end();
                return Ok(false);
            }
            CellChoice::None => {
                debug_assert!(false, "no selectable cell but board is incomplete");
                return Ok(false);
            }
        };

        let is_singleton = forced.is_some();
        if is_singleton {
            ctx.stats.record_singleton_found();
        }
        let candidates: Vec<ScoredCandidate> = match forced {
            Some(single) => vec![single],
            None => order_by_lcv(&ctx.domains, &ctx.board, ctx.tiles, r, c, ctx.config.sort_order),
        };
        let candidate_count = candidates.len();

        for (index, candidate) in candidates.into_iter().enumerate() {
            if let Some(shared) = &ctx.shared {
                if shared.solution_found() {
                    break;
                }
            }
            // Domains only get re-revised through AC-3 (§4.3); with it
            // disabled a cell's surviving bits can still name a tile another
            // cell has since claimed, so every candidate is re-checked
            // against `used` here regardless of which propagation mode is on.
            if ctx.used.contains(candidate.tile_id - 1) {
                continue;
            }
            if !SymmetryBreaker::is_placement_allowed(&ctx.board, r, c, candidate.tile_id, candidate.rotation) {
                continue;
            }
            let edges = ctx.tiles.get(candidate.tile_id).rotated(candidate.rotation);
            ctx.stats.record_fit_check();
            if !PlacementValidator::fits(&ctx.board, r, c, edges) {
                continue;
            }
            if !PlacementValidator::forward_check(&ctx.board, ctx.tiles, r, c, edges, &ctx.used, candidate.tile_id) {
                ctx.stats.record_forward_check_reject();
                continue;
            }

            ctx.commit(r, c, candidate.tile_id, candidate.rotation);
            if is_singleton {
                ctx.stats.record_singleton_placed();
            }
            ctx.propagate_from(r, c)?;
            ctx.progress.observe(depth, index, candidate_count);
            ctx.progress_reporter.set_depth(ctx.history.depth() as u64);

            let dead_end = ctx.has_dead_end();
            if dead_end {
                ctx.stats.record_dead_end();
            } else {
                Self::report_records(ctx);
            }

            let solved = !dead_end && Self::step(ctx)?;
            if solved {
                return Ok(true);
            }

            ctx.progress_reporter.set_message(format!("backtrack at depth {depth}"));
            ctx.rollback();
        }

        ctx.progress.truncate(depth);
        Ok(false)
    }

    /// Prefer a forced singleton placement over MRV selection, when enabled
    /// (§4.4, §4.8 step 7): a free tile with zero legal cells anywhere is a
    /// dead-end regardless of what MRV would otherwise pick; a free tile
    /// forced to exactly one cell is committed there ahead of MRV's choice.
    ///
    /// `pub(crate)` so [`crate::algorithm::parallel`]'s Mode B fork logic can
    /// reuse the exact same cell-choice contract the sequential driver uses,
    /// rather than duplicating it.
    pub(crate) fn choose_cell(ctx: &mut SolveContext<'_>) -> CellChoice {
        if ctx.config.use_singletons {
            match SingletonDetector::scan(&ctx.domains, &ctx.board, ctx.tiles, &ctx.used) {
                SingletonOutcome::DeadEnd { .. } => return CellChoice::DeadEnd,
                SingletonOutcome::Forced(singleton) => {
                    return CellChoice::Cell(
                        singleton.row,
                        singleton.col,
                        Some(ScoredCandidate { tile_id: singleton.tile_id, rotation: singleton.rotation, score: 0 }),
                    );
                }
                SingletonOutcome::None => {}
            }
        }
        match ctx.mrv.select(&ctx.domains, &ctx.board, ctx.config.prioritize_borders) {
            Some((r, c)) => CellChoice::Cell(r, c, None),
            None => CellChoice::None,
        }
    }

    fn report_records(ctx: &mut SolveContext<'_>) {
        let depth = ctx.history.depth();
        let is_depth_record = ctx.stats.update_depth_record(depth);
        let score = ctx.board.matched_edge_count();
        let is_score_record = ctx.stats.update_score_record(score);

        // Cross-worker records (§4.11): on a new local best, also try the
        // global CAS and, if this call actually wins it, publish a deep
        // copy of the board under the shared mutex.
        if let Some(shared) = &ctx.shared {
            let won_depth = is_depth_record && shared.record_depth(ctx.config.thread_id, depth);
            let won_score = is_score_record && shared.record_score(ctx.config.thread_id, score);
            if won_depth || won_score {
                shared.publish_best(&ctx.board);
            }
        }

        // A record deep enough to be worth keeping is handed to the save
        // collaborator regardless of verbosity (§4.8 step 3) — narration
        // below is separate and gated on `verbose`.
        if (is_depth_record || is_score_record) && depth >= RECORD_SAVE_MIN_DEPTH {
            let label = format!("{}-{}-record", ctx.config.thread_label, ctx.config.thread_id);
            if let Err(err) = ctx.save_provider.save(&label, &ctx.board) {
                ctx.logger.log(depth, &format!("record save failed: {err}"));
            }
        }

        if !ctx.config.verbose || depth < ctx.config.min_depth_to_show_records {
            return;
        }
        if is_depth_record {
            ctx.logger.log(depth, &format!("new depth record: {depth}"));
        }
        if is_score_record {
            ctx.logger.log(depth, &format!("new score record: {score}"));
        }
        if is_depth_record || is_score_record {
            ctx.visualizer.render(&ctx.board);
        }
    }
}

/// Run a solve from scratch over `board`, returning the outcome. The
/// public entry point re-exported as [`crate::solve`].
pub fn solve(board: Board, tiles: &TileSet, config: SolverConfig) -> Result<SolveOutcome, SolverError> {
    let mut ctx = SolveContext::new(board, tiles, config);
    let solved = BacktrackingDriver::run(&mut ctx)?;
    ctx.progress_reporter.finish();
    Ok(SolveOutcome { solved, board: ctx.board, history: ctx.history, stats: ctx.stats.snapshot() })
}
