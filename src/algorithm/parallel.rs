//! Cross-worker coordination (§4.10, C11): independent workers sharing only
//! a handful of atomics and a mutex-guarded best-board snapshot (Mode A), and
//! a work-stealing fork/join pool below a shallow depth threshold (Mode B).
//!
//! The donor crate never spawns a thread itself — `WaveFunction::collapse`
//! runs to completion on the caller's thread. `std::thread::scope` is used
//! here rather than `Arc`-wrapping everything, the closest idiom to the
//! donor's own preference for borrowing shared read-only state (`&Rules`)
//! over cloning it; see `Map::collapse(&self, rules: &Rules, ...)`. Mode B's
//! shared queue is a plain `Mutex<VecDeque<Task>>` plus `Condvar`, the
//! standard-library equivalent of the crossbeam work-stealing queue sketched
//! in the retrieval pack's shogi search thread pool — consulted for the
//! *shape* only, since this crate carries no concurrency dependency beyond
//! `std`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use fixedbitset::FixedBitSet;

use crate::algorithm::driver::{BacktrackingDriver, CellChoice, SolveOutcome};
use crate::board::Board;
use crate::config::{SolverConfig, SortOrder};
use crate::context::SolveContext;
use crate::error::SolverError;
use crate::history::PlacementHistory;
use crate::stats::StatisticsSnapshot;
use crate::symmetry::SymmetryBreaker;
use crate::tile::TileSet;
use crate::validator::PlacementValidator;

/// Cross-thread coordination state for Mode A and Mode B (§4.10, §5): one
/// atomic "solution found" flag, atomic depth/score records plus the id of
/// the worker that set them, and a mutex-guarded best-board snapshot copied
/// in whenever a worker sets a new record. No process-wide statics — this
/// struct is constructed once per `solve_parallel` call and passed to every
/// worker by shared reference, per §9's design note on global mutable state.
#[derive(Debug)]
pub struct SharedSearchState {
    solution_found: AtomicBool,
    global_best_depth: AtomicUsize,
    global_best_score: AtomicUsize,
    global_best_thread: AtomicIsize,
    best_board: Mutex<Option<Board>>,
    winner: Mutex<Option<(usize, Board)>>,
}

impl SharedSearchState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            solution_found: AtomicBool::new(false),
            global_best_depth: AtomicUsize::new(0),
            global_best_score: AtomicUsize::new(0),
            global_best_thread: AtomicIsize::new(-1),
            best_board: Mutex::new(None),
            winner: Mutex::new(None),
        }
    }

    /// Sequentially-consistent load, cheap enough to check at the top of
    /// every recursion and inside every inner candidate loop (§5).
    #[must_use]
    pub fn solution_found(&self) -> bool {
        self.solution_found.load(Ordering::SeqCst)
    }

    /// Called by the worker whose board just completed. Returns `true` iff
    /// this call is the one that actually claimed the win (first writer);
    /// a `false` means another worker already finished first, and the
    /// caller's own board — though complete — is not the one the
    /// coordinator should surface.
    pub fn claim_solution(&self, thread_id: usize, board: &Board) -> bool {
        if self
            .solution_found
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        *self.winner.lock().expect("winner mutex poisoned") = Some((thread_id, board.clone()));
        true
    }

    /// The winning worker's id and final board, once `solution_found` is set.
    #[must_use]
    pub fn winner(&self) -> Option<(usize, Board)> {
        self.winner.lock().expect("winner mutex poisoned").clone()
    }

    /// CAS `depth` into the global depth record; acquire-release per §5.
    /// Returns `true` iff this call set a new record.
    pub fn record_depth(&self, thread_id: usize, depth: usize) -> bool {
        let mut current = self.global_best_depth.load(Ordering::Acquire);
        while depth > current {
            match self.global_best_depth.compare_exchange_weak(
                current,
                depth,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.global_best_thread.store(thread_id as isize, Ordering::Release);
                    return true;
                }
                Err(observed) => current = observed,
            }
        }
        false
    }

    /// CAS `score` into the global score record, same contract as
    /// [`SharedSearchState::record_depth`].
    pub fn record_score(&self, thread_id: usize, score: usize) -> bool {
        let mut current = self.global_best_score.load(Ordering::Acquire);
        while score > current {
            match self.global_best_score.compare_exchange_weak(
                current,
                score,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.global_best_thread.store(thread_id as isize, Ordering::Release);
                    return true;
                }
                Err(observed) => current = observed,
            }
        }
        false
    }

    /// Replace the global best-board snapshot under the mutex, copying every
    /// placed cell so observers never see a torn board (§4.10 invariant).
    pub fn publish_best(&self, board: &Board) {
        *self.best_board.lock().expect("best-board mutex poisoned") = Some(board.clone());
    }

    /// The best-so-far board snapshot, if any worker has published one yet.
    #[must_use]
    pub fn best_board(&self) -> Option<Board> {
        self.best_board.lock().expect("best-board mutex poisoned").clone()
    }

    #[must_use]
    pub fn global_best_depth(&self) -> usize {
        self.global_best_depth.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn global_best_score(&self) -> usize {
        self.global_best_score.load(Ordering::Acquire)
    }
}

impl Default for SharedSearchState {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of [`solve_parallel`]: whether any worker solved the puzzle,
/// the board to use (the winner's, if solved), which worker solved it, and
/// every worker's final statistics snapshot for diagnostics.
#[derive(Debug, Clone)]
pub struct ParallelOutcome {
    pub solved: bool,
    pub board: Board,
    pub winning_thread: Option<usize>,
    pub stats: Vec<StatisticsSnapshot>,
}

/// Mode A (§4.10): `num_threads` independent workers, each searching from
/// its own clone of `board` with a distinct `thread_id`/`random_seed`/
/// `sort_order`, sharing only a [`SharedSearchState`]. The first worker to
/// complete its board claims the win; every other worker observes
/// `solution_found` at its next recursion or candidate check and bails.
///
/// Workers `0..4` (or fewer, if `num_threads` or the corner's candidate
/// count is smaller) are diversified: each is seeded with a distinct corner
/// tile pre-placed at `(0, 0)` before it starts searching, so their first
/// branches are disjoint rather than racing down the same opening moves.
pub fn solve_parallel(
    board: Board,
    tiles: &TileSet,
    config: SolverConfig,
    num_threads: usize,
) -> Result<ParallelOutcome, SolverError> {
    let num_threads = num_threads.max(1);
    let shared = Arc::new(SharedSearchState::new());
    let mut per_worker_outcomes: Vec<Option<SolveOutcome>> = Vec::new();
    let mut error: Option<SolverError> = None;

    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(num_threads);
        for worker_id in 0..num_threads {
            let mut worker_config = config.clone();
            worker_config.thread_id = worker_id;
            worker_config.thread_label = format!("worker-{worker_id}");
            worker_config.random_seed = config.random_seed.wrapping_add(worker_id as u64);
            worker_config.sort_order = if worker_id % 2 == 0 { SortOrder::Ascending } else { SortOrder::Descending };

            let worker_board = board.clone();
            let shared = Arc::clone(&shared);
            handles.push(scope.spawn(move || run_worker(worker_board, tiles, worker_config, worker_id, &shared)));
        }
        for handle in handles {
            match handle.join().expect("worker thread panicked") {
                Ok(outcome) => per_worker_outcomes.push(Some(outcome)),
                Err(err) => {
                    per_worker_outcomes.push(None);
                    error.get_or_insert(err);
                }
            }
        }
    });

    if let Some(err) = error {
        return Err(err);
    }

    let stats: Vec<StatisticsSnapshot> =
        per_worker_outcomes.iter().flatten().map(|outcome| outcome.stats).collect();

    if let Some((winning_thread, winning_board)) = shared.winner() {
        return Ok(ParallelOutcome { solved: true, board: winning_board, winning_thread: Some(winning_thread), stats });
    }

    let fallback_board = shared.best_board().unwrap_or(board);
    Ok(ParallelOutcome { solved: false, board: fallback_board, winning_thread: None, stats })
}

fn run_worker(
    mut board: Board,
    tiles: &TileSet,
    config: SolverConfig,
    worker_id: usize,
    shared: &Arc<SharedSearchState>,
) -> Result<SolveOutcome, SolverError> {
    if worker_id < 4 {
        apply_diversification(&mut board, tiles, worker_id);
    }

    let mut ctx = SolveContext::new(board, tiles, config).with_shared(Arc::clone(shared));
    let solved = BacktrackingDriver::run(&mut ctx)?;
    ctx.progress_reporter.finish();
    Ok(SolveOutcome { solved, board: ctx.board, history: ctx.history, stats: ctx.stats.snapshot() })
}

/// Pre-place the `worker_id`-th legal corner tile at `(0, 0)` (rotation 0,
/// per the symmetry breaker) so this worker's opening branch differs from
/// its siblings'. A no-op if `(0, 0)` is already fixed, or fewer than
/// `worker_id + 1` legal corner candidates exist.
fn apply_diversification(board: &mut Board, tiles: &TileSet, worker_id: usize) {
    if board.is_fixed(0, 0) || !board.is_empty(0, 0) {
        return;
    }
    let used = FixedBitSet::with_capacity(tiles.len());
    let mut candidates: Vec<(usize, [crate::tile::Color; 4])> = Vec::new();
    for tile in tiles.iter() {
        let edges = tile.rotated(0);
        if used.contains(tile.id() - 1) {
            continue;
        }
        if PlacementValidator::fits(board, 0, 0, edges) {
            candidates.push((tile.id(), edges));
        }
    }
    if let Some(&(tile_id, edges)) = candidates.get(worker_id) {
        board.place(0, 0, crate::board::Placement { tile_id, rotation: 0, edges });
    }
}

/// Minimum recursion depth below which Mode B still forks subtasks instead
/// of falling back to the sequential driver (§4.10).
const FORK_DEPTH_THRESHOLD: usize = 5;

/// One unit of work for the Mode B pool: a self-contained partial state a
/// worker can rebuild a [`SolveContext`] from without touching any other
/// task's data. Domains and the MRV index are rebuilt from `board`/`used`
/// rather than carried along, exactly matching the spec's "each on a deep
/// copy of the board and used-set" — cheaper to move between threads than
/// cloning the AC-3 domain arrays, at the cost of recomputing them once per
/// task.
struct Task {
    board: Board,
    used: FixedBitSet,
    history: PlacementHistory,
}

/// The shared pool backing Mode B: a plain queue behind a mutex, a condvar
/// to park idle workers, and a pending-task counter used for termination
/// detection (a task is "pending" from the moment it is queued until the
/// worker that drains it has finished — including having queued any
/// children it forked, which are themselves pending). Once `pending` drops
/// to zero with the queue empty, every worker is done.
struct WorkQueue {
    tasks: Mutex<VecDeque<Task>>,
    ready: Condvar,
    pending: AtomicUsize,
}

impl WorkQueue {
    fn new(initial: Task) -> Self {
        let mut deque = VecDeque::new();
        deque.push_back(initial);
        Self { tasks: Mutex::new(deque), ready: Condvar::new(), pending: AtomicUsize::new(1) }
    }

    fn push(&self, task: Task) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.tasks.lock().expect("task queue poisoned").push_back(task);
        self.ready.notify_one();
    }

    /// Mark one task as fully processed (including any children it queued).
    /// Wakes every parked worker so they can re-check the shutdown
    /// condition, since this may be the call that brings `pending` to zero.
    fn complete_one(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        self.ready.notify_all();
    }

    /// Block until a task is available or the pool has drained, whichever
    /// comes first.
    fn pop(&self, solution_found: &AtomicBool) -> Option<Task> {
        let mut guard = self.tasks.lock().expect("task queue poisoned");
        loop {
            if let Some(task) = guard.pop_front() {
                return Some(task);
            }
            if self.pending.load(Ordering::SeqCst) == 0 || solution_found.load(Ordering::SeqCst) {
                return None;
            }
            let (next_guard, _timeout) =
                self.ready.wait_timeout(guard, std::time::Duration::from_millis(50)).expect("task queue poisoned");
            guard = next_guard;
        }
    }
}

/// Mode B (§4.10): one logical search fanned out as a work-stealing pool.
/// Below [`FORK_DEPTH_THRESHOLD`], every call enumerates all legal
/// placements at the chosen cell and submits one subtask per candidate to a
/// shared queue drained by `num_threads` pool workers; at or past the
/// threshold a subtask runs out to completion on the sequential
/// [`BacktrackingDriver`]. `solution_found` cuts further fan-out the moment
/// any worker completes a board.
pub fn solve_work_stealing(
    board: Board,
    tiles: &TileSet,
    config: SolverConfig,
    num_threads: usize,
) -> Result<ParallelOutcome, SolverError> {
    let num_threads = num_threads.max(1);
    let shared = Arc::new(SharedSearchState::new());

    let (rows, cols) = board.size();
    let mut used = FixedBitSet::with_capacity(tiles.len());
    for r in 0..rows {
        for c in 0..cols {
            if let Some(placement) = board.get(r, c) {
                used.insert(placement.tile_id - 1);
            }
        }
    }
    let history = PlacementHistory::new(&board.fixed_entries());
    let queue = Arc::new(WorkQueue::new(Task { board, used, history }));

    let mut error: Option<SolverError> = None;
    let mut worker_stats = Vec::new();

    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(num_threads);
        for worker_id in 0..num_threads {
            let mut worker_config = config.clone();
            worker_config.thread_id = worker_id;
            worker_config.thread_label = format!("fork-worker-{worker_id}");
            let queue = Arc::clone(&queue);
            let shared = Arc::clone(&shared);
            handles.push(scope.spawn(move || run_fork_worker(tiles, worker_config, worker_id, &queue, &shared)));
        }
        for handle in handles {
            match handle.join().expect("fork worker thread panicked") {
                Ok(stats) => worker_stats.push(stats),
                Err(err) => {
                    error.get_or_insert(err);
                }
            }
        }
    });

    if let Some(err) = error {
        return Err(err);
    }

    if let Some((winning_thread, winning_board)) = shared.winner() {
        return Ok(ParallelOutcome {
            solved: true,
            board: winning_board,
            winning_thread: Some(winning_thread),
            stats: worker_stats,
        });
    }

    let fallback_board =
        shared.best_board().unwrap_or_else(|| Board::empty(rows, cols).expect("nonzero dims already validated"));
    Ok(ParallelOutcome { solved: false, board: fallback_board, winning_thread: None, stats: worker_stats })
}

/// Drains the shared queue until it is exhausted or a solution is found
/// anywhere, accumulating the statistics of every terminal (sequentially
/// driven) subtask this worker happened to pick up. A worker does not stop
/// after its first terminal task — the pool keeps it pulling from the
/// shared queue until there is genuinely nothing left to do.
fn run_fork_worker(
    tiles: &TileSet,
    config: SolverConfig,
    worker_id: usize,
    queue: &Arc<WorkQueue>,
    shared: &Arc<SharedSearchState>,
) -> Result<StatisticsSnapshot, SolverError> {
    let mut accumulated = StatisticsSnapshot {
        recursive_calls: 0,
        placements: 0,
        backtracks: 0,
        dead_ends: 0,
        fit_checks: 0,
        forward_check_rejects: 0,
        singletons_found: 0,
        singletons_placed: 0,
        best_depth: 0,
        best_score: 0,
        elapsed: std::time::Duration::ZERO,
    };

    loop {
        if shared.solution_found() {
            return Ok(accumulated);
        }
        let Some(task) = queue.pop(&shared.solution_found) else {
            return Ok(accumulated);
        };
        let result = process_task(task, tiles, &config, worker_id, queue, shared);
        queue.complete_one();
        match result {
            Ok(Some(stats)) => {
                accumulated.recursive_calls += stats.recursive_calls;
                accumulated.placements += stats.placements;
                accumulated.backtracks += stats.backtracks;
                accumulated.dead_ends += stats.dead_ends;
                accumulated.fit_checks += stats.fit_checks;
                accumulated.forward_check_rejects += stats.forward_check_rejects;
                accumulated.singletons_found += stats.singletons_found;
                accumulated.singletons_placed += stats.singletons_placed;
                accumulated.best_depth = accumulated.best_depth.max(stats.best_depth);
                accumulated.best_score = accumulated.best_score.max(stats.best_score);
                accumulated.elapsed = accumulated.elapsed.max(stats.elapsed);
            }
            Ok(None) => {}
            Err(err) => return Err(err),
        }
    }
}

/// Drive one [`Task`]: either fork it into subtasks (below the depth
/// threshold) or run it to completion sequentially. Returns `Some(stats)`
/// only when this task ran the sequential driver to completion (success or
/// exhaustion); forked tasks return `None` since their children carry the
/// real outcome.
fn process_task(
    task: Task,
    tiles: &TileSet,
    config: &SolverConfig,
    worker_id: usize,
    queue: &Arc<WorkQueue>,
    shared: &Arc<SharedSearchState>,
) -> Result<Option<StatisticsSnapshot>, SolverError> {
    let depth = task.history.depth();

    let run_sequentially = |board: Board, history: PlacementHistory| -> Result<StatisticsSnapshot, SolverError> {
        let mut worker_config = config.clone();
        worker_config.thread_id = worker_id;
        let mut ctx = SolveContext::new(board, tiles, worker_config).with_shared(Arc::clone(shared));
        ctx.history = history;
        BacktrackingDriver::run(&mut ctx)?;
        ctx.progress_reporter.finish();
        Ok(ctx.stats.snapshot())
    };

    if depth >= FORK_DEPTH_THRESHOLD || task.board.is_complete() {
        return Ok(Some(run_sequentially(task.board, task.history)?));
    }

    let mut scratch_config = config.clone();
    scratch_config.thread_id = worker_id;
    let mut ctx = SolveContext::new(task.board.clone(), tiles, scratch_config);

    let (r, c, forced) = match BacktrackingDriver::choose_cell(&mut ctx) {
        CellChoice::Cell(r, c, forced) => (r, c, forced),
        // No selectable cell: the board is already complete (the common
        // case), a singleton scan found a tile with nowhere to go, or (per
        // §7) an invariant violation; either way the sequential driver's own
        // checks are the right place to resolve it.
        CellChoice::DeadEnd | CellChoice::None => {
            return Ok(Some(run_sequentially(task.board, task.history)?));
        }
    };

    let candidates = match forced {
        Some(singleton) => vec![singleton],
        None => crate::heuristics::order_by_lcv(&ctx.domains, &ctx.board, tiles, r, c, config.sort_order),
    };
    for candidate in candidates {
        if shared.solution_found() {
            break;
        }
        if ctx.used.contains(candidate.tile_id - 1) {
            continue;
        }
        if !SymmetryBreaker::is_placement_allowed(&ctx.board, r, c, candidate.tile_id, candidate.rotation) {
            continue;
        }
        let edges = tiles.get(candidate.tile_id).rotated(candidate.rotation);
        if !PlacementValidator::fits(&ctx.board, r, c, edges) {
            continue;
        }
        if !PlacementValidator::forward_check(&ctx.board, tiles, r, c, edges, &ctx.used, candidate.tile_id) {
            continue;
        }

        let mut child_board = task.board.clone();
        child_board.place(r, c, crate::board::Placement { tile_id: candidate.tile_id, rotation: candidate.rotation, edges });
        let mut child_used = task.used.clone();
        child_used.insert(candidate.tile_id - 1);
        let mut child_history = task.history.clone();
        child_history.record(r, c, crate::board::Placement { tile_id: candidate.tile_id, rotation: candidate.rotation, edges });

        if would_dead_end(&child_board, tiles, &child_used) {
            continue;
        }

        queue.push(Task { board: child_board, used: child_used, history: child_history });
    }

    Ok(None)
}

/// A cheap post-placement dead-end check for forked subtasks: rebuild
/// domains from scratch and look for any empty cell with none left. Forked
/// tasks don't carry an incremental [`crate::domain::DomainManager`] forward
/// (see [`Task`]'s doc comment), so this trades a little redundant work for
/// not having to serialize AC-3 state between threads.
fn would_dead_end(board: &Board, tiles: &TileSet, used: &FixedBitSet) -> bool {
    let (rows, cols) = board.size();
    let mut domains = crate::domain::DomainManager::new(rows, cols, tiles.len());
    domains.initialize(board, tiles, used);
    crate::propagate::ConstraintPropagator::would_cause_dead_end(&domains, board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Tile, BORDER};

    fn two_tile_corridor() -> (Board, TileSet) {
        let tiles = TileSet::new(vec![
            Tile::new(1, [BORDER, 7, BORDER, BORDER]),
            Tile::new(2, [BORDER, BORDER, BORDER, 7]),
        ])
        .unwrap();
        let board = Board::empty(1, 2).unwrap();
        (board, tiles)
    }

    #[test]
    fn shared_state_solution_found_is_first_writer_wins() {
        let shared = SharedSearchState::new();
        let board = Board::empty(1, 1).unwrap();
        assert!(shared.claim_solution(0, &board));
        assert!(!shared.claim_solution(1, &board));
        assert_eq!(shared.winner().unwrap().0, 0);
    }

    #[test]
    fn depth_record_is_monotonic_across_simulated_workers() {
        let shared = SharedSearchState::new();
        assert!(shared.record_depth(0, 4));
        assert!(!shared.record_depth(1, 3));
        assert!(shared.record_depth(1, 10));
        assert_eq!(shared.global_best_depth(), 10);
    }

    #[test]
    fn independent_workers_agree_on_one_solution() {
        let (board, tiles) = two_tile_corridor();
        let outcome = solve_parallel(board, &tiles, SolverConfig::default(), 4).unwrap();
        assert!(outcome.solved);
        assert!(outcome.board.is_complete());
    }

    #[test]
    fn work_stealing_pool_solves_the_same_puzzle() {
        let (board, tiles) = two_tile_corridor();
        let outcome = solve_work_stealing(board, &tiles, SolverConfig::default(), 3).unwrap();
        assert!(outcome.solved);
        assert!(outcome.board.is_complete());
    }

    #[test]
    fn diversification_leaves_a_board_with_no_other_tile_placed() {
        let (_, tiles) = two_tile_corridor();
        let mut board = Board::empty(1, 2).unwrap();
        apply_diversification(&mut board, &tiles, 0);
        assert_eq!(board.get(0, 0).map(|p| p.tile_id), Some(1));
        assert!(board.is_empty(0, 1));
    }
}
