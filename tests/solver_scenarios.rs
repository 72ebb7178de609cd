//! Black-box scenarios exercising the solver purely through its public API:
//! a 2x2 monocolor board, rotation/symmetry-equivalent tiles, a forced
//! singleton chain, forward-check pruning without AC-3, concurrent
//! cancellation across workers, and resuming from an interrupted run.

use eternity_solver::{solve, solve_parallel, solve_with_history, solve_work_stealing};
use eternity_solver::{Board, Placement, SolverConfig, SortOrder};
use eternity_solver::{PlacementHistory, Tile, TileSet, BORDER};

fn corner_tile(id: usize, interior: u16) -> Tile {
    Tile::new(id, [BORDER, interior, interior, BORDER])
}

#[test]
fn solves_a_2x2_monocolor_board() {
    let interior = 5;
    let tiles = TileSet::new((1..=4).map(|id| corner_tile(id, interior)).collect()).unwrap();
    let board = Board::empty(2, 2).unwrap();

    let outcome = solve(board, &tiles, SolverConfig::default()).unwrap();

    assert!(outcome.solved);
    assert!(outcome.board.is_complete());
    // A solved 2x2 board has exactly four matched adjacent-edge pairs: two
    // horizontal seams and two vertical ones.
    assert_eq!(outcome.board.matched_edge_count(), 4);
}

#[test]
fn symmetry_breaking_pins_the_top_left_corner_to_rotation_zero() {
    // Every tile here is a rotation of the same shape, so without symmetry
    // breaking a solution could legally land at any of four rotations at
    // (0, 0). The solver must always settle on rotation 0 there.
    let tiles = TileSet::new((1..=4).map(|id| corner_tile(id, 7)).collect()).unwrap();
    let board = Board::empty(2, 2).unwrap();

    let outcome = solve(board, &tiles, SolverConfig::default()).unwrap();

    assert!(outcome.solved);
    let top_left = outcome.board.get(0, 0).unwrap();
    assert_eq!(top_left.rotation, 0);
}

#[test]
fn symmetry_breaking_orders_corner_tile_ids_against_the_top_left() {
    let tiles = TileSet::new((1..=4).map(|id| corner_tile(id, 7)).collect()).unwrap();
    let board = Board::empty(2, 2).unwrap();

    let outcome = solve(board, &tiles, SolverConfig::default()).unwrap();

    let top_left_id = outcome.board.get(0, 0).unwrap().tile_id;
    for (r, c) in [(0, 1), (1, 0), (1, 1)] {
        let placement = outcome.board.get(r, c).unwrap();
        assert!(placement.tile_id >= top_left_id, "corner at ({r},{c}) violates lex order");
    }
}

/// A 1x3 corridor with exactly one globally consistent chain: every domain
/// collapses to a single surviving `(tile, rotation)` pair before the search
/// ever needs to guess, so the singleton shortcut alone should carry the
/// whole solve with zero backtracks.
#[test]
fn forced_singleton_chain_solves_without_a_single_backtrack() {
    let tiles = TileSet::new(vec![
        Tile::new(1, [BORDER, 11, BORDER, BORDER]),
        Tile::new(2, [BORDER, 12, BORDER, 11]),
        Tile::new(3, [BORDER, BORDER, BORDER, 12]),
    ])
    .unwrap();
    let board = Board::empty(1, 3).unwrap();

    let mut config = SolverConfig::default();
    config.use_singletons = true;
    let outcome = solve(board, &tiles, config).unwrap();

    assert!(outcome.solved);
    assert_eq!(outcome.stats.backtracks, 0);
    assert_eq!(outcome.stats.placements, 3);
    assert_eq!(outcome.board.get(0, 0).unwrap().tile_id, 1);
    assert_eq!(outcome.board.get(0, 1).unwrap().tile_id, 2);
    assert_eq!(outcome.board.get(0, 2).unwrap().tile_id, 3);
}

/// With AC-3 disabled, domains are never re-revised mid-search, so nothing
/// but the per-candidate forward-check look-ahead stands between the driver
/// and a tile that leads nowhere. Tile 1 (tried first in ascending id order)
/// has no partner anywhere in the set; forward-check must reject it before
/// it is ever committed, so the solve still finishes with zero backtracks.
#[test]
fn forward_check_prunes_a_dead_branch_without_ac3() {
    let tiles = TileSet::new(vec![
        Tile::new(1, [BORDER, 99, BORDER, BORDER]),
        Tile::new(2, [BORDER, 13, BORDER, BORDER]),
        Tile::new(3, [BORDER, BORDER, BORDER, 13]),
    ])
    .unwrap();
    let board = Board::empty(1, 2).unwrap();

    let mut config = SolverConfig::default();
    config.use_ac3 = false;
    config.use_singletons = false;
    let outcome = solve(board, &tiles, config).unwrap();

    assert!(outcome.solved);
    assert_eq!(outcome.stats.backtracks, 0);
    assert_eq!(outcome.board.get(0, 0).unwrap().tile_id, 2);
    assert_eq!(outcome.board.get(0, 1).unwrap().tile_id, 3);
}

/// A puzzle too small to need real parallel speedup, but big enough that
/// independent workers (Mode A) started with opposite tile-enumeration
/// orders still race to the same unique answer; whichever gets there first
/// must claim the shared solution exactly once.
#[test]
fn independent_workers_agree_on_one_solution_and_one_winner() {
    let tiles = TileSet::new(vec![
        Tile::new(1, [BORDER, 21, BORDER, BORDER]),
        Tile::new(2, [BORDER, 22, BORDER, 21]),
        Tile::new(3, [BORDER, BORDER, BORDER, 22]),
    ])
    .unwrap();
    let board = Board::empty(1, 3).unwrap();

    let outcome = solve_parallel(board, &tiles, SolverConfig::default(), 4).unwrap();

    assert!(outcome.solved);
    assert!(outcome.board.is_complete());
    assert!(outcome.winning_thread.is_some());
    assert_eq!(outcome.stats.len(), 4);
}

#[test]
fn work_stealing_pool_solves_the_same_puzzle_as_independent_workers() {
    let tiles = TileSet::new(vec![
        Tile::new(1, [BORDER, 31, BORDER, BORDER]),
        Tile::new(2, [BORDER, 32, BORDER, 31]),
        Tile::new(3, [BORDER, BORDER, BORDER, 32]),
    ])
    .unwrap();
    let board = Board::empty(1, 3).unwrap();

    let outcome = solve_work_stealing(board, &tiles, SolverConfig::default(), 3).unwrap();

    assert!(outcome.solved);
    assert!(outcome.board.is_complete());
}

/// Interrupt a solve with a zero-millisecond time budget — the driver bails
/// before placing a single tile, so the history handed back carries no
/// search entries — then hand that history to `solve_with_history` with the
/// budget restored. With nothing to replay it must fall back to a fresh
/// solve and still reach a solution. The other half of resuming — a
/// *non-empty* history whose deepest entry was actually correct and must be
/// continued forward rather than discarded — is covered by
/// `resumes_by_continuing_forward_from_a_correct_saved_placement` below.
#[test]
fn resumes_a_solve_interrupted_by_a_time_limit() {
    let tiles = TileSet::new(vec![
        Tile::new(1, [BORDER, 41, BORDER, BORDER]),
        Tile::new(2, [BORDER, 42, BORDER, 41]),
        Tile::new(3, [BORDER, BORDER, BORDER, 42]),
    ])
    .unwrap();

    let mut interrupted_config = SolverConfig::default();
    interrupted_config.max_execution_time_ms = Some(0);
    let interrupted = solve(Board::empty(1, 3).unwrap(), &tiles, interrupted_config).unwrap();
    assert!(!interrupted.solved);

    let resumed = solve_with_history(
        Board::empty(1, 3).unwrap(),
        &tiles,
        SolverConfig::default(),
        interrupted.history,
    )
    .unwrap();

    assert!(resumed.solved);
    assert!(resumed.board.is_complete());
}

/// Resume from a hand-built history (not derived from a timed interruption,
/// per §8.6) covering only the first two cells of a four-cell forced chain,
/// where every cell admits exactly one legal tile. Discarding the deepest
/// saved entry and searching only its *other* rotations would find nothing
/// — there is no other rotation — so resuming correctly requires continuing
/// forward with that entry intact.
#[test]
fn resumes_by_continuing_forward_from_a_correct_saved_placement() {
    let tiles = TileSet::new(vec![
        Tile::new(1, [BORDER, 81, BORDER, BORDER]),
        Tile::new(2, [BORDER, 82, BORDER, 81]),
        Tile::new(3, [BORDER, 83, BORDER, 82]),
        Tile::new(4, [BORDER, BORDER, BORDER, 83]),
    ])
    .unwrap();

    let mut saved = PlacementHistory::new(&[]);
    saved.record(0, 0, Placement { tile_id: 1, rotation: 0, edges: [BORDER, 81, BORDER, BORDER] });
    saved.record(0, 1, Placement { tile_id: 2, rotation: 0, edges: [BORDER, 82, BORDER, 81] });

    let resumed = solve_with_history(Board::empty(1, 4).unwrap(), &tiles, SolverConfig::default(), saved).unwrap();

    assert!(resumed.solved);
    assert_eq!(resumed.board.get(0, 0).unwrap().tile_id, 1);
    assert_eq!(resumed.board.get(0, 1).unwrap().tile_id, 2);
    assert_eq!(resumed.board.get(0, 2).unwrap().tile_id, 3);
    assert_eq!(resumed.board.get(0, 3).unwrap().tile_id, 4);
}

/// A board seeded with one fixed cell must keep that placement untouched
/// through to the final solution (§3 invariant: fixed cells are permanent).
#[test]
fn fixed_placements_survive_a_full_solve() {
    let tiles = TileSet::new(vec![
        Tile::new(1, [BORDER, 51, BORDER, BORDER]),
        Tile::new(2, [BORDER, BORDER, BORDER, 51]),
    ])
    .unwrap();
    let fixed = Placement { tile_id: 1, rotation: 0, edges: [BORDER, 51, BORDER, BORDER] };
    let board = Board::with_fixed(1, 2, &tiles, &[(0, 0, fixed)]).unwrap();

    let outcome = solve(board, &tiles, SolverConfig::default()).unwrap();

    assert!(outcome.solved);
    assert_eq!(outcome.board.get(0, 0).unwrap().tile_id, 1);
    assert_eq!(outcome.board.get(0, 1).unwrap().tile_id, 2);
    assert_eq!(outcome.history.fixed_len(), 1);
}

/// An unsatisfiable two-tile puzzle (neither tile's free edge matches the
/// other's) must exhaust the search and report failure rather than hang or
/// silently "solve" with a mismatched seam.
#[test]
fn reports_failure_for_an_unsatisfiable_corridor() {
    let tiles = TileSet::new(vec![
        Tile::new(1, [BORDER, 61, BORDER, BORDER]),
        Tile::new(2, [BORDER, 62, BORDER, BORDER]),
    ])
    .unwrap();
    let board = Board::empty(1, 2).unwrap();

    let outcome = solve(board, &tiles, SolverConfig::default()).unwrap();

    assert!(!outcome.solved);
}

/// Descending tile-enumeration order (the alternative a parallel worker is
/// given, per §4.10) must still land on a correct, fully matched board.
#[test]
fn descending_sort_order_still_finds_a_correct_solution() {
    let tiles = TileSet::new((1..=4).map(|id| corner_tile(id, 9)).collect()).unwrap();
    let board = Board::empty(2, 2).unwrap();
    let mut config = SolverConfig::default();
    config.sort_order = SortOrder::Descending;

    let outcome = solve(board, &tiles, config).unwrap();

    assert!(outcome.solved);
    assert_eq!(outcome.board.matched_edge_count(), 4);
}

#[test]
fn placement_history_records_the_full_solved_chain() {
    let tiles = TileSet::new(vec![
        Tile::new(1, [BORDER, 71, BORDER, BORDER]),
        Tile::new(2, [BORDER, BORDER, BORDER, 71]),
    ])
    .unwrap();
    let board = Board::empty(1, 2).unwrap();

    let outcome = solve(board, &tiles, SolverConfig::default()).unwrap();

    assert!(outcome.solved);
    let history: &PlacementHistory = &outcome.history;
    assert_eq!(history.depth(), 2);
    assert_eq!(history.entries().len(), 2);
}
