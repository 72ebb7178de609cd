use fixedbitset::FixedBitSet;

use crate::board::Board;
use crate::tile::{Color, TileSet, ALL_SIDES, BORDER};

/// "Does tile fit at (r,c)?", including the border rule and a one-step
/// forward-check look-ahead (§4.1). All functions here are pure boolean
/// queries with no side effects on `board`.
pub struct PlacementValidator;

impl PlacementValidator {
    /// Whether `edges` would be a legal placement at `(r, c)` against the
    /// board as it currently stands. Delegates to [`Board::fits`], which
    /// already implements the border-rule/adjacency check (§3 invariants
    /// 2–3); kept as a named entry point here so the driver and AC-3 both
    /// go through one call site per the spec's component boundary.
    #[must_use]
    pub fn fits(board: &Board, r: usize, c: usize, edges: [Color; 4]) -> bool {
        board.fits(r, c, edges)
    }

    /// Optimistic one-step look-ahead: hypothetically place `edges` at
    /// `(r, c)` and check that every empty direct neighbor still has at
    /// least one legal `(tile, rotation)` pair available from the
    /// remaining pool (excluding `exclude_id`, the tile being placed, and
    /// anything already in `used`). Cheaper than full AC-3 because it only
    /// asks "does *a* value exist", not "filter the whole domain".
    #[must_use]
    pub fn forward_check(
        board: &Board,
        tiles: &TileSet,
        r: usize,
        c: usize,
        edges: [Color; 4],
        used: &FixedBitSet,
        exclude_id: usize,
    ) -> bool {
        for side in ALL_SIDES {
            let Some((nr, nc)) = board.neighbor(r, c, side) else {
                continue;
            };
            if !board.is_empty(nr, nc) {
                continue;
            }
            let required = edges[side.index()];
            let facing_side = side.opposite();

            let mut any_fit = false;
            'tiles: for tile in tiles.iter() {
                if tile.id() == exclude_id || used.contains(tile.id() - 1) {
                    continue;
                }
                for k in 0..tile.unique_rotation_count() {
                    let candidate = tile.rotated(k);
                    if candidate[facing_side.index()] != required {
                        continue;
                    }
                    if fits_at_with_hint(board, nr, nc, candidate, side, required) {
                        any_fit = true;
                        break 'tiles;
                    }
                }
            }
            if !any_fit {
                return false;
            }
        }
        true
    }
}

/// Whether `candidate` would fit at `(r, c)`, treating the side facing the
/// placement that triggered this check (`hint_side`) as already constrained
/// to `hint_value` rather than re-reading the board (the hypothetical
/// neighbor at the other end of `hint_side` has not actually been placed).
/// Every other side is checked against the real board exactly like
/// [`Board::fits`].
fn fits_at_with_hint(
    board: &Board,
    r: usize,
    c: usize,
    candidate: [Color; 4],
    hint_side: crate::tile::Side,
    hint_value: Color,
) -> bool {
    for side in ALL_SIDES {
        if side == hint_side {
            if candidate[side.index()] != hint_value {
                return false;
            }
            continue;
        }
        match board.neighbor(r, c, side) {
            None => {
                if candidate[side.index()] != BORDER {
                    return false;
                }
            }
            Some((nr, nc)) => {
                if let Some(placed) = board.get(nr, nc) {
                    if placed.edges[side.opposite().index()] != candidate[side.index()] {
                        return false;
                    }
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Placement;
    use crate::tile::Tile;

    #[test]
    fn forward_check_rejects_when_neighbor_has_no_surviving_tile() {
        // 1x2 board; (0,0) about to be placed with east edge = 9, but no
        // remaining tile can show west edge 9 at (0,1).
        let board = Board::empty(1, 2).unwrap();
        let tiles = TileSet::new(vec![
            Tile::new(1, [BORDER, BORDER, BORDER, 5]),
            Tile::new(2, [BORDER, BORDER, BORDER, 5]),
        ])
        .unwrap();
        let used = FixedBitSet::with_capacity(2);
        let candidate_edges = [BORDER, 9, BORDER, BORDER];
        assert!(!PlacementValidator::forward_check(
            &board, &tiles, 0, 0, candidate_edges, &used, 1
        ));
    }

    #[test]
    fn forward_check_accepts_when_neighbor_has_a_surviving_tile() {
        let board = Board::empty(1, 2).unwrap();
        let tiles = TileSet::new(vec![
            Tile::new(1, [BORDER, 9, BORDER, BORDER]),
            Tile::new(2, [BORDER, BORDER, BORDER, 9]),
        ])
        .unwrap();
        let used = FixedBitSet::with_capacity(2);
        let candidate_edges = [BORDER, 9, BORDER, BORDER];
        assert!(PlacementValidator::forward_check(
            &board, &tiles, 0, 0, candidate_edges, &used, 1
        ));
    }

    #[test]
    fn forward_check_ignores_non_empty_neighbors() {
        let mut board = Board::empty(1, 2).unwrap();
        board.place(
            0,
            1,
            Placement { tile_id: 2, rotation: 0, edges: [BORDER, BORDER, BORDER, 9] },
        );
        let tiles = TileSet::new(vec![
            Tile::new(1, [BORDER, 9, BORDER, BORDER]),
            Tile::new(2, [BORDER, BORDER, BORDER, 9]),
        ])
        .unwrap();
        let mut used = FixedBitSet::with_capacity(2);
        used.insert(1);
        // (0,1) is occupied, so forward_check should not even consult the pool for it.
        assert!(PlacementValidator::forward_check(
            &board,
            &tiles,
            0,
            0,
            [BORDER, 9, BORDER, BORDER],
            &used,
            1
        ));
    }
}
