use crate::board::Board;

/// Prunes placements that would only reproduce a solution already reachable
/// by rotating or reflecting the whole board (§4.9). A square edge-matching
/// board has an 8-element symmetry group (4 rotations × reflection); without
/// breaking it the search explores up to 8 equivalent copies of every
/// solution it finds.
///
/// Two rules, applied only at the four corner cells (everywhere else always
/// allows the placement):
///
/// 1. **Rotation pin**: the top-left corner `(0, 0)` may only be placed at
///    rotation `0`. This collapses the 4-fold rotational symmetry, since any
///    solution can be rotated until its corner tile sits at `(0, 0)` in its
///    canonical orientation.
/// 2. **Lex order on corners**: once the top-left corner is placed, every
///    other corner's tile id must be `>=` the top-left tile id. This
///    collapses the remaining reflection symmetry by requiring the
///    lexicographically smallest corner tile to be the one pinned at
///    `(0, 0)`.
pub struct SymmetryBreaker;

impl SymmetryBreaker {
    /// Whether placing tile `tile_id` at rotation `rotation` into `(r, c)`
    /// respects the symmetry-breaking rules above.
    #[must_use]
    pub fn is_placement_allowed(board: &Board, r: usize, c: usize, tile_id: usize, rotation: u8) -> bool {
        let (rows, cols) = board.size();
        if (r, c) == (0, 0) {
            return rotation == 0;
        }
        if !is_corner(r, c, rows, cols) {
            return true;
        }
        match board.get(0, 0) {
            Some(top_left) => tile_id >= top_left.tile_id,
            None => true,
        }
    }

    /// Whether `(r, c)` is one of the board's four corners.
    #[must_use]
    pub fn is_corner(board: &Board, r: usize, c: usize) -> bool {
        let (rows, cols) = board.size();
        is_corner(r, c, rows, cols)
    }
}

fn is_corner(r: usize, c: usize, rows: usize, cols: usize) -> bool {
    (r == 0 || r == rows - 1) && (c == 0 || c == cols - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Placement;
    use crate::tile::BORDER;

    #[test]
    fn top_left_corner_only_accepts_rotation_zero() {
        let board = Board::empty(3, 3).unwrap();
        assert!(SymmetryBreaker::is_placement_allowed(&board, 0, 0, 1, 0));
        assert!(!SymmetryBreaker::is_placement_allowed(&board, 0, 0, 1, 1));
    }

    #[test]
    fn non_corner_cells_are_never_restricted() {
        let board = Board::empty(3, 3).unwrap();
        assert!(SymmetryBreaker::is_placement_allowed(&board, 1, 1, 7, 3));
    }

    #[test]
    fn other_corners_require_tile_id_at_least_top_left() {
        let mut board = Board::empty(3, 3).unwrap();
        board.place(0, 0, Placement { tile_id: 5, rotation: 0, edges: [BORDER, 1, 1, BORDER] });
        assert!(SymmetryBreaker::is_placement_allowed(&board, 0, 2, 5, 0));
        assert!(SymmetryBreaker::is_placement_allowed(&board, 2, 2, 9, 0));
        assert!(!SymmetryBreaker::is_placement_allowed(&board, 2, 0, 2, 0));
    }

    #[test]
    fn corner_rule_defers_until_top_left_is_placed() {
        let board = Board::empty(3, 3).unwrap();
        assert!(SymmetryBreaker::is_placement_allowed(&board, 0, 2, 1, 0));
    }
}
