use fixedbitset::FixedBitSet;
use ndarray::Array2;
use std::fmt::{self, Display, Formatter};

pub use crate::tile::Side;
use crate::error::SolverError;
use crate::tile::{Color, TileSet, BORDER};

/// A tile committed into a board cell: the tile id, the rotation applied to
/// it, and the resulting `(N, E, S, W)` edge colors — cached so adjacency
/// checks never need to re-rotate a tile's canonical edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub tile_id: usize,
    pub rotation: u8,
    pub edges: [Color; 4],
}

/// An R×C grid of optionally-placed tiles, with a subset of cells
/// permanently fixed at construction time.
///
/// Mirrors the donor crate's `Map` (an `Array2`-backed grid with `Index`/
/// `IndexMut` by `(row, col)` and a `Display` impl), generalized from a
/// single `Cell` enum over one rotation-less tile index to `Option<Placement>`
/// carrying a tile id, rotation, and rotated edges.
#[derive(Debug, Clone)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Array2<Option<Placement>>,
    fixed: FixedBitSet,
}

impl Board {
    /// Construct an empty `rows x cols` board.
    pub fn empty(rows: usize, cols: usize) -> Result<Self, SolverError> {
        if rows == 0 || cols == 0 {
            return Err(SolverError::DegenerateBoard { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            cells: Array2::from_elem((rows, cols), None),
            fixed: FixedBitSet::with_capacity(rows * cols),
        })
    }

    /// Construct a board with an initial set of fixed placements, validated
    /// against the border rule, tile existence, and mutual adjacency.
    pub fn with_fixed(
        rows: usize,
        cols: usize,
        tiles: &TileSet,
        fixed: &[(usize, usize, Placement)],
    ) -> Result<Self, SolverError> {
        let mut board = Self::empty(rows, cols)?;
        for &(r, c, placement) in fixed {
            if placement.tile_id == 0 || placement.tile_id > tiles.len() {
                return Err(SolverError::UnknownTileId {
                    row: r,
                    col: c,
                    tile_id: placement.tile_id,
                });
            }
            if !board.fits(r, c, placement.edges) {
                return Err(SolverError::InvalidFixedPlacement { row: r, col: c });
            }
            board.cells[(r, c)] = Some(placement);
            board.fixed.insert(r * cols + c);
        }
        Ok(board)
    }

    /// The board's `(rows, cols)` dimensions.
    #[must_use]
    pub fn size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// The number of pre-fixed cells, auto-detected from construction.
    #[must_use]
    pub fn num_fixed(&self) -> usize {
        self.fixed.count_ones(..)
    }

    /// Whether `(r, c)` was part of the fixed prefix and must never be
    /// selected, placed into, or popped from history during normal search.
    #[must_use]
    pub fn is_fixed(&self, r: usize, c: usize) -> bool {
        self.fixed.contains(r * self.cols + c)
    }

    /// The placement at `(r, c)`, if any.
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> Option<Placement> {
        self.cells[(r, c)]
    }

    /// Whether `(r, c)` currently holds no tile.
    #[must_use]
    pub fn is_empty(&self, r: usize, c: usize) -> bool {
        self.cells[(r, c)].is_none()
    }

    /// The neighbor coordinate across `side` from `(r, c)`, if it lies on the board.
    #[must_use]
    pub fn neighbor(&self, r: usize, c: usize, side: Side) -> Option<(usize, usize)> {
        let (dr, dc) = side.delta();
        let nr = r.checked_add_signed(dr)?;
        let nc = c.checked_add_signed(dc)?;
        (nr < self.rows && nc < self.cols).then_some((nr, nc))
    }

    /// Whether `edges` would be a legal placement at `(r, c)`: border colors
    /// on every frame-touching side, and matching colors against every
    /// already-placed neighbor.
    #[must_use]
    pub fn fits(&self, r: usize, c: usize, edges: [Color; 4]) -> bool {
        for side in crate::tile::ALL_SIDES {
            match self.neighbor(r, c, side) {
                None => {
                    if edges[side.index()] != BORDER {
                        return false;
                    }
                }
                Some((nr, nc)) => {
                    if let Some(neighbor_placement) = self.cells[(nr, nc)] {
                        let facing = neighbor_placement.edges[side.opposite().index()];
                        if facing != edges[side.index()] {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    /// Commit `placement` at `(r, c)`. Caller (the driver, via
    /// [`crate::symmetry`] and [`crate::validator`]) is responsible for
    /// having already checked `fits`, symmetry, and that the cell is empty
    /// and unfixed; this method only asserts those invariants in debug
    /// builds, matching the donor's `debug_assert!`-heavy, no-runtime-check
    /// style in `Map`/`Tile`.
    pub fn place(&mut self, r: usize, c: usize, placement: Placement) {
        debug_assert!(!self.is_fixed(r, c), "cannot overwrite a fixed cell");
        debug_assert!(self.cells[(r, c)].is_none(), "cannot place onto an occupied cell");
        self.cells[(r, c)] = Some(placement);
    }

    /// Remove whatever is placed at `(r, c)`, returning it.
    pub fn remove(&mut self, r: usize, c: usize) -> Option<Placement> {
        debug_assert!(!self.is_fixed(r, c), "cannot remove a fixed cell");
        self.cells[(r, c)].take()
    }

    /// Count of adjacent placed-cell pairs whose shared edge colors match.
    /// Used by [`crate::stats`] as the "score" in score records (§4.11).
    #[must_use]
    pub fn matched_edge_count(&self) -> usize {
        let mut count = 0;
        for r in 0..self.rows {
            for c in 0..self.cols {
                let Some(placement) = self.cells[(r, c)] else {
                    continue;
                };
                for side in [Side::East, Side::South] {
                    let Some((nr, nc)) = self.neighbor(r, c, side) else {
                        continue;
                    };
                    if let Some(neighbor_placement) = self.cells[(nr, nc)] {
                        if placement.edges[side.index()]
                            == neighbor_placement.edges[side.opposite().index()]
                        {
                            count += 1;
                        }
                    }
                }
            }
        }
        count
    }

    /// Whether every cell holds a tile.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Every fixed cell and its placement, in row-major order — the seed
    /// for [`crate::history::PlacementHistory::new`].
    #[must_use]
    pub fn fixed_entries(&self) -> Vec<(usize, usize, Placement)> {
        let mut out = Vec::with_capacity(self.num_fixed());
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.is_fixed(r, c) {
                    if let Some(placement) = self.cells[(r, c)] {
                        out.push((r, c, placement));
                    }
                }
            }
        }
        out
    }

    /// The first empty, unfixed cell in row-major order, if any.
    #[must_use]
    pub fn first_empty(&self) -> Option<(usize, usize)> {
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.cells[(r, c)].is_none() {
                    return Some((r, c));
                }
            }
        }
        None
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let width = self
            .cells
            .iter()
            .filter_map(|cell| cell.map(|p| p.tile_id))
            .max()
            .unwrap_or(0)
            .to_string()
            .len();
        for row in self.cells.rows() {
            for cell in row {
                match cell {
                    Some(p) => write!(f, "{:>width$} ", p.tile_id, width = width)?,
                    None => write!(f, "{:>width$} ", "*", width = width)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
