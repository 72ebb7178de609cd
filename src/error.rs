use thiserror::Error;

/// Failures the solver core distinguishes.
///
/// Construction-time variants are raised from [`crate::Board::new`] and
/// [`crate::TileSet::new`] and never occur mid-search. [`SolverError::Propagation`]
/// is raised only from internal helpers that hit the defensive iteration cap
/// in [`crate::propagate`] (see `MAX_PROPAGATION_ITERATIONS`); it indicates a
/// bug, not a normal dead-end (normal dead-ends are plain `false` returns, per
/// the error handling design).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SolverError {
    /// The tile set passed to the solver contained no tiles.
    #[error("tile set is empty")]
    EmptyTileSet,

    /// Two tiles in the set share the same id.
    #[error("duplicate tile id {0}")]
    DuplicateTileId(usize),

    /// Tile ids must be the contiguous range `1..=n`; something in that range is missing.
    #[error("tile ids must form the contiguous range 1..={expected}, missing {missing}")]
    NonContiguousTileIds { expected: usize, missing: usize },

    /// The board was constructed with a zero dimension.
    #[error("board dimensions must be nonzero, got {rows}x{cols}")]
    DegenerateBoard { rows: usize, cols: usize },

    /// A fixed placement supplied at construction time does not fit its cell.
    #[error("fixed placement at ({row}, {col}) does not satisfy the border/adjacency rules")]
    InvalidFixedPlacement { row: usize, col: usize },

    /// A fixed placement referenced a tile id outside the tile set.
    #[error("fixed placement at ({row}, {col}) references unknown tile id {tile_id}")]
    UnknownTileId {
        row: usize,
        col: usize,
        tile_id: usize,
    },

    /// AC-3 propagation exceeded its defensive iteration cap; this indicates a cyclic
    /// queue bug rather than a real dead-end, which always terminates on a finite domain.
    #[error("constraint propagation did not terminate starting from ({row}, {col})")]
    Propagation { row: usize, col: usize },
}
