use crate::error::SolverError;

/// A small non-negative integer identifying an edge color. The color space is
/// expected to stay in the low dozens, so a `u16` keeps arithmetic on it cheap
/// without reaching for a newtype the way the donor crate's `Cell` left tile
/// indices as bare `usize`.
pub type Color = u16;

/// The distinguished color that every tile edge touching the outer frame
/// must carry.
pub const BORDER: Color = 0;

/// One of the four sides of a square tile or board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    East,
    South,
    West,
}

/// All four sides, in the fixed order used to index `[Color; 4]` edge tuples
/// and domain bit offsets throughout the crate.
pub const ALL_SIDES: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

impl Side {
    /// The side directly opposite this one.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Side::North => Side::South,
            Side::East => Side::West,
            Side::South => Side::North,
            Side::West => Side::East,
        }
    }

    /// Index into a `[Color; 4]` edge tuple, `North = 0, East = 1, South = 2, West = 3`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::North => 0,
            Side::East => 1,
            Side::South => 2,
            Side::West => 3,
        }
    }

    /// Row/column delta to the neighbor across this side.
    #[must_use]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Side::North => (-1, 0),
            Side::East => (0, 1),
            Side::South => (1, 0),
            Side::West => (0, -1),
        }
    }
}

/// A candidate tile: a 1-based id plus its (N, E, S, W) edge colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    id: usize,
    edges: [Color; 4],
}

impl Tile {
    /// Construct a new tile from a 1-based id and its `(N, E, S, W)` edges.
    #[must_use]
    pub fn new(id: usize, edges: [Color; 4]) -> Self {
        debug_assert!(id > 0, "tile ids are 1-based");
        Self { id, edges }
    }

    /// The tile's 1-based id.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The tile's edges in its canonical (unrotated) orientation.
    #[must_use]
    pub fn edges(&self) -> [Color; 4] {
        self.edges
    }

    /// The edges after rotating the tile clockwise by `k` quarter turns
    /// (`k` in `0..4`). Rotating clockwise moves what was on the west edge
    /// onto the north edge, i.e. a cyclic shift of `[N, E, S, W]` by `k`.
    #[must_use]
    pub fn rotated(&self, k: u8) -> [Color; 4] {
        debug_assert!(k < 4, "rotation must be in 0..4, got {k}");
        let k = usize::from(k);
        let mut out = [0 as Color; 4];
        for (side, slot) in out.iter_mut().enumerate() {
            *slot = self.edges[(side + 4 - k) % 4];
        }
        out
    }

    /// The number of rotations that yield a distinct edge tuple: `1` if the
    /// tile's edges are invariant under rotation, `2` if it has two-fold
    /// symmetry, `4` otherwise.
    #[must_use]
    pub fn unique_rotation_count(&self) -> u8 {
        let mut distinct: Vec<[Color; 4]> = Vec::with_capacity(4);
        for k in 0..4u8 {
            let rotated = self.rotated(k);
            if !distinct.contains(&rotated) {
                distinct.push(rotated);
            }
        }
        distinct.len() as u8
    }
}

/// A multiset of candidate tiles, indexed densely by `id - 1`.
///
/// Tile ids are required to form the contiguous range `1..=n`; this keeps the
/// per-cell domain representation in [`crate::domain`] a flat
/// `FixedBitSet` of length `n * 4` addressed by `(id - 1) * 4 + rotation`,
/// the direct multi-valued generalisation of the donor crate's single-valued
/// `FixedBitSet` domains in `Cell::domain`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    tiles: Vec<Tile>,
    /// Relative frequency of each tile (by id - 1), mirroring the donor's
    /// `Rules::frequencies` used to weight `WeightedIndex` sampling; kept
    /// here purely as metadata the heuristics/tests may consult, default 1.
    frequencies: Vec<usize>,
}

impl TileSet {
    /// Construct a tile set, validating that ids are unique and form the
    /// contiguous range `1..=tiles.len()`.
    pub fn new(tiles: Vec<Tile>) -> Result<Self, SolverError> {
        if tiles.is_empty() {
            return Err(SolverError::EmptyTileSet);
        }

        let n = tiles.len();
        let mut seen = vec![false; n + 1];
        for tile in &tiles {
            if tile.id == 0 || tile.id > n {
                return Err(SolverError::NonContiguousTileIds {
                    expected: n,
                    missing: tile.id.min(n + 1),
                });
            }
            if seen[tile.id] {
                return Err(SolverError::DuplicateTileId(tile.id));
            }
            seen[tile.id] = true;
        }
        if let Some(missing) = (1..=n).find(|&id| !seen[id]) {
            return Err(SolverError::NonContiguousTileIds {
                expected: n,
                missing,
            });
        }

        let mut ordered = vec![None; n];
        for tile in tiles {
            let idx = tile.id - 1;
            ordered[idx] = Some(tile);
        }
        let tiles: Vec<Tile> = ordered.into_iter().map(|t| t.expect("validated above")).collect();
        let frequencies = vec![1; n];
        Ok(Self { tiles, frequencies })
    }

    /// Attach relative frequencies (by id) used to weight random tile choice.
    /// Panics if the length does not match the tile count; this is a
    /// construction-time programmer error, not a runtime failure mode.
    #[must_use]
    pub fn with_frequencies(mut self, frequencies: Vec<usize>) -> Self {
        debug_assert_eq!(frequencies.len(), self.tiles.len());
        self.frequencies = frequencies;
        self
    }

    /// The number of tiles in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the set has no tiles (always `false` post-construction).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Fetch a tile by its 1-based id.
    #[must_use]
    pub fn get(&self, id: usize) -> &Tile {
        &self.tiles[id - 1]
    }

    /// Iterate over all tiles in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// The relative frequency of a tile, by id.
    #[must_use]
    pub fn frequency(&self, id: usize) -> usize {
        self.frequencies[id - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_cyclic_over_four_turns() {
        let tile = Tile::new(1, [1, 2, 3, 4]);
        assert_eq!(tile.rotated(0), [1, 2, 3, 4]);
        assert_eq!(tile.rotated(1), [4, 1, 2, 3]);
        assert_eq!(tile.rotated(4 % 4), tile.rotated(0));
    }

    #[test]
    fn unique_rotation_count_classifies_symmetry() {
        assert_eq!(Tile::new(1, [5, 5, 5, 5]).unique_rotation_count(), 1);
        assert_eq!(Tile::new(2, [1, 2, 1, 2]).unique_rotation_count(), 2);
        assert_eq!(Tile::new(3, [1, 2, 3, 4]).unique_rotation_count(), 4);
    }

    #[test]
    fn tile_set_rejects_duplicate_ids() {
        let tiles = vec![Tile::new(1, [0, 0, 0, 0]), Tile::new(1, [1, 1, 1, 1])];
        assert_eq!(TileSet::new(tiles), Err(SolverError::DuplicateTileId(1)));
    }

    #[test]
    fn tile_set_rejects_non_contiguous_ids() {
        let tiles = vec![Tile::new(1, [0, 0, 0, 0]), Tile::new(3, [1, 1, 1, 1])];
        assert!(matches!(
            TileSet::new(tiles),
            Err(SolverError::NonContiguousTileIds { .. })
        ));
    }

    #[test]
    fn tile_set_rejects_empty() {
        assert_eq!(TileSet::new(Vec::new()), Err(SolverError::EmptyTileSet));
    }
}
