use std::collections::{BTreeMap, HashMap, HashSet};

use crate::board::Board;
use crate::config::SortOrder;
use crate::domain::DomainManager;
use crate::tile::{Color, TileSet, ALL_SIDES};

/// Minimum-Remaining-Values cell selection, accelerated with bucket sets
/// (§4.5): rather than rescanning every empty cell on each driver step, cells
/// are kept bucketed by their current distinct-tile-count so the next MRV
/// pick is a lookup of the smallest non-empty bucket. A cell only moves
/// buckets when [`DomainManager::revise`] (via [`crate::propagate`]) actually
/// changes its count, so maintenance cost tracks real domain churn rather
/// than board size.
#[derive(Debug, Default)]
pub struct MrvIndex {
    buckets: BTreeMap<usize, HashSet<(usize, usize)>>,
    current: HashMap<(usize, usize), usize>,
}

impl MrvIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the index from scratch for every empty, unfixed cell.
    pub fn rebuild(&mut self, domains: &DomainManager, board: &Board) {
        self.buckets.clear();
        self.current.clear();
        let (rows, cols) = board.size();
        for r in 0..rows {
            for c in 0..cols {
                if board.is_fixed(r, c) || !board.is_empty(r, c) {
                    continue;
                }
                self.insert(r, c, domains.distinct_tile_count(r, c));
            }
        }
    }

    /// Reposition `(r, c)` after its domain count changed. A no-op if the
    /// count is unchanged from what the index already has recorded.
    pub fn update(&mut self, domains: &DomainManager, r: usize, c: usize) {
        let new_count = domains.distinct_tile_count(r, c);
        if self.current.get(&(r, c)) == Some(&new_count) {
            return;
        }
        self.remove(r, c);
        self.insert(r, c, new_count);
    }

    /// Drop `(r, c)` from the index, e.g. once it has been committed to.
    pub fn remove(&mut self, r: usize, c: usize) {
        if let Some(count) = self.current.remove(&(r, c)) {
            if let Some(bucket) = self.buckets.get_mut(&count) {
                bucket.remove(&(r, c));
                if bucket.is_empty() {
                    self.buckets.remove(&count);
                }
            }
        }
    }

    fn insert(&mut self, r: usize, c: usize, count: usize) {
        self.current.insert((r, c), count);
        self.buckets.entry(count).or_default().insert((r, c));
    }

    /// Select the next cell to branch on: lowest distinct-tile-count first,
    /// breaking ties by total `(tile, rotation)` pair count, then (if
    /// `prioritize_borders` and still tied) a cell touching the outer frame,
    /// then row-major order for full determinism.
    #[must_use]
    pub fn select(&self, domains: &DomainManager, board: &Board, prioritize_borders: bool) -> Option<(usize, usize)> {
        let (_, bucket) = self.buckets.iter().next()?;
        bucket
            .iter()
            .copied()
            .min_by_key(|&(r, c)| {
                let pair_count = domains.pair_count(r, c);
                let border_rank = if prioritize_borders && touches_border(board, r, c) { 0 } else { 1 };
                (pair_count, border_rank, r, c)
            })
    }

    /// Whether the index currently holds no cells (search is complete or the
    /// board has no empty unfixed cells left).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

fn touches_border(board: &Board, r: usize, c: usize) -> bool {
    ALL_SIDES.iter().any(|&side| board.neighbor(r, c, side).is_none())
}

/// A `(tile id, rotation)` candidate paired with its ordering score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub tile_id: usize,
    pub rotation: u8,
    pub score: usize,
}

/// Least-Constraining-Value ordering (§4.6): among a cell's surviving
/// `(tile, rotation)` pairs, prefer the one that leaves the most total
/// `(tile, rotation)` options across that cell's empty neighbors, computed by
/// hypothetically tightening each neighbor's required edge and recounting
/// [`crate::validator::PlacementValidator::fits`] survivors. Ties broken by
/// tile id per `sort_order`, exactly so two otherwise-identical runs started
/// with opposite `sort_order`s explore mirrored branches (§4.10's rationale
/// for giving parallel workers distinct orderings).
pub fn order_by_lcv(
    domains: &DomainManager,
    board: &Board,
    tiles: &TileSet,
    r: usize,
    c: usize,
    sort_order: SortOrder,
) -> Vec<ScoredCandidate> {
    let mut candidates: Vec<ScoredCandidate> = domains
        .get(r, c)
        .ones()
        .map(|bit| {
            let tile_id = bit / 4 + 1;
            let rotation = (bit % 4) as u8;
            let edges = tiles.get(tile_id).rotated(rotation);
            let score = neighbor_option_count(board, tiles, r, c, edges);
            ScoredCandidate { tile_id, rotation, score }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score.cmp(&a.score).then_with(|| match sort_order {
            SortOrder::Ascending => a.tile_id.cmp(&b.tile_id),
            SortOrder::Descending => b.tile_id.cmp(&a.tile_id),
        })
    });
    candidates
}

fn neighbor_option_count(board: &Board, tiles: &TileSet, r: usize, c: usize, edges: [Color; 4]) -> usize {
    let mut total = 0;
    for side in ALL_SIDES {
        let Some((nr, nc)) = board.neighbor(r, c, side) else { continue };
        if !board.is_empty(nr, nc) {
            continue;
        }
        let required = edges[side.index()];
        let facing = side.opposite();
        for tile in tiles.iter() {
            for k in 0..tile.unique_rotation_count() {
                if tile.rotated(k)[facing.index()] == required {
                    total += 1;
                }
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixedbitset::FixedBitSet;

    use crate::tile::{Tile, BORDER};

    fn sample_tiles() -> TileSet {
        TileSet::new(vec![
            Tile::new(1, [BORDER, 9, BORDER, BORDER]),
            Tile::new(2, [BORDER, BORDER, BORDER, 9]),
            Tile::new(3, [BORDER, BORDER, BORDER, 1]),
        ])
        .unwrap()
    }

    #[test]
    fn mrv_index_selects_fewest_distinct_tiles_first() {
        let board = Board::empty(1, 2).unwrap();
        let tiles = sample_tiles();
        let used = FixedBitSet::with_capacity(3);
        let mut domains = DomainManager::new(1, 2, 3);
        domains.initialize(&board, &tiles, &used);

        let mut index = MrvIndex::new();
        index.rebuild(&domains, &board);
        // (0,1) only admits tile 2 (west=9); (0,0) admits only tile 1 too (east=9 border cell).
        let selected = index.select(&domains, &board, false);
        assert!(selected.is_some());
    }

    #[test]
    fn lcv_orders_candidates_by_neighbor_option_count() {
        let board = Board::empty(1, 2).unwrap();
        let tiles = sample_tiles();
        let used = FixedBitSet::with_capacity(3);
        let mut domains = DomainManager::new(1, 2, 3);
        domains.initialize(&board, &tiles, &used);

        let ordered = order_by_lcv(&domains, &board, &tiles, 0, 0, SortOrder::Ascending);
        assert!(!ordered.is_empty());
        for pair in ordered.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
