use fixedbitset::FixedBitSet;

use crate::board::Board;
use crate::domain::DomainManager;
use crate::tile::TileSet;

/// A forced placement found by [`SingletonDetector::scan`]: the cell, tile
/// id, and rotation that are the *only* legal placement remaining for that
/// tile anywhere on the board (it may still have several legal rotations at
/// that one cell — the rotation carried here is merely the first one found;
/// §4.8 step 7 lets the driver try the others before giving up on this
/// cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Singleton {
    pub row: usize,
    pub col: usize,
    pub tile_id: usize,
    pub rotation: u8,
}

/// What one scan over the free tiles found (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonOutcome {
    /// A free tile whose only legal cell is unique.
    Forced(Singleton),
    /// A free tile with zero legal `(cell, rotation)` pairs anywhere — the
    /// partial assignment is a dead-end regardless of what AC-3's per-cell
    /// domains currently say (a tile can run out of homes without any single
    /// cell's domain going empty).
    DeadEnd { tile_id: usize },
    /// No free tile is forced; every free tile has either zero or more than
    /// one legal cell and the first case didn't fire before the second.
    None,
}

/// Scans all free tiles (§4.4), classifying each by how many distinct cells
/// it could still legally occupy: placing a forced tile costs nothing to
/// verify and skips straight past the MRV/LCV machinery for a branch with no
/// real choice left. Checked before MRV selection on every driver step when
/// [`crate::SolverConfig::use_singletons`] is set, mirroring how the donor
/// crate greedily grabs the donor's zero-entropy cells in
/// `WaveFunction::find_lowest_entropy` before falling back to weighted
/// sampling.
pub struct SingletonDetector;

impl SingletonDetector {
    /// Scan every free tile in id order. Returns the first zero-cell tile
    /// found as [`SingletonOutcome::DeadEnd`] (this dominates: a dead-end
    /// makes any singleton found among later tiles moot), else the first
    /// single-cell tile as [`SingletonOutcome::Forced`], else
    /// [`SingletonOutcome::None`].
    #[must_use]
    pub fn scan(domains: &DomainManager, board: &Board, tiles: &TileSet, used: &FixedBitSet) -> SingletonOutcome {
        let (rows, cols) = board.size();
        for tile in tiles.iter() {
            if used.contains(tile.id() - 1) {
                continue;
            }
            let mut only_cell: Option<(usize, usize)> = None;
            let mut cell_count = 0usize;
            'cells: for r in 0..rows {
                for c in 0..cols {
                    if board.is_fixed(r, c) || !board.is_empty(r, c) {
                        continue;
                    }
                    if domains.cache(r, c).contains(tile.id() - 1) {
                        cell_count += 1;
                        only_cell = Some((r, c));
                        if cell_count > 1 {
                            break 'cells;
                        }
                    }
                }
            }
            match cell_count {
                0 => return SingletonOutcome::DeadEnd { tile_id: tile.id() },
                1 => {
                    let (r, c) = only_cell.expect("cell_count is 1");
                    let base = (tile.id() - 1) * 4;
                    let rotation = (0..4)
                        .find(|k| domains.get(r, c).contains(base + k))
                        .expect("cache says this tile fits here") as u8;
                    return SingletonOutcome::Forced(Singleton { row: r, col: c, tile_id: tile.id(), rotation });
                }
                _ => {}
            }
        }
        SingletonOutcome::None
    }

    /// Convenience wrapper over [`Self::scan`] for callers that only care
    /// about a forced placement (e.g. unit tests), discarding the dead-end
    /// signal.
    #[must_use]
    pub fn find(domains: &DomainManager, board: &Board, tiles: &TileSet, used: &FixedBitSet) -> Option<Singleton> {
        match Self::scan(domains, board, tiles, used) {
            SingletonOutcome::Forced(singleton) => Some(singleton),
            SingletonOutcome::DeadEnd { .. } | SingletonOutcome::None => None,
        }
    }
}
