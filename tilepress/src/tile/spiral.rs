//! Spiral ordering of tile codes around a focus tile.
//!
//! Ring distance is Chebyshev distance from the focus: every tile of a
//! ring is reachable in the same number of king moves. Within a ring the
//! order walks the ring's perimeter clockwise starting directly north of
//! the focus, so tiles at equal ring distance are ordered by angular
//! position, not by raw coordinate comparison.
//!
//! ```text
//!     23 24  9 10 11
//!     22  8  1  2 12
//!     21  7  0  3 13     0 = focus, 1 = directly north,
//!     20  6  5  4 14     clockwise per ring
//!     19 18 17 16 15
//! ```
//! (numbers are rank order for a 5×5 grid centered on the focus; rows
//! grow southward as in slippy-map coordinates)

use std::cmp::Ordering;

use crate::tile::TileCode;

/// Total order over tile codes by spiral distance from a focus
/// coordinate.
///
/// The comparator is a strict weak order: antisymmetric, transitive, and
/// deterministic under arbitrary input ordering. Tiles of different zoom
/// levels (not expected from a well-formed grid) fall back to a plain
/// field comparison so the order stays total.
#[derive(Debug, Clone, Copy)]
pub struct SpiralOrder {
    focus_col: i64,
    focus_row: i64,
}

impl SpiralOrder {
    /// Order around the given focus column/row.
    pub fn new(focus_col: u32, focus_row: u32) -> Self {
        Self {
            focus_col: focus_col as i64,
            focus_row: focus_row as i64,
        }
    }

    /// Order around an existing tile.
    pub fn around(focus: TileCode) -> Self {
        Self::new(focus.col, focus.row)
    }

    /// Chebyshev ring distance of a tile from the focus.
    pub fn ring(&self, tile: &TileCode) -> u64 {
        let dx = (tile.col as i64 - self.focus_col).unsigned_abs();
        let dy = (tile.row as i64 - self.focus_row).unsigned_abs();
        dx.max(dy)
    }

    /// Rank of a tile: ring first, then position along the clockwise
    /// perimeter walk starting directly north of the focus.
    fn rank(&self, tile: &TileCode) -> (u64, u64) {
        let dx = tile.col as i64 - self.focus_col;
        let dy = tile.row as i64 - self.focus_row;
        let ring = dx.unsigned_abs().max(dy.unsigned_abs()) as i64;
        if ring == 0 {
            return (0, 0);
        }

        // Perimeter position in [0, 8*ring): north → NE corner along the
        // top edge, down the east edge, west along the bottom edge, up
        // the west edge, closing eastward along the top-left segment.
        // North means the smaller row.
        let position = if dy == -ring && dx >= 0 {
            dx
        } else if dx == ring {
            ring + (dy + ring)
        } else if dy == ring {
            3 * ring + (ring - dx)
        } else if dx == -ring {
            5 * ring + (ring - dy)
        } else {
            7 * ring + (ring + dx)
        };

        (ring as u64, position as u64)
    }

    /// Compare two tiles by spiral distance from the focus.
    pub fn compare(&self, a: &TileCode, b: &TileCode) -> Ordering {
        self.rank(a)
            .cmp(&self.rank(b))
            .then_with(|| (a.zoom, a.row, a.col).cmp(&(b.zoom, b.row, b.col)))
    }

    /// Sort a slice of tile codes into spiral order.
    pub fn sort(&self, tiles: &mut [TileCode]) {
        tiles.sort_by(|a, b| self.compare(a, b));
    }
}
