//! Viewport fetch planning.
//!
//! The planner turns a rectangular viewport into the list of tile codes
//! to fetch, ordered by [`SpiralOrder`] so the pipeline/cache path is
//! invoked for tiles nearest the view center first. Invocation order is
//! the only guarantee: callers that resolve misses concurrently are free
//! to complete them in any order.

use tracing::debug;

use crate::tile::{SpiralOrder, TileCode};

/// A rectangular range of tile coordinates at one zoom level, bounds
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportGrid {
    pub zoom: u8,
    pub min_col: u32,
    pub max_col: u32,
    pub min_row: u32,
    pub max_row: u32,
}

impl ViewportGrid {
    /// Grid covering `[min_col, max_col] x [min_row, max_row]`.
    ///
    /// Bounds are normalized so `min <= max` on both axes.
    pub fn new(zoom: u8, min_col: u32, max_col: u32, min_row: u32, max_row: u32) -> Self {
        Self {
            zoom,
            min_col: min_col.min(max_col),
            max_col: min_col.max(max_col),
            min_row: min_row.min(max_row),
            max_row: min_row.max(max_row),
        }
    }

    /// Number of tiles in the grid. Inclusive bounds mean a grid always
    /// holds at least one tile.
    pub fn tile_count(&self) -> usize {
        let cols = (self.max_col - self.min_col + 1) as usize;
        let rows = (self.max_row - self.min_row + 1) as usize;
        cols * rows
    }

    /// The tile nearest the grid's center, used as the default focus.
    pub fn center(&self) -> TileCode {
        TileCode::new(
            self.zoom,
            self.min_col + (self.max_col - self.min_col) / 2,
            self.min_row + (self.max_row - self.min_row) / 2,
        )
    }

    /// All tile codes of the grid, row-major.
    pub fn codes(&self) -> Vec<TileCode> {
        let mut codes = Vec::with_capacity(self.tile_count());
        for row in self.min_row..=self.max_row {
            for col in self.min_col..=self.max_col {
                codes.push(TileCode::new(self.zoom, col, row));
            }
        }
        codes
    }
}

/// The tile codes of a viewport, sorted spiral-first around the focus.
pub fn plan_fetch_order(grid: &ViewportGrid, focus: TileCode) -> Vec<TileCode> {
    let mut codes = grid.codes();
    SpiralOrder::around(focus).sort(&mut codes);
    debug!(
        zoom = grid.zoom,
        tiles = codes.len(),
        focus = %focus,
        "planned viewport fetch order"
    );
    codes
}

/// Result of sweeping a fetch callback over a planned tile order.
///
/// A failing tile does not stop the sweep: the viewport should render
/// with holes rather than not at all. Failures are collected per tile for
/// the caller to log or retry.
#[derive(Debug)]
pub struct FetchOutcome<E> {
    /// Tiles fetched successfully, in invocation order.
    pub fetched: Vec<TileCode>,
    /// Tiles whose fetch failed, with the per-tile error.
    pub failures: Vec<(TileCode, E)>,
}

impl<E> FetchOutcome<E> {
    /// Whether every tile fetched successfully.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Invoke `fetch` for every tile in `order`, collecting failures.
    pub fn sweep<F>(order: &[TileCode], mut fetch: F) -> Self
    where
        F: FnMut(TileCode) -> Result<(), E>,
    {
        let mut fetched = Vec::with_capacity(order.len());
        let mut failures = Vec::new();
        for &tile in order {
            match fetch(tile) {
                Ok(()) => fetched.push(tile),
                Err(err) => failures.push((tile, err)),
            }
        }
        Self { fetched, failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_codes_cover_every_tile_once() {
        let grid = ViewportGrid::new(14, 10, 12, 20, 21);
        let codes = grid.codes();
        assert_eq!(codes.len(), 6);
        assert_eq!(grid.tile_count(), 6);

        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), 6, "no duplicates");
        assert!(codes.contains(&TileCode::new(14, 10, 20)));
        assert!(codes.contains(&TileCode::new(14, 12, 21)));
    }

    #[test]
    fn test_grid_normalizes_bounds() {
        let grid = ViewportGrid::new(14, 12, 10, 21, 20);
        assert_eq!(grid.min_col, 10);
        assert_eq!(grid.max_col, 12);
        assert_eq!(grid.min_row, 20);
        assert_eq!(grid.max_row, 21);
    }

    #[test]
    fn test_center_of_odd_grid() {
        let grid = ViewportGrid::new(0, 0, 6, 0, 4);
        assert_eq!(grid.center(), TileCode::new(0, 3, 2));
    }

    #[test]
    fn test_plan_puts_focus_first() {
        let grid = ViewportGrid::new(0, 0, 6, 0, 4);
        let focus = grid.center();
        let order = plan_fetch_order(&grid, focus);

        assert_eq!(order.len(), grid.tile_count());
        assert_eq!(order[0], focus);
        // Ring distance never decreases along the planned order.
        let spiral = SpiralOrder::around(focus);
        for pair in order.windows(2) {
            assert!(spiral.ring(&pair[0]) <= spiral.ring(&pair[1]));
        }
    }

    #[test]
    fn test_sweep_invokes_in_planned_order() {
        let grid = ViewportGrid::new(0, 0, 2, 0, 2);
        let order = plan_fetch_order(&grid, grid.center());

        let mut seen = Vec::new();
        let outcome = FetchOutcome::<()>::sweep(&order, |tile| {
            seen.push(tile);
            Ok(())
        });

        assert_eq!(seen, order);
        assert!(outcome.is_complete());
        assert_eq!(outcome.fetched, order);
    }

    #[test]
    fn test_sweep_collects_failures_without_stopping() {
        let grid = ViewportGrid::new(0, 0, 2, 0, 0);
        let order = plan_fetch_order(&grid, TileCode::new(0, 1, 0));

        let outcome = FetchOutcome::sweep(&order, |tile| {
            if tile.col == 2 {
                Err("upstream unavailable")
            } else {
                Ok(())
            }
        });

        assert!(!outcome.is_complete());
        assert_eq!(outcome.fetched.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, TileCode::new(0, 2, 0));
    }
}
