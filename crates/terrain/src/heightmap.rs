use formats::ElevationGrid;
use runtime::TimeBudget;
use tracing::debug;

use crate::container::{TerrainTile, TileArena};

/// Resume point inside the heightmap phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct HeightmapCursor {
    /// Storage index of the tile being filled.
    pub tile: usize,
    /// Next destination column within that tile.
    pub column: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeightmapProgress {
    /// The budget ran out; call again to continue from the saved cursor.
    Suspended,
    Complete,
}

/// Resamples the elevation grid into every tile's height field, a column at
/// a time, yielding whenever the tick budget is spent.
#[derive(Debug, Default)]
pub struct HeightmapGenerator {
    cursor: HeightmapCursor,
}

impl HeightmapGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> HeightmapCursor {
        self.cursor
    }

    /// Fraction of columns written so far.
    pub fn progress(&self, tiles: &TileArena) -> f32 {
        let Some(first) = tiles.get(0, 0) else {
            return 1.0;
        };
        let res = first.resolution();
        let total = tiles.len() * res;
        let done = self.cursor.tile * res + self.cursor.column;
        (done as f32 / total as f32).min(1.0)
    }

    pub fn run(
        &mut self,
        grid: &ElevationGrid,
        tiles: &mut TileArena,
        budget: &TimeBudget,
    ) -> HeightmapProgress {
        let (tiles_x, tiles_y) = (tiles.width(), tiles.height());
        while let Some(tile) = tiles.nth_mut(self.cursor.tile) {
            let res = tile.resolution();
            while self.cursor.column < res {
                fill_column(grid, tile, tiles_x, tiles_y, self.cursor.column);
                self.cursor.column += 1;
                if budget.is_exhausted() {
                    if self.cursor.column == res {
                        self.next_tile();
                    }
                    debug!(
                        tile = self.cursor.tile,
                        column = self.cursor.column,
                        "heightmap generation suspended"
                    );
                    return if self.cursor.tile >= tiles.len() {
                        HeightmapProgress::Complete
                    } else {
                        HeightmapProgress::Suspended
                    };
                }
            }
            self.next_tile();
        }
        HeightmapProgress::Complete
    }

    fn next_tile(&mut self) {
        self.cursor.tile += 1;
        self.cursor.column = 0;
    }
}

/// Source sample span `[start, end]` covered by tile `index` of `tiles`.
///
/// Adjacent tiles share their boundary sample so edges line up.
fn source_span(index: usize, tiles: usize, samples: usize) -> (f64, f64) {
    let last = samples.saturating_sub(1) as f64;
    let start = index as f64 * last / tiles as f64;
    let end = (index + 1) as f64 * last / tiles as f64;
    (start, end)
}

/// Nearest source index for destination sample `i` of `res`.
fn source_index(span: (f64, f64), i: usize, res: usize) -> usize {
    let t = i as f64 / (res - 1) as f64;
    (span.0 + (span.1 - span.0) * t).round() as usize
}

fn fill_column(grid: &ElevationGrid, tile: &mut TerrainTile, tiles_x: usize, tiles_y: usize, col: usize) {
    let res = tile.resolution();
    let (tx, ty) = tile.index();
    let col_span = source_span(tx, tiles_x, grid.ncols());
    let row_span = source_span(ty, tiles_y, grid.nrows());

    let (min, max) = (grid.min_elevation(), grid.max_elevation());
    let range = max - min;
    let src_col = source_index(col_span, col, res).min(grid.ncols() - 1);

    for row in 0..res {
        let src_row = source_index(row_span, row, res).min(grid.nrows() - 1);
        let sample = grid.sample(src_col, src_row);
        let h = if grid.is_no_data(sample) || range <= 0.0 {
            0.0
        } else {
            ((sample - min) / range).clamp(0.0, 1.0)
        };
        tile.set_height(col, row, h);
    }
}
