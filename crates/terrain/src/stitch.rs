use std::fmt;

use crate::config::StitchPass;
use crate::container::{TerrainTile, TileArena};

#[derive(Debug, Clone, PartialEq)]
pub enum StitchError {
    /// Neighbouring tiles disagree on their sample count.
    ResolutionMismatch {
        a: (usize, usize),
        b: (usize, usize),
    },
    Kernel(String),
}

impl fmt::Display for StitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StitchError::ResolutionMismatch { a, b } => {
                write!(f, "tiles {a:?} and {b:?} have different resolutions")
            }
            StitchError::Kernel(msg) => write!(f, "stitching failed: {msg}"),
        }
    }
}

impl std::error::Error for StitchError {}

/// Smooths height discontinuities across tile borders.
///
/// Called twice per run over the whole arena: a wide pass, then a narrow one.
pub trait EdgeStitcher {
    fn stitch(&mut self, tiles: &mut TileArena, pass: StitchPass) -> Result<(), StitchError>;
}

/// Default kernel: moves both sides of every seam to their mean and spreads
/// the correction inwards with weight `(1 - k / blend_width) ^ falloff`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeamBlendStitcher;

#[derive(Debug, Copy, Clone)]
enum Seam {
    /// `a` is west of `b`.
    EastWest,
    /// `a` is south of `b`.
    NorthSouth,
}

impl EdgeStitcher for SeamBlendStitcher {
    fn stitch(&mut self, tiles: &mut TileArena, pass: StitchPass) -> Result<(), StitchError> {
        let (w, h) = (tiles.width(), tiles.height());
        for y in 0..h {
            for x in 0..w.saturating_sub(1) {
                blend_pair(tiles, (x, y), (x + 1, y), Seam::EastWest, pass)?;
            }
        }
        for y in 0..h.saturating_sub(1) {
            for x in 0..w {
                blend_pair(tiles, (x, y), (x, y + 1), Seam::NorthSouth, pass)?;
            }
        }
        Ok(())
    }
}

fn blend_pair(
    tiles: &mut TileArena,
    ia: (usize, usize),
    ib: (usize, usize),
    seam: Seam,
    pass: StitchPass,
) -> Result<(), StitchError> {
    let Some((a, b)) = tiles.pair_mut(ia, ib) else {
        return Ok(());
    };
    let res = a.resolution();
    if b.resolution() != res {
        return Err(StitchError::ResolutionMismatch { a: ia, b: ib });
    }
    let width = pass.blend_width.clamp(1, res / 2 + 1);

    for along in 0..res {
        // Sample `k` steps away from the seam, on each side.
        let a_at = |k: usize| match seam {
            Seam::EastWest => (res - 1 - k, along),
            Seam::NorthSouth => (along, res - 1 - k),
        };
        let b_at = |k: usize| match seam {
            Seam::EastWest => (k, along),
            Seam::NorthSouth => (along, k),
        };

        let edge_a = get(a, a_at(0));
        let edge_b = get(b, b_at(0));
        let mean = (edge_a + edge_b) * 0.5;
        let (delta_a, delta_b) = (mean - edge_a, mean - edge_b);

        for k in 0..width {
            let weight = (1.0 - k as f32 / width as f32).powf(pass.falloff);
            add(a, a_at(k), delta_a * weight);
            add(b, b_at(k), delta_b * weight);
        }
    }
    Ok(())
}

fn get(tile: &TerrainTile, (col, row): (usize, usize)) -> f32 {
    tile.height(col, row)
}

fn add(tile: &mut TerrainTile, (col, row): (usize, usize), delta: f32) {
    let h = tile.height(col, row) + delta;
    tile.set_height(col, row, h.clamp(0.0, 1.0));
}

#[cfg(test)]
mod tests {
    use super::{EdgeStitcher, SeamBlendStitcher};
    use crate::config::StitchPass;
    use crate::container::TerrainContainer;
    use foundation::math::{GeoPoint, Vec3};
    use std::path::Path;

    fn stepped_container() -> TerrainContainer {
        let mut c = TerrainContainer::new(
            [2, 2],
            Vec3::new(1.0, 1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            8,
            Path::new("dem.flt"),
        );
        for ((x, y), tile) in c.tiles_mut().iter_mut() {
            let level = 0.1 + 0.2 * (x + 2 * y) as f32;
            tile.heights_mut().fill(level);
        }
        c
    }

    #[test]
    fn seams_match_after_both_passes() {
        let mut c = stepped_container();
        let mut stitcher = SeamBlendStitcher;
        let coarse = StitchPass {
            blend_width: 4,
            falloff: 2.0,
        };
        let fine = StitchPass {
            blend_width: 2,
            falloff: 1.0,
        };
        stitcher.stitch(c.tiles_mut(), coarse).expect("coarse");
        stitcher.stitch(c.tiles_mut(), fine).expect("fine");

        let t = |x, y| c.tile(x, y).expect("tile");
        for i in 0..8 {
            assert!((t(0, 0).height(7, i) - t(1, 0).height(0, i)).abs() < 1e-6);
            assert!((t(0, 1).height(7, i) - t(1, 1).height(0, i)).abs() < 1e-6);
            assert!((t(0, 0).height(i, 7) - t(0, 1).height(i, 0)).abs() < 1e-6);
            assert!((t(1, 0).height(i, 7) - t(1, 1).height(i, 0)).abs() < 1e-6);
        }
        // Shared corner of all four tiles.
        let corner = t(0, 0).height(7, 7);
        for v in [t(1, 0).height(0, 7), t(0, 1).height(7, 0), t(1, 1).height(0, 0)] {
            assert!((corner - v).abs() < 1e-6);
        }
    }

    #[test]
    fn interior_beyond_blend_width_is_untouched() {
        let mut c = stepped_container();
        SeamBlendStitcher
            .stitch(
                c.tiles_mut(),
                StitchPass {
                    blend_width: 2,
                    falloff: 1.0,
                },
            )
            .expect("stitch");
        let t = c.tile(0, 0).expect("tile");
        assert_eq!(t.height(3, 3), 0.1);
        assert!(t.height(6, 3) > 0.1);
    }

    #[test]
    fn continuous_terrain_is_left_alone() {
        let mut c = stepped_container();
        for (_, tile) in c.tiles_mut().iter_mut() {
            tile.heights_mut().fill(0.4);
        }
        let before = c.clone();
        SeamBlendStitcher
            .stitch(
                c.tiles_mut(),
                StitchPass {
                    blend_width: 3,
                    falloff: 2.0,
                },
            )
            .expect("stitch");
        assert_eq!(before, c);
    }
}
