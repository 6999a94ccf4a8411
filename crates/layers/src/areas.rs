use std::ops::Range;

use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use terrain::TerrainContainer;
use tracing::trace;

use crate::classify::{FeatureClass, Placement};
use crate::config::VegetationConfig;
use crate::layer::{
    Feature, Geometry, LayerStats, VegetationLayer, jittered_scale, pick_species, place_instance,
};

/// Regular sampling grid laid over an area's bounding rectangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampleGrid {
    pub origin: Vec2,
    pub cells_x: usize,
    pub cells_z: usize,
    pub cell_x: f64,
    pub cell_z: f64,
}

impl SampleGrid {
    /// `round(extent / density)` cells per axis.
    pub fn new(bounds: Aabb2, density: f64) -> Self {
        let cells_x = (bounds.width() / density).round() as usize;
        let cells_z = (bounds.depth() / density).round() as usize;
        Self {
            origin: bounds.min,
            cells_x,
            cells_z,
            cell_x: if cells_x > 0 { bounds.width() / cells_x as f64 } else { 0.0 },
            cell_z: if cells_z > 0 { bounds.depth() / cells_z as f64 } else { 0.0 },
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells_x * self.cells_z
    }

    /// Column and row ranges of the cells overlapping `area`.
    pub fn clip(&self, area: &Aabb2) -> (Range<usize>, Range<usize>) {
        (
            overlapping(self.origin.x, self.cell_x, self.cells_x, area.min.x, area.max.x),
            overlapping(self.origin.z, self.cell_z, self.cells_z, area.min.z, area.max.z),
        )
    }

    pub fn center(&self, ix: usize, iz: usize) -> Vec2 {
        Vec2::new(
            self.origin.x + (ix as f64 + 0.5) * self.cell_x,
            self.origin.z + (iz as f64 + 0.5) * self.cell_z,
        )
    }
}

fn overlapping(origin: f64, cell: f64, cells: usize, lo: f64, hi: f64) -> Range<usize> {
    if cells == 0 || !(cell > 0.0) || hi < lo {
        return 0..0;
    }
    let end = (((hi - origin) / cell).floor() + 1.0).clamp(0.0, cells as f64) as usize;
    let start = (((lo - origin) / cell).floor().max(0.0) as usize).min(end);
    start..end
}

/// Forests as instances, grassland as detail layer counts.
#[derive(Debug, Clone)]
pub struct AreaLayer {
    config: VegetationConfig,
}

impl AreaLayer {
    pub fn new(config: &VegetationConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn add_detail(
        &self,
        container: &mut TerrainContainer,
        p: Vec2,
        rng: &mut ChaCha8Rng,
    ) -> u64 {
        let species = &self.config.grass_species;
        if species.is_empty() {
            return 0;
        }
        let draws: Vec<f64> = species.iter().map(|_| rng.random::<f64>()).collect();
        let counts = split_density(self.config.detail_density, &draws);

        let Some((x, y)) = container.tile_index_at(p) else {
            return 0;
        };
        let Some(tile) = container.tile_mut(x, y) else {
            return 0;
        };
        let res = self.config.detail_resolution;
        let local = tile.to_local(p);
        let size = tile.size();
        let cell = |v: f64, extent: f64| ((v / extent * res as f64).floor().max(0.0) as usize).min(res - 1);
        let (cx, cz) = (cell(local.x, size.x), cell(local.z, size.z));

        let mut added = 0u64;
        for (name, &count) in species.iter().zip(&counts) {
            if count == 0 {
                continue;
            }
            tile.detail_layer_mut(name, res).add(cx, cz, count);
            added += count as u64;
        }
        added
    }
}

impl VegetationLayer for AreaLayer {
    fn name(&self) -> &'static str {
        "areas"
    }

    fn accepts(&self, class: FeatureClass) -> bool {
        class.is_area()
    }

    fn rasterize(
        &self,
        feature: &Feature,
        container: &mut TerrainContainer,
        rng: &mut ChaCha8Rng,
    ) -> LayerStats {
        let mut stats = LayerStats::default();
        let Geometry::Area(polygon) = &feature.geometry else {
            return stats;
        };
        let Some(bounds) = polygon.bounds() else {
            return stats;
        };
        let grid = SampleGrid::new(bounds, self.config.density);
        let (jx, jz) = (
            self.config.jitter_bound(grid.cell_x),
            self.config.jitter_bound(grid.cell_z),
        );
        let extent = container.bounds();
        let placement = feature.class.placement();
        let reach = Aabb2::new(
            Vec2::new(extent.min.x - jx, extent.min.z - jz),
            Vec2::new(extent.max.x + jx, extent.max.z + jz),
        );
        let (columns, rows) = grid.clip(&reach);

        for iz in rows {
            for ix in columns.clone() {
                let c = grid.center(ix, iz);
                let p = Vec2::new(
                    c.x + rng.random_range(-jx..=jx),
                    c.z + rng.random_range(-jz..=jz),
                );
                stats.samples += 1;
                if !extent.contains(p) || !polygon.contains(p) {
                    continue;
                }
                match placement {
                    Placement::Instances => {
                        let Some(species) = pick_species(rng, &self.config.tree_species) else {
                            continue;
                        };
                        let scale =
                            jittered_scale(rng, self.config.base_scale, self.config.scale_jitter);
                        if place_instance(container, p, species, scale) {
                            stats.instances += 1;
                        }
                    }
                    Placement::Detail => stats.detail += self.add_detail(container, p, rng),
                }
            }
        }
        trace!(
            id = %feature.id,
            cells = grid.cell_count(),
            instances = stats.instances,
            detail = stats.detail,
            "rasterized area"
        );
        stats
    }
}

/// Splits `total` across species in proportion to `weights`, rounding by
/// largest remainder so the parts always sum to `total`.
pub fn split_density(total: u16, weights: &[f64]) -> Vec<u16> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }
    let sum: f64 = weights.iter().sum();
    let mut out = vec![0u16; n];
    if !(sum > 0.0) {
        out[0] = total;
        return out;
    }

    let exact: Vec<f64> = weights.iter().map(|w| w / sum * total as f64).collect();
    for (o, e) in out.iter_mut().zip(&exact) {
        *o = e.floor() as u16;
    }
    let assigned: u32 = out.iter().map(|&c| c as u32).sum();
    let mut order: Vec<usize> = (0..n).collect();
    let frac = |i: usize| exact[i] - exact[i].floor();
    order.sort_by(|&a, &b| frac(b).total_cmp(&frac(a)).then(a.cmp(&b)));
    let missing = (total as u32).saturating_sub(assigned) as usize;
    for &i in order.iter().take(missing) {
        out[i] += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{AreaLayer, SampleGrid, split_density};
    use crate::classify::FeatureClass;
    use crate::config::VegetationConfig;
    use crate::layer::{ElementKind, Feature, Geometry, VegetationLayer};
    use crate::polygon::Polygon;
    use foundation::bounds::Aabb2;
    use foundation::math::{GeoPoint, Vec2, Vec3};
    use pretty_assertions::assert_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::path::Path;
    use terrain::TerrainContainer;

    fn container() -> TerrainContainer {
        TerrainContainer::new(
            [2, 2],
            Vec3::new(50.0, 2.0, 50.0),
            GeoPoint::new(47.0, 8.0),
            GeoPoint::new(46.0, 9.0),
            9,
            Path::new("dem.flt"),
        )
    }

    fn square(min: Vec2, side: f64) -> Polygon {
        Polygon::new(vec![
            min,
            Vec2::new(min.x + side, min.z),
            Vec2::new(min.x + side, min.z + side),
            Vec2::new(min.x, min.z + side),
            min,
        ])
    }

    fn area(id: &str, class: FeatureClass, polygon: Polygon) -> Feature {
        Feature {
            kind: ElementKind::Way,
            id: id.to_string(),
            class,
            geometry: Geometry::Area(polygon),
        }
    }

    fn total_instances(c: &TerrainContainer) -> usize {
        c.tiles().iter().map(|(_, t)| t.instances.len()).sum()
    }

    #[test]
    fn grid_rounds_extent_over_density() {
        let b = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 4.4));
        let g = SampleGrid::new(b, 2.0);
        assert_eq!((g.cells_x, g.cells_z), (5, 2));
        assert_eq!(g.cell_count(), 10);
        assert_eq!(g.center(0, 0), Vec2::new(1.0, 1.1));
    }

    #[test]
    fn square_forest_count_matches_side_over_density_squared() {
        let mut c = container();
        let config = VegetationConfig {
            density: 2.0,
            ..VegetationConfig::default()
        };
        let layer = AreaLayer::new(&config);
        let side = 40.0;
        let feature = area("f", FeatureClass::Forest, square(Vec2::new(30.0, 30.0), side));
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let stats = layer.rasterize(&feature, &mut c, &mut rng);

        let expected = (side / config.density).powi(2);
        let placed = total_instances(&c) as f64;
        assert_eq!(stats.instances, total_instances(&c));
        assert!(
            (placed - expected).abs() <= expected * 0.05,
            "placed {placed}, expected about {expected}"
        );
        // The square straddles all four tiles.
        assert!(c.tiles().iter().all(|(_, t)| !t.instances.is_empty()));
    }

    #[test]
    fn samples_outside_container_are_dropped() {
        let mut c = container();
        let config = VegetationConfig {
            density: 2.0,
            ..VegetationConfig::default()
        };
        let layer = AreaLayer::new(&config);
        let feature = area("f", FeatureClass::Forest, square(Vec2::new(80.0, 80.0), 40.0));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let stats = layer.rasterize(&feature, &mut c, &mut rng);
        // Only the 11 x 11 cells reaching into the container are drawn.
        assert_eq!(stats.samples, 121);
        assert_eq!(stats.instances, 100);
        for (_, tile) in c.tiles().iter() {
            for inst in &tile.instances {
                assert!(inst.position.x >= 0.0 && inst.position.x <= 50.0);
                assert!(inst.position.z >= 0.0 && inst.position.z <= 50.0);
            }
        }
    }

    #[test]
    fn far_away_area_draws_no_samples() {
        let mut c = container();
        let layer = AreaLayer::new(&VegetationConfig::default());
        let feature = area("f", FeatureClass::Grass, square(Vec2::new(1000.0, -500.0), 400.0));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let stats = layer.rasterize(&feature, &mut c, &mut rng);
        assert_eq!(stats.samples, 0);
        assert_eq!(stats.detail, 0);
    }

    #[test]
    fn clip_keeps_cells_touching_the_area() {
        let g = SampleGrid::new(Aabb2::new(Vec2::new(80.0, 0.0), Vec2::new(120.0, 40.0)), 2.0);
        let (cols, rows) = g.clip(&Aabb2::new(Vec2::new(-1.0, -1.0), Vec2::new(101.0, 101.0)));
        assert_eq!(cols, 0..11);
        assert_eq!(rows, 0..20);
        let (cols, _) = g.clip(&Aabb2::new(Vec2::new(200.0, 0.0), Vec2::new(300.0, 10.0)));
        assert!(cols.is_empty());
    }

    #[test]
    fn holes_receive_nothing() {
        let mut c = container();
        let config = VegetationConfig {
            density: 1.0,
            ..VegetationConfig::default()
        };
        let layer = AreaLayer::new(&config);
        let outer = square(Vec2::new(0.0, 0.0), 20.0);
        let hole = square(Vec2::new(5.0, 5.0), 10.0);
        let feature = area(
            "f",
            FeatureClass::Forest,
            Polygon::with_holes(outer.outer, vec![hole.outer]),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        layer.rasterize(&feature, &mut c, &mut rng);
        let tile = c.tile(0, 0).expect("tile");
        assert!(tile.instances.iter().all(|i| {
            let (x, z) = (i.position.x, i.position.z);
            !(x > 5.0 && x < 15.0 && z > 5.0 && z < 15.0)
        }));
        let placed = tile.instances.len() as f64;
        assert!((placed - 300.0).abs() <= 15.0, "placed {placed}");
    }

    #[test]
    fn grass_adds_exact_density_per_accepted_sample() {
        let mut c = container();
        let config = VegetationConfig {
            density: 2.0,
            detail_density: 10,
            detail_resolution: 8,
            grass_species: vec!["grass".to_string(), "clover".to_string(), "fern".to_string()],
            ..VegetationConfig::default()
        };
        let layer = AreaLayer::new(&config);
        let feature = area("g", FeatureClass::Grass, square(Vec2::new(2.0, 2.0), 20.0));
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let stats = layer.rasterize(&feature, &mut c, &mut rng);

        let tile = c.tile(0, 0).expect("tile");
        assert!(tile.instances.is_empty());
        let total: u64 = tile.detail_layers.iter().map(|l| l.total()).sum();
        assert_eq!(total, stats.detail);
        assert_eq!(stats.detail % 10, 0);
        assert_eq!(stats.detail / 10, 100);
        assert!(tile.detail_layers.iter().all(|l| l.resolution == 8));
    }

    #[test]
    fn split_always_sums_to_total() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for total in [0u16, 1, 7, 16, 255] {
            for n in 1..5 {
                let draws: Vec<f64> = (0..n).map(|_| rng.random::<f64>()).collect();
                let parts = split_density(total, &draws);
                assert_eq!(parts.len(), n);
                assert_eq!(parts.iter().map(|&p| p as u32).sum::<u32>(), total as u32);
            }
        }
        assert_eq!(split_density(9, &[0.0, 0.0]), vec![9, 0]);
        assert_eq!(split_density(10, &[1.0, 1.0]), vec![5, 5]);
        assert!(split_density(4, &[]).is_empty());
    }
}
