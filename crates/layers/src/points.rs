use foundation::math::Vec2;
use rand_chacha::ChaCha8Rng;
use terrain::TerrainContainer;
use tracing::trace;

use crate::classify::FeatureClass;
use crate::config::VegetationConfig;
use crate::layer::{
    Feature, Geometry, LayerStats, VegetationLayer, jittered_scale, pick_species, place_instance,
};

/// Single trees and trees along lines.
#[derive(Debug, Clone)]
pub struct PointLayer {
    species: Vec<String>,
    base_scale: f32,
    scale_jitter: f32,
    line_spacing: f64,
}

impl PointLayer {
    pub fn new(config: &VegetationConfig) -> Self {
        Self {
            species: config.tree_species.clone(),
            base_scale: config.base_scale,
            scale_jitter: config.scale_jitter,
            line_spacing: config.line_spacing,
        }
    }

    fn place(
        &self,
        points: &[Vec2],
        container: &mut TerrainContainer,
        rng: &mut ChaCha8Rng,
    ) -> LayerStats {
        let mut stats = LayerStats::default();
        for &p in points {
            let Some(species) = pick_species(rng, &self.species) else {
                break;
            };
            let scale = jittered_scale(rng, self.base_scale, self.scale_jitter);
            stats.samples += 1;
            if place_instance(container, p, species, scale) {
                stats.instances += 1;
            }
        }
        stats
    }
}

impl VegetationLayer for PointLayer {
    fn name(&self) -> &'static str {
        "points"
    }

    fn accepts(&self, class: FeatureClass) -> bool {
        matches!(class, FeatureClass::Tree | FeatureClass::TreeRow)
    }

    fn rasterize(
        &self,
        feature: &Feature,
        container: &mut TerrainContainer,
        rng: &mut ChaCha8Rng,
    ) -> LayerStats {
        let stats = match &feature.geometry {
            Geometry::Point(p) => self.place(&[*p], container, rng),
            Geometry::Line(line) => {
                let samples = sample_line(line, self.line_spacing);
                self.place(&samples, container, rng)
            }
            Geometry::Area(_) => LayerStats::default(),
        };
        trace!(id = %feature.id, instances = stats.instances, "placed point feature");
        stats
    }
}

/// Points every `spacing` along a polyline, starting at its first vertex.
/// The distance carries over vertices.
pub fn sample_line(line: &[Vec2], spacing: f64) -> Vec<Vec2> {
    let mut out = Vec::new();
    let Some(&first) = line.first() else {
        return out;
    };
    out.push(first);
    // Distance walked since the last emitted sample.
    let mut carry = 0.0;
    for pair in line.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = a.distance(b);
        if len <= 0.0 {
            continue;
        }
        let mut t = spacing - carry;
        while t <= len {
            out.push(a.lerp(b, t / len));
            t += spacing;
        }
        carry = len - (t - spacing);
    }
    out
}
