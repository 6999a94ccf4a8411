use foundation::bounds::Aabb2;
use foundation::math::{Vec2, Vec3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use terrain::{PlacedInstance, TerrainContainer};

use crate::classify::FeatureClass;
use crate::polygon::Polygon;

/// Feature geometry converted to container world space.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Vec2),
    Line(Vec<Vec2>),
    Area(Polygon),
}

impl Geometry {
    pub fn bounds(&self) -> Option<Aabb2> {
        match self {
            Geometry::Point(p) => Some(Aabb2::new(*p, *p)),
            Geometry::Line(points) => Aabb2::from_points(points),
            Geometry::Area(polygon) => polygon.bounds(),
        }
    }
}

/// Map element a feature was built from. Node and way ids are separate
/// sequences.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
}

/// A classified map element ready for rasterization.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: ElementKind,
    /// Map element id, unique per element kind.
    pub id: String,
    pub class: FeatureClass,
    pub geometry: Geometry,
}

impl Feature {
    /// Id qualified by element kind, e.g. `n7` or `w7`.
    pub fn key(&self) -> String {
        let prefix = match self.kind {
            ElementKind::Node => 'n',
            ElementKind::Way => 'w',
        };
        format!("{prefix}{}", self.id)
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct LayerStats {
    /// Candidate positions drawn.
    pub samples: usize,
    pub instances: usize,
    /// Sum of detail counts added.
    pub detail: u64,
}

impl std::ops::AddAssign for LayerStats {
    fn add_assign(&mut self, other: Self) {
        self.samples += other.samples;
        self.instances += other.instances;
        self.detail += other.detail;
    }
}

/// One rasterization strategy, picked per feature class.
pub trait VegetationLayer {
    fn name(&self) -> &'static str;

    fn accepts(&self, class: FeatureClass) -> bool;

    fn rasterize(
        &self,
        feature: &Feature,
        container: &mut TerrainContainer,
        rng: &mut ChaCha8Rng,
    ) -> LayerStats;
}

/// Drops an instance on the tile covering world point `p`, resting on the
/// height field. Returns `false` outside the container.
pub fn place_instance(container: &mut TerrainContainer, p: Vec2, species: &str, scale: f32) -> bool {
    let Some((x, y)) = container.tile_index_at(p) else {
        return false;
    };
    let Some(tile) = container.tile_mut(x, y) else {
        return false;
    };
    let local = tile.to_local(p);
    let height = tile.sample_height(local);
    tile.instances.push(PlacedInstance {
        species: species.to_string(),
        position: Vec3::new(local.x, height, local.z),
        scale,
    });
    true
}

pub fn jittered_scale(rng: &mut ChaCha8Rng, base: f32, jitter: f32) -> f32 {
    base * (1.0 + rng.random_range(-jitter..=jitter))
}

pub fn pick_species<'a>(rng: &mut ChaCha8Rng, species: &'a [String]) -> Option<&'a str> {
    if species.is_empty() {
        return None;
    }
    Some(species[rng.random_range(0..species.len())].as_str())
}
