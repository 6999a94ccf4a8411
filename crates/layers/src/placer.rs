use formats::{Tagged, VectorDocument};
use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use terrain::TerrainContainer;
use tracing::{debug, info, warn};

use crate::areas::AreaLayer;
use crate::classify::{FeatureClass, classify_node, classify_way};
use crate::config::{ConfigError, VegetationConfig};
use crate::layer::{ElementKind, Feature, Geometry, LayerStats, VegetationLayer};
use crate::points::PointLayer;
use crate::polygon::Polygon;

/// Outcome of one placement run.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PlacementReport {
    pub features: usize,
    /// Already rasterized by an earlier run on one of the touched tiles.
    pub duplicates: usize,
    /// Entirely outside the container.
    pub outside: usize,
    pub stats: LayerStats,
}

/// Turns classified map features into tile instances and detail layers.
pub struct VegetationPlacer {
    config: VegetationConfig,
    rng: ChaCha8Rng,
    layers: Vec<Box<dyn VegetationLayer>>,
}

impl VegetationPlacer {
    pub fn new(config: VegetationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let layers: Vec<Box<dyn VegetationLayer>> = vec![
            Box::new(PointLayer::new(&config)),
            Box::new(AreaLayer::new(&config)),
        ];
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            layers,
        })
    }

    pub fn config(&self) -> &VegetationConfig {
        &self.config
    }

    /// Classified features of `doc` in container world space, nodes first,
    /// each group in id order.
    pub fn features(doc: &VectorDocument, container: &TerrainContainer) -> Vec<Feature> {
        let to_world = |refs: &[String]| -> Vec<Vec2> {
            doc.resolve(refs)
                .into_iter()
                .map(|g| container.geo_to_world(g))
                .collect()
        };

        let mut out = Vec::new();
        for node in doc.nodes() {
            if let Some(class) = classify_node(node) {
                out.push(Feature {
                    kind: ElementKind::Node,
                    id: node.id.clone(),
                    class,
                    geometry: Geometry::Point(container.geo_to_world(node.position)),
                });
            }
        }

        for way in doc.ways() {
            let Some(class) = classify_way(way) else {
                continue;
            };
            let points = to_world(way.node_refs.as_slice());
            let geometry = match class {
                FeatureClass::TreeRow if points.len() >= 2 => Geometry::Line(points),
                FeatureClass::Forest | FeatureClass::Grass if points.len() >= 3 => {
                    let holes = way
                        .holes
                        .iter()
                        .map(|h| to_world(h.as_slice()))
                        .filter(|h| h.len() >= 3)
                        .collect();
                    Geometry::Area(Polygon::with_holes(points, holes))
                }
                _ => {
                    warn!(
                        id = %way.id,
                        resolved = points.len(),
                        name = way.tag("name").unwrap_or(""),
                        "skipping way with too few known nodes"
                    );
                    continue;
                }
            };
            out.push(Feature {
                kind: ElementKind::Way,
                id: way.id.clone(),
                class,
                geometry,
            });
        }
        out
    }

    /// Rasterizes every vegetation feature of `doc` onto `container`.
    pub fn place(&mut self, doc: &VectorDocument, container: &mut TerrainContainer) -> PlacementReport {
        let features = Self::features(doc, container);
        let mut report = PlacementReport::default();
        for feature in &features {
            match self.place_feature(feature, container) {
                FeatureOutcome::Placed(stats) => {
                    report.features += 1;
                    report.stats += stats;
                }
                FeatureOutcome::Duplicate => report.duplicates += 1,
                FeatureOutcome::Outside => report.outside += 1,
            }
        }
        info!(
            features = report.features,
            duplicates = report.duplicates,
            outside = report.outside,
            instances = report.stats.instances,
            detail = report.stats.detail,
            "vegetation placed"
        );
        report
    }

    /// Rasterizes one feature unless a tile it touches already holds it.
    /// Afterwards every touched tile records the id.
    pub fn place_feature(&mut self, feature: &Feature, container: &mut TerrainContainer) -> FeatureOutcome {
        let Some(bounds) = feature.geometry.bounds() else {
            return FeatureOutcome::Outside;
        };
        let touched = touched_tiles(container, &bounds);
        if touched.is_empty() {
            debug!(id = %feature.id, "feature outside terrain");
            return FeatureOutcome::Outside;
        }
        let key = feature.key();
        let created = touched.iter().any(|&(x, y)| {
            container
                .tile(x, y)
                .is_some_and(|t| t.already_created.contains(&key))
        });
        if created {
            return FeatureOutcome::Duplicate;
        }

        let mut stats = LayerStats::default();
        for layer in self.layers.iter().filter(|l| l.accepts(feature.class)) {
            stats += layer.rasterize(feature, container, &mut self.rng);
        }
        for (x, y) in touched {
            if let Some(tile) = container.tile_mut(x, y) {
                tile.already_created.insert(key.clone());
            }
        }
        FeatureOutcome::Placed(stats)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FeatureOutcome {
    Placed(LayerStats),
    Duplicate,
    Outside,
}

fn touched_tiles(container: &TerrainContainer, bounds: &Aabb2) -> Vec<(usize, usize)> {
    container
        .tiles()
        .iter()
        .filter(|(_, tile)| tile.bounds().intersects(bounds))
        .map(|(index, _)| index)
        .collect()
}
