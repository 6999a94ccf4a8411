use formats::{Node, Tagged, Way};

/// Vegetation kind a map feature stands for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FeatureClass {
    /// A single tree node.
    Tree,
    /// Trees along a line: tree rows and hedges.
    TreeRow,
    /// Wood-like area filled with tree instances.
    Forest,
    /// Grass-like area filled through detail layers.
    Grass,
}

/// How accepted samples of a class end up on a tile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Placement {
    Instances,
    Detail,
}

impl FeatureClass {
    pub fn placement(self) -> Placement {
        match self {
            FeatureClass::Grass => Placement::Detail,
            FeatureClass::Tree | FeatureClass::TreeRow | FeatureClass::Forest => {
                Placement::Instances
            }
        }
    }

    pub fn is_area(self) -> bool {
        matches!(self, FeatureClass::Forest | FeatureClass::Grass)
    }
}

const FOREST_TAGS: [(&str, &str); 3] = [
    ("landuse", "forest"),
    ("natural", "wood"),
    ("natural", "scrub"),
];

const GRASS_TAGS: [(&str, &str); 5] = [
    ("landuse", "grass"),
    ("landuse", "meadow"),
    ("natural", "grassland"),
    ("natural", "heath"),
    ("leisure", "park"),
];

pub fn classify_node(node: &Node) -> Option<FeatureClass> {
    node.has_tag("natural", "tree").then_some(FeatureClass::Tree)
}

/// Areas need a closed ring; open ways only qualify as lines.
pub fn classify_way(way: &Way) -> Option<FeatureClass> {
    if way.has_tag("natural", "tree_row") || way.has_tag("barrier", "hedge") {
        return Some(FeatureClass::TreeRow);
    }
    if !way.is_closed() {
        return None;
    }
    if FOREST_TAGS.iter().any(|(k, v)| way.has_tag(k, v)) {
        return Some(FeatureClass::Forest);
    }
    if GRASS_TAGS.iter().any(|(k, v)| way.has_tag(k, v)) {
        return Some(FeatureClass::Grass);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{FeatureClass, Placement, classify_node, classify_way};
    use formats::{Node, Tag, Way};
    use foundation::math::GeoPoint;

    fn way(refs: &[&str], tags: &[(&str, &str)]) -> Way {
        Way {
            id: "w".to_string(),
            node_refs: refs.iter().map(|r| r.to_string()).collect(),
            tags: tags.iter().map(|(k, v)| Tag::new(*k, *v)).collect(),
            holes: Vec::new(),
        }
    }

    #[test]
    fn tree_nodes_are_points() {
        let node = Node {
            id: "n".to_string(),
            position: GeoPoint::new(46.0, 8.0),
            tags: vec![Tag::new("natural", "tree")],
        };
        assert_eq!(classify_node(&node), Some(FeatureClass::Tree));
    }

    #[test]
    fn closed_rings_become_areas() {
        let ring = ["a", "b", "c", "a"];
        assert_eq!(
            classify_way(&way(&ring, &[("landuse", "forest")])),
            Some(FeatureClass::Forest)
        );
        assert_eq!(
            classify_way(&way(&ring, &[("leisure", "park")])),
            Some(FeatureClass::Grass)
        );
        assert_eq!(classify_way(&way(&["a", "b", "c"], &[("landuse", "forest")])), None);
        assert_eq!(classify_way(&way(&ring, &[("building", "yes")])), None);
    }

    #[test]
    fn hedges_are_lines_even_when_closed() {
        let class = classify_way(&way(&["a", "b", "a"], &[("barrier", "hedge")]));
        assert_eq!(class, Some(FeatureClass::TreeRow));
        assert_eq!(FeatureClass::TreeRow.placement(), Placement::Instances);
        assert_eq!(FeatureClass::Grass.placement(), Placement::Detail);
    }
}
