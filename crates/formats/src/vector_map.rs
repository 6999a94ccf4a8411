use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use foundation::math::GeoPoint;
use tracing::{debug, warn};

use crate::number::parse_f64;

#[derive(Debug)]
pub enum VectorMapError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Xml(roxmltree::Error),
    InvalidElement {
        element: &'static str,
        id: String,
        reason: String,
    },
}

impl fmt::Display for VectorMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorMapError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            VectorMapError::Xml(err) => write!(f, "map document is not valid XML: {err}"),
            VectorMapError::InvalidElement {
                element,
                id,
                reason,
            } => write!(f, "invalid {element} {id}: {reason}"),
        }
    }
}

impl std::error::Error for VectorMapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VectorMapError::Io { source, .. } => Some(source),
            VectorMapError::Xml(err) => Some(err),
            VectorMapError::InvalidElement { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Key/value lookups shared by every map element.
pub trait Tagged {
    fn tags(&self) -> &[Tag];

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags()
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    fn has_tag(&self, key: &str, value: &str) -> bool {
        self.tag(key) == Some(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub position: GeoPoint,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Way {
    pub id: String,
    pub node_refs: Vec<String>,
    pub tags: Vec<Tag>,
    /// Inner rings, as node references.
    pub holes: Vec<Vec<String>>,
}

impl Way {
    /// A way whose first and last reference coincide is an area ring.
    pub fn is_closed(&self) -> bool {
        self.node_refs.len() >= 4 && self.node_refs.first() == self.node_refs.last()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Node,
    Way,
    Relation,
    Other(String),
}

impl MemberKind {
    fn parse(s: &str) -> Self {
        match s {
            "node" => MemberKind::Node,
            "way" => MemberKind::Way,
            "relation" => MemberKind::Relation,
            other => MemberKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub kind: MemberKind,
    pub reference: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: String,
    pub members: Vec<Member>,
    pub tags: Vec<Tag>,
}

impl Tagged for Node {
    fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

impl Tagged for Way {
    fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

impl Tagged for Relation {
    fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

/// Parsed vector map: nodes, ways and relations keyed by id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorDocument {
    nodes: BTreeMap<String, Node>,
    ways: BTreeMap<String, Way>,
    relations: Vec<Relation>,
}

impl VectorDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VectorMapError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| VectorMapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = Self::parse(&text)?;
        debug!(
            path = %path.display(),
            nodes = doc.nodes.len(),
            ways = doc.ways.len(),
            relations = doc.relations.len(),
            "loaded vector map"
        );
        Ok(doc)
    }

    pub fn parse(text: &str) -> Result<Self, VectorMapError> {
        let xml = roxmltree::Document::parse(text).map_err(VectorMapError::Xml)?;
        let mut doc = VectorDocument::default();
        let mut relation_ids = BTreeSet::new();

        for el in xml.root_element().children().filter(|n| n.is_element()) {
            let element = el.tag_name().name();
            let Some(id) = el.attribute("id") else {
                if matches!(element, "node" | "way" | "relation") {
                    warn!(element, "skipping element without id");
                }
                continue;
            };

            match element {
                "node" => {
                    if doc.nodes.contains_key(id) {
                        continue;
                    }
                    let coord = |attr: &str| -> Result<f64, VectorMapError> {
                        let raw = el.attribute(attr).ok_or_else(|| {
                            VectorMapError::InvalidElement {
                                element: "node",
                                id: id.to_string(),
                                reason: format!("missing {attr}"),
                            }
                        })?;
                        parse_f64(raw).map_err(|e| VectorMapError::InvalidElement {
                            element: "node",
                            id: id.to_string(),
                            reason: e.to_string(),
                        })
                    };
                    let position = GeoPoint::new(coord("lat")?, coord("lon")?);
                    doc.nodes.insert(
                        id.to_string(),
                        Node {
                            id: id.to_string(),
                            position,
                            tags: child_tags(el),
                        },
                    );
                }
                "way" => {
                    if doc.ways.contains_key(id) {
                        continue;
                    }
                    let node_refs = el
                        .children()
                        .filter(|c| c.has_tag_name("nd"))
                        .filter_map(|c| c.attribute("ref").map(str::to_string))
                        .collect();
                    doc.ways.insert(
                        id.to_string(),
                        Way {
                            id: id.to_string(),
                            node_refs,
                            tags: child_tags(el),
                            holes: Vec::new(),
                        },
                    );
                }
                "relation" => {
                    if !relation_ids.insert(id.to_string()) {
                        continue;
                    }
                    let members = el
                        .children()
                        .filter(|c| c.has_tag_name("member"))
                        .filter_map(|c| {
                            Some(Member {
                                kind: MemberKind::parse(c.attribute("type")?),
                                reference: c.attribute("ref")?.to_string(),
                                role: c.attribute("role").unwrap_or_default().to_string(),
                            })
                        })
                        .collect();
                    doc.relations.push(Relation {
                        id: id.to_string(),
                        members,
                        tags: child_tags(el),
                    });
                }
                _ => {}
            }
        }

        doc.resolve_multipolygons();
        Ok(doc)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.ways.values()
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn way(&self, id: &str) -> Option<&Way> {
        self.ways.get(id)
    }

    pub fn insert_node(&mut self, node: Node) {
        self.nodes.entry(node.id.clone()).or_insert(node);
    }

    pub fn insert_way(&mut self, way: Way) {
        self.ways.entry(way.id.clone()).or_insert(way);
    }

    /// Positions of `refs`; references to unknown nodes are skipped.
    pub fn resolve(&self, refs: &[String]) -> Vec<GeoPoint> {
        refs.iter()
            .filter_map(|r| self.nodes.get(r))
            .map(|n| n.position)
            .collect()
    }

    /// Attaches the `inner` rings of multipolygon relations to their `outer`
    /// ways. Untagged outer ways inherit the relation's tags.
    pub fn resolve_multipolygons(&mut self) {
        for rel in &self.relations {
            if !rel.has_tag("type", "multipolygon") {
                continue;
            }
            let ways_with_role = |role: &str| -> Vec<&str> {
                rel.members
                    .iter()
                    .filter(|m| m.kind == MemberKind::Way && m.role == role)
                    .map(|m| m.reference.as_str())
                    .collect()
            };
            let holes: Vec<Vec<String>> = ways_with_role("inner")
                .into_iter()
                .filter_map(|id| self.ways.get(id).map(|w| w.node_refs.clone()))
                .collect();

            for outer in ways_with_role("outer") {
                let Some(way) = self.ways.get_mut(outer) else {
                    continue;
                };
                for hole in &holes {
                    if !way.holes.contains(hole) {
                        way.holes.push(hole.clone());
                    }
                }
                if way.tags.is_empty() {
                    way.tags = rel
                        .tags
                        .iter()
                        .filter(|t| t.key != "type")
                        .cloned()
                        .collect();
                }
            }
        }
    }
}

fn child_tags(el: roxmltree::Node<'_, '_>) -> Vec<Tag> {
    el.children()
        .filter(|c| c.has_tag_name("tag"))
        .filter_map(|c| Some(Tag::new(c.attribute("k")?, c.attribute("v")?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{MemberKind, Tag, Tagged, VectorDocument, VectorMapError};
    use foundation::math::GeoPoint;
    use pretty_assertions::assert_eq;

    const MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="46.0" lon="7.0"><tag k="natural" v="tree"/></node>
  <node id="2" lat="46,001" lon="7,001"/>
  <node id="3" lat="46.002" lon="7.0"/>
  <node id="1" lat="0" lon="0"/>
  <way id="10">
    <nd ref="1"/><nd ref="2"/><nd ref="3"/><nd ref="99"/><nd ref="1"/>
    <tag k="landuse" v="forest"/>
  </way>
  <way id="11"><nd ref="2"/><nd ref="3"/></way>
  <way id="10"><nd ref="3"/></way>
  <relation id="100">
    <member type="way" ref="10" role="outer"/>
    <member type="way" ref="11" role="inner"/>
    <member type="node" ref="1" role=""/>
    <tag k="type" v="multipolygon"/>
  </relation>
</osm>"#;

    #[test]
    fn parses_elements_with_first_occurrence_winning() {
        let doc = VectorDocument::parse(MAP).expect("parse");
        assert_eq!(doc.nodes().count(), 3);
        assert_eq!(doc.ways().count(), 2);
        assert_eq!(doc.relations().len(), 1);

        let n1 = doc.node("1").expect("node 1");
        assert_eq!(n1.position, GeoPoint::new(46.0, 7.0));
        assert!(n1.has_tag("natural", "tree"));
        assert_eq!(doc.node("2").expect("node 2").position, GeoPoint::new(46.001, 7.001));

        let w = doc.way("10").expect("way 10");
        assert_eq!(w.node_refs, vec!["1", "2", "3", "99", "1"]);
        assert_eq!(w.tag("landuse"), Some("forest"));
        assert!(w.is_closed());
    }

    #[test]
    fn resolve_skips_unknown_references() {
        let doc = VectorDocument::parse(MAP).expect("parse");
        let pts = doc.resolve(&doc.way("10").expect("way").node_refs);
        assert_eq!(pts.len(), 4);
    }

    #[test]
    fn multipolygon_inner_ways_become_holes() {
        let doc = VectorDocument::parse(MAP).expect("parse");
        let outer = doc.way("10").expect("outer");
        assert_eq!(outer.holes, vec![vec!["2".to_string(), "3".to_string()]]);

        let rel = &doc.relations()[0];
        assert_eq!(rel.members.len(), 3);
        assert_eq!(rel.members[2].kind, MemberKind::Node);
    }

    #[test]
    fn untagged_outer_inherits_relation_tags() {
        let doc = VectorDocument::parse(
            r#"<osm>
  <way id="5"><nd ref="a"/></way>
  <relation id="6">
    <member type="way" ref="5" role="outer"/>
    <tag k="type" v="multipolygon"/><tag k="leisure" v="park"/>
  </relation>
</osm>"#,
        )
        .expect("parse");
        assert_eq!(doc.way("5").expect("way").tags, vec![Tag::new("leisure", "park")]);
    }

    #[test]
    fn malformed_coordinates_are_rejected() {
        let err = VectorDocument::parse(r#"<osm><node id="7" lat="north" lon="1"/></osm>"#)
            .expect_err("bad lat");
        assert!(matches!(err, VectorMapError::InvalidElement { element: "node", .. }));

        let err = VectorDocument::parse("<osm><node").expect_err("bad xml");
        assert!(matches!(err, VectorMapError::Xml(_)));
    }
}
