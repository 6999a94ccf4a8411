use foundation::bounds::Aabb2;
use foundation::math::Vec2;

/// Area outline in world space with optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub outer: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

impl Polygon {
    pub fn new(outer: Vec<Vec2>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Vec<Vec2>, holes: Vec<Vec<Vec2>>) -> Self {
        Self { outer, holes }
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        Aabb2::from_points(&self.outer)
    }

    /// Even-odd test against the outer ring, minus every hole.
    pub fn contains(&self, p: Vec2) -> bool {
        ring_contains(&self.outer, p) && !self.holes.iter().any(|h| ring_contains(h, p))
    }
}

/// Ray casting towards `+x`. A repeated closing vertex is harmless.
pub fn ring_contains(ring: &[Vec2], p: Vec2) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.z > p.z) != (b.z > p.z) {
            let x_cross = a.x + (p.z - a.z) / (b.z - a.z) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
