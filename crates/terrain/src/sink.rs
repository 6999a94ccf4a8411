use crate::container::TerrainContainer;

/// Receives the finished terrain at the end of a run.
///
/// This is the boundary to whatever turns tiles into renderable surfaces.
pub trait TerrainSink {
    fn receive(&mut self, container: TerrainContainer);
}

/// Holds finished terrains until the caller takes them.
#[derive(Debug, Default)]
pub struct CollectingSink {
    finished: Vec<TerrainContainer>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.finished.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finished.is_empty()
    }

    /// Most recently finished terrain.
    pub fn take_latest(&mut self) -> Option<TerrainContainer> {
        self.finished.pop()
    }
}

impl TerrainSink for CollectingSink {
    fn receive(&mut self, container: TerrainContainer) {
        self.finished.push(container);
    }
}
