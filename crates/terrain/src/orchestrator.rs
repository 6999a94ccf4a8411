use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use formats::{ElevationError, ElevationGrid, detect_texture_layout, texture_dir_for};
use foundation::math::Vec3;
use runtime::{EventBus, EventKind, FINISHED_PHASE, Tick};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, GenerationConfig, TextureMode};
use crate::container::{TerrainContainer, terrain_height};
use crate::heightmap::{HeightmapGenerator, HeightmapProgress};
use crate::sink::{CollectingSink, TerrainSink};
use crate::stitch::{EdgeStitcher, SeamBlendStitcher, StitchError};
use crate::texture::{TextureAssigner, TextureError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GenerationPhase {
    Idle,
    CheckFile,
    LoadElevation,
    GenerateTerrains,
    GenerateHeightmaps,
    RepareTerrains,
    GenerateTextures,
    Finish,
}

impl GenerationPhase {
    pub fn name(self) -> &'static str {
        match self {
            GenerationPhase::Idle => "Idle",
            GenerationPhase::CheckFile => "CheckFile",
            GenerationPhase::LoadElevation => "LoadElevation",
            GenerationPhase::GenerateTerrains => "GenerateTerrains",
            GenerationPhase::GenerateHeightmaps => "GenerateHeightmaps",
            GenerationPhase::RepareTerrains => "RepareTerrains",
            GenerationPhase::GenerateTextures => "GenerateTextures",
            GenerationPhase::Finish => "Finish",
        }
    }

    /// Successor in the linear pipeline.
    pub fn next(self) -> Self {
        match self {
            GenerationPhase::Idle => GenerationPhase::CheckFile,
            GenerationPhase::CheckFile => GenerationPhase::LoadElevation,
            GenerationPhase::LoadElevation => GenerationPhase::GenerateTerrains,
            GenerationPhase::GenerateTerrains => GenerationPhase::GenerateHeightmaps,
            GenerationPhase::GenerateHeightmaps => GenerationPhase::RepareTerrains,
            GenerationPhase::RepareTerrains => GenerationPhase::GenerateTextures,
            GenerationPhase::GenerateTextures => GenerationPhase::Finish,
            GenerationPhase::Finish => GenerationPhase::Idle,
        }
    }
}

#[derive(Debug)]
pub enum GenerationError {
    Config(ConfigError),
    FileNotFound(PathBuf),
    Format(ElevationError),
    NoData(String),
    Stitch(StitchError),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Config(err) => write!(f, "{err}"),
            GenerationError::FileNotFound(path) => {
                write!(f, "source file not found: {}", path.display())
            }
            GenerationError::Format(err) => write!(f, "unreadable elevation data: {err}"),
            GenerationError::NoData(reason) => write!(f, "no usable elevation data: {reason}"),
            GenerationError::Stitch(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::Config(err) => Some(err),
            GenerationError::Format(err) => Some(err),
            GenerationError::Stitch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ElevationError> for GenerationError {
    fn from(err: ElevationError) -> Self {
        match err {
            ElevationError::FileNotFound { path } => GenerationError::FileNotFound(path),
            other => GenerationError::Format(other),
        }
    }
}

/// Drives one terrain generation run, a phase per [`TileOrchestrator::advance`].
///
/// The orchestrator owns every piece of run state (source grid, container,
/// stitcher, sink, events); the host only calls `start`, `advance` and
/// `cancel`, and drains events between ticks.
pub struct TileOrchestrator<K: TerrainSink = CollectingSink> {
    config: GenerationConfig,
    phase: GenerationPhase,
    source: Option<PathBuf>,
    grid: Option<ElevationGrid>,
    tiles: [usize; 2],
    container: Option<TerrainContainer>,
    heightmaps: HeightmapGenerator,
    stitcher: Box<dyn EdgeStitcher>,
    sink: K,
    events: EventBus,
    ticks: u64,
    last_error: Option<GenerationError>,
}

impl TileOrchestrator<CollectingSink> {
    pub fn new(config: GenerationConfig) -> Self {
        Self::with_parts(config, Box::new(SeamBlendStitcher), CollectingSink::new())
    }
}

impl<K: TerrainSink> TileOrchestrator<K> {
    pub fn with_parts(config: GenerationConfig, stitcher: Box<dyn EdgeStitcher>, sink: K) -> Self {
        Self {
            config,
            phase: GenerationPhase::Idle,
            source: None,
            grid: None,
            tiles: [0, 0],
            container: None,
            heightmaps: HeightmapGenerator::new(),
            stitcher,
            sink,
            events: EventBus::new(),
            ticks: 0,
            last_error: None,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase != GenerationPhase::Idle
    }

    pub fn grid(&self) -> Option<&ElevationGrid> {
        self.grid.as_ref()
    }

    /// Terrain under construction; `None` before `GenerateTerrains` and after
    /// it was handed to the sink.
    pub fn container(&self) -> Option<&TerrainContainer> {
        self.container.as_ref()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn last_error(&self) -> Option<&GenerationError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<GenerationError> {
        self.last_error.take()
    }

    /// Begins a run for `path`. Ignored while a run is in progress; refused
    /// when the configuration is invalid, with the reason in `last_error`.
    pub fn start(&mut self, path: impl AsRef<Path>) -> bool {
        if self.is_running() {
            warn!(phase = self.phase.name(), "generation already running");
            return false;
        }
        if let Err(err) = self.config.validate() {
            error!("terrain generation not started: {err}");
            self.last_error = Some(GenerationError::Config(err));
            return false;
        }
        self.source = Some(path.as_ref().to_path_buf());
        self.grid = None;
        self.container = None;
        self.heightmaps = HeightmapGenerator::new();
        self.last_error = None;
        self.phase = GenerationPhase::CheckFile;
        true
    }

    /// Aborts the run. Partially built tiles are left as they are.
    pub fn cancel(&mut self) {
        if self.is_running() {
            info!(phase = self.phase.name(), "generation cancelled");
        }
        self.phase = GenerationPhase::Idle;
    }

    /// Performs at most one phase worth of work within `budget`.
    ///
    /// Returns the phase the pipeline is in afterwards.
    pub fn advance(&mut self, budget: Duration) -> GenerationPhase {
        if self.phase == GenerationPhase::Idle {
            return self.phase;
        }
        let tick = Tick::new(self.ticks, budget);
        self.ticks += 1;

        let phase = self.phase;
        let result = match phase {
            GenerationPhase::Idle => Ok(1.0),
            GenerationPhase::CheckFile => self.check_file(),
            GenerationPhase::LoadElevation => self.load_elevation(),
            GenerationPhase::GenerateTerrains => self.generate_terrains(),
            GenerationPhase::GenerateHeightmaps => Ok(self.generate_heightmaps(tick)),
            GenerationPhase::RepareTerrains => self.repare_terrains(),
            GenerationPhase::GenerateTextures => Ok(self.generate_textures()),
            GenerationPhase::Finish => {
                self.finish(tick);
                return self.phase;
            }
        };

        match result {
            Ok(progress) => {
                self.events.progress(tick, phase.name(), progress);
                if self.phase != phase {
                    info!(from = phase.name(), to = self.phase.name(), "phase complete");
                }
            }
            Err(err) => self.fail(tick, err),
        }
        self.phase
    }

    fn source(&self) -> Result<&Path, GenerationError> {
        self.source
            .as_deref()
            .ok_or_else(|| GenerationError::FileNotFound(PathBuf::new()))
    }

    fn check_file(&mut self) -> Result<f32, GenerationError> {
        let path = self.source()?;
        if !path.is_file() {
            return Err(GenerationError::FileNotFound(path.to_path_buf()));
        }
        self.phase = GenerationPhase::LoadElevation;
        Ok(1.0)
    }

    fn load_elevation(&mut self) -> Result<f32, GenerationError> {
        let path = self.source()?.to_path_buf();
        let grid = ElevationGrid::load(&path)?;
        if !grid.has_data() {
            return Err(GenerationError::NoData(format!(
                "every sample in {} is a no-data sentinel",
                path.display()
            )));
        }

        let tiles = match detect_texture_layout(&texture_dir_for(&path)) {
            Some(layout) => [layout.columns, layout.rows],
            None => self.config.tiles,
        };
        if tiles[0] == 0 || tiles[1] == 0 {
            return Err(GenerationError::NoData(format!(
                "degenerate tile grid {}x{}",
                tiles[0], tiles[1]
            )));
        }

        debug!(tiles_x = tiles[0], tiles_y = tiles[1], "tile grid resolved");
        self.tiles = tiles;
        self.grid = Some(grid);
        self.phase = GenerationPhase::GenerateTerrains;
        Ok(1.0)
    }

    fn generate_terrains(&mut self) -> Result<f32, GenerationError> {
        let grid = self
            .grid
            .as_ref()
            .ok_or_else(|| GenerationError::NoData("elevation grid not loaded".to_string()))?;
        let world = grid.world_size();
        let height = terrain_height(
            self.config.elevation_mode,
            self.config.exaggeration,
            grid.min_elevation(),
            grid.max_elevation(),
        );
        let tile_size = Vec3::new(
            world.x / self.tiles[0] as f64,
            height,
            world.z / self.tiles[1] as f64,
        );

        let container = TerrainContainer::new(
            self.tiles,
            tile_size,
            grid.top_left(),
            grid.bottom_right(),
            self.config.heightmap_resolution,
            grid.source(),
        );
        debug!(
            tiles = container.tile_count(),
            size_x = tile_size.x,
            size_z = tile_size.z,
            height = tile_size.y,
            "allocated terrain tiles"
        );
        self.container = Some(container);
        self.heightmaps = HeightmapGenerator::new();
        self.phase = GenerationPhase::GenerateHeightmaps;
        Ok(1.0)
    }

    fn generate_heightmaps(&mut self, tick: Tick) -> f32 {
        let (Some(grid), Some(container)) = (self.grid.as_ref(), self.container.as_mut()) else {
            return 0.0;
        };
        let budget = tick.start_budget();
        match self.heightmaps.run(grid, container.tiles_mut(), &budget) {
            HeightmapProgress::Complete => {
                self.phase = GenerationPhase::RepareTerrains;
                1.0
            }
            HeightmapProgress::Suspended => self.heightmaps.progress(container.tiles()),
        }
    }

    fn repare_terrains(&mut self) -> Result<f32, GenerationError> {
        let Some(container) = self.container.as_mut() else {
            return Err(GenerationError::NoData("terrain tiles not allocated".to_string()));
        };
        let tiles = container.tiles_mut();
        self.stitcher
            .stitch(tiles, self.config.coarse_stitch)
            .map_err(GenerationError::Stitch)?;
        self.stitcher
            .stitch(tiles, self.config.fine_stitch)
            .map_err(GenerationError::Stitch)?;
        self.phase = GenerationPhase::GenerateTextures;
        Ok(1.0)
    }

    fn generate_textures(&mut self) -> f32 {
        if self.config.texture_mode == TextureMode::WithTexture
            && let (Some(path), Some(container)) = (self.source.as_deref(), self.container.as_mut())
        {
            let assigner = TextureAssigner::new(path, self.config.texture_max_dimension);
            let mut bound = 0usize;
            for (_, tile) in container.tiles_mut().iter_mut() {
                match assigner.assign(tile) {
                    Ok(()) => bound += 1,
                    Err(TextureError::Missing { tile, .. }) => {
                        warn!(x = tile.0, y = tile.1, "tile left untextured")
                    }
                    Err(err) => warn!("skipping texture: {err}"),
                }
            }
            debug!(bound, dir = %assigner.dir().display(), "textures assigned");
        }
        self.phase = GenerationPhase::Finish;
        1.0
    }

    fn finish(&mut self, tick: Tick) {
        if let Some(container) = self.container.take() {
            info!(tiles = container.tile_count(), "terrain generation finished");
            self.sink.receive(container);
        }
        self.events.progress(tick, FINISHED_PHASE, 1.0);
        if let Some(grid) = self.grid.take() {
            self.events.emit(
                tick,
                EventKind::Origin {
                    origin: grid.origin(),
                    min_elevation: grid.min_elevation(),
                    max_elevation: grid.max_elevation(),
                },
            );
        }
        self.phase = GenerationPhase::Idle;
    }

    fn fail(&mut self, tick: Tick, err: GenerationError) {
        error!(phase = self.phase.name(), "terrain generation failed: {err}");
        if let GenerationError::Format(_) = err {
            self.events.emit(
                tick,
                EventKind::ReadError {
                    message: err.to_string(),
                },
            );
        }
        self.last_error = Some(err);
        self.phase = GenerationPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::{GenerationError, GenerationPhase, TileOrchestrator};
    use crate::config::{GenerationConfig, StitchPass, TextureMode};
    use crate::container::TileArena;
    use crate::sink::CollectingSink;
    use crate::stitch::{EdgeStitcher, SeamBlendStitcher, StitchError};
    use formats::{texture_dir_for, texture_file_name};
    use pretty_assertions::assert_eq;
    use runtime::EventKind;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    const HEADER: &str = "nrows 4\nncols 6\nxllcorner 8.0\nyllcorner 46.0\nxdim 0.01\nydim 0.01\n";
    const UNLIMITED: Duration = Duration::from_secs(3600);

    fn temp_dir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("terragen_orchestrator_{label}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn write_grid(dir: &Path, samples: &[f32]) -> PathBuf {
        let path = dir.join("dem.flt");
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        fs::write(&path, bytes).expect("write samples");
        fs::write(dir.join("dem.hdr"), HEADER).expect("write header");
        path
    }

    fn ramp() -> Vec<f32> {
        (0..24).map(|i| 100.0 + i as f32 * 5.0).collect()
    }

    fn config(tiles: [usize; 2]) -> GenerationConfig {
        GenerationConfig {
            tiles,
            heightmap_resolution: 9,
            texture_mode: TextureMode::WithoutTexture,
            ..GenerationConfig::default()
        }
    }

    fn run_to_idle<K: crate::sink::TerrainSink>(
        orch: &mut TileOrchestrator<K>,
        budget: Duration,
    ) -> Vec<GenerationPhase> {
        let mut seen = vec![orch.phase()];
        for _ in 0..10_000 {
            let phase = orch.advance(budget);
            if seen.last() != Some(&phase) {
                seen.push(phase);
            }
            if phase == GenerationPhase::Idle {
                return seen;
            }
        }
        panic!("generation did not finish");
    }

    #[test]
    fn advance_while_idle_does_nothing() {
        let mut orch = TileOrchestrator::new(config([2, 2]));
        assert_eq!(orch.advance(UNLIMITED), GenerationPhase::Idle);
        assert!(orch.events_mut().events().is_empty());
    }

    #[test]
    fn phases_run_in_order_and_finish_with_origin() {
        let dir = temp_dir("order");
        let path = write_grid(&dir, &ramp());
        let mut orch = TileOrchestrator::new(config([3, 2]));
        assert!(orch.start(&path));

        let seen = run_to_idle(&mut orch, UNLIMITED);
        assert_eq!(
            seen,
            vec![
                GenerationPhase::CheckFile,
                GenerationPhase::LoadElevation,
                GenerationPhase::GenerateTerrains,
                GenerationPhase::GenerateHeightmaps,
                GenerationPhase::RepareTerrains,
                GenerationPhase::GenerateTextures,
                GenerationPhase::Finish,
                GenerationPhase::Idle,
            ]
        );

        let events = orch.events_mut().drain();
        let finished: Vec<_> = events.iter().filter(|e| e.is_completion()).collect();
        assert_eq!(finished.len(), 1);
        let origin = events.iter().find_map(|e| match &e.kind {
            EventKind::Origin {
                origin,
                min_elevation,
                max_elevation,
            } => Some((*origin, *min_elevation, *max_elevation)),
            _ => None,
        });
        let (origin, min, max) = origin.expect("origin event");
        assert_eq!((origin.lat_deg, origin.lon_deg), (46.0, 8.0));
        assert_eq!((min, max), (100.0, 215.0));

        let terrain = orch.sink_mut().take_latest().expect("terrain delivered");
        assert_eq!(terrain.tile_count(), 6);
        assert!(orch.container().is_none());
    }

    #[test]
    fn texture_layout_overrides_configured_tiles() {
        let dir = temp_dir("layout");
        let path = write_grid(&dir, &ramp());
        let textures = texture_dir_for(&path);
        fs::create_dir_all(&textures).expect("texture dir");
        for y in 0..3 {
            for x in 0..4 {
                fs::write(textures.join(texture_file_name(x, y, "png")), b"not a png")
                    .expect("write texture");
            }
        }

        let mut orch = TileOrchestrator::new(config([1, 1]));
        orch.start(&path);
        run_to_idle(&mut orch, UNLIMITED);
        let terrain = orch.sink_mut().take_latest().expect("terrain");
        assert_eq!((terrain.tiles_x(), terrain.tiles_y()), (4, 3));
        assert_eq!(terrain.tile_count(), 12);
    }

    #[test]
    fn undecodable_or_missing_textures_do_not_abort() {
        let dir = temp_dir("textures");
        let path = write_grid(&dir, &ramp());
        let textures = texture_dir_for(&path);
        fs::create_dir_all(&textures).expect("texture dir");
        fs::write(textures.join(texture_file_name(0, 0, "png")), b"garbage").expect("write");
        fs::write(textures.join(texture_file_name(1, 0, "png")), b"garbage").expect("write");

        let mut cfg = config([2, 1]);
        cfg.texture_mode = TextureMode::WithTexture;
        let mut orch = TileOrchestrator::new(cfg);
        orch.start(&path);
        run_to_idle(&mut orch, UNLIMITED);
        assert!(orch.last_error().is_none());
        let terrain = orch.sink_mut().take_latest().expect("terrain");
        assert!(terrain.tiles().iter().all(|(_, t)| t.texture.is_none()));
    }

    #[test]
    fn missing_file_resets_without_read_error() {
        let dir = temp_dir("missing");
        let mut orch = TileOrchestrator::new(config([2, 2]));
        orch.start(dir.join("absent.flt"));
        assert_eq!(orch.advance(UNLIMITED), GenerationPhase::Idle);
        assert!(matches!(
            orch.last_error(),
            Some(GenerationError::FileNotFound(_))
        ));
        assert!(
            orch.events_mut()
                .events()
                .iter()
                .all(|e| !matches!(e.kind, EventKind::ReadError { .. }))
        );
    }

    #[test]
    fn missing_header_emits_read_error() {
        let dir = temp_dir("header");
        let path = dir.join("dem.flt");
        fs::write(&path, [0u8; 96]).expect("write samples");
        let mut orch = TileOrchestrator::new(config([2, 2]));
        orch.start(&path);
        assert_eq!(orch.advance(UNLIMITED), GenerationPhase::LoadElevation);
        assert_eq!(orch.advance(UNLIMITED), GenerationPhase::Idle);
        assert!(matches!(orch.last_error(), Some(GenerationError::Format(_))));
        assert!(
            orch.events_mut()
                .events()
                .iter()
                .any(|e| matches!(e.kind, EventKind::ReadError { .. }))
        );
    }

    #[test]
    fn all_no_data_grid_is_rejected() {
        let dir = temp_dir("nodata");
        let path = write_grid(&dir, &[-9999.0; 24]);
        let mut orch = TileOrchestrator::new(config([2, 2]));
        orch.start(&path);
        run_to_idle(&mut orch, UNLIMITED);
        assert!(matches!(orch.last_error(), Some(GenerationError::NoData(_))));
        assert!(orch.sink().is_empty());
    }

    #[test]
    fn zero_budget_run_matches_unlimited_run() {
        let dir = temp_dir("chunked");
        let path = write_grid(&dir, &ramp());

        let mut quick = TileOrchestrator::new(config([3, 2]));
        quick.start(&path);
        run_to_idle(&mut quick, UNLIMITED);
        let a = quick.sink_mut().take_latest().expect("terrain");

        let mut slow = TileOrchestrator::new(config([3, 2]));
        slow.start(&path);
        run_to_idle(&mut slow, Duration::ZERO);
        let b = slow.sink_mut().take_latest().expect("terrain");

        for ((pa, ta), (pb, tb)) in a.tiles().iter().zip(b.tiles().iter()) {
            assert_eq!(pa, pb);
            assert_eq!(ta.heights(), tb.heights());
        }
        let heightmap_ticks = slow
            .events_mut()
            .events()
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    EventKind::Progress {
                        phase: "GenerateHeightmaps",
                        ..
                    }
                )
            })
            .count();
        assert!(heightmap_ticks > 1);
    }

    #[test]
    fn start_is_ignored_while_running_and_cancel_resets() {
        let dir = temp_dir("cancel");
        let path = write_grid(&dir, &ramp());
        let mut orch = TileOrchestrator::new(config([2, 2]));
        assert!(orch.start(&path));
        orch.advance(UNLIMITED);
        assert!(!orch.start(&path));

        orch.cancel();
        assert_eq!(orch.phase(), GenerationPhase::Idle);
        assert_eq!(orch.advance(UNLIMITED), GenerationPhase::Idle);
        assert!(orch.start(&path));
    }

    struct FailingStitcher;

    impl EdgeStitcher for FailingStitcher {
        fn stitch(&mut self, _tiles: &mut TileArena, _pass: StitchPass) -> Result<(), StitchError> {
            Err(StitchError::Kernel("out of memory".to_string()))
        }
    }

    #[test]
    fn stitch_failure_aborts_the_run() {
        let dir = temp_dir("stitch");
        let path = write_grid(&dir, &ramp());
        let mut orch =
            TileOrchestrator::with_parts(config([2, 2]), Box::new(FailingStitcher), CollectingSink::new());
        orch.start(&path);
        let seen = run_to_idle(&mut orch, UNLIMITED);
        assert_eq!(seen.last(), Some(&GenerationPhase::Idle));
        assert!(!seen.contains(&GenerationPhase::GenerateTextures));
        assert!(matches!(orch.last_error(), Some(GenerationError::Stitch(_))));
        assert!(orch.sink().is_empty());
    }

    #[test]
    fn default_stitcher_keeps_seams_continuous() {
        let dir = temp_dir("seams");
        let path = write_grid(&dir, &ramp());
        let mut orch =
            TileOrchestrator::with_parts(config([2, 1]), Box::new(SeamBlendStitcher), CollectingSink::new());
        orch.start(&path);
        run_to_idle(&mut orch, UNLIMITED);
        let terrain = orch.sink_mut().take_latest().expect("terrain");
        let (west, east) = (terrain.tile(0, 0).expect("west"), terrain.tile(1, 0).expect("east"));
        let res = west.resolution();
        for row in 0..res {
            assert!((west.height(res - 1, row) - east.height(0, row)).abs() < 1e-6);
        }
    }

    #[test]
    fn invalid_config_is_refused_at_start() {
        let dir = temp_dir("config");
        let path = write_grid(&dir, &ramp());
        for resolution in [0, 1] {
            let mut cfg = config([2, 2]);
            cfg.heightmap_resolution = resolution;
            let mut orch = TileOrchestrator::new(cfg);
            assert!(!orch.start(&path));
            assert_eq!(orch.phase(), GenerationPhase::Idle);
            assert!(matches!(orch.last_error(), Some(GenerationError::Config(_))));
            assert_eq!(orch.advance(UNLIMITED), GenerationPhase::Idle);
            assert!(orch.sink().is_empty());
        }
    }
}
