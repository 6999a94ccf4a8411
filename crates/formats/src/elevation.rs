use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use foundation::math::{DistanceUnit, GeoPoint, Vec2, great_circle_distance};
use tracing::debug;

use crate::number::{NumberError, parse_f64, parse_usize};

/// Samples at or below this value are treated as missing.
pub const NO_DATA_THRESHOLD: f32 = -9900.0;
/// World units per kilometer of ground distance.
pub const WORLD_UNITS_PER_KM: f64 = 10.0;
/// Extension of the header that sits next to the sample file.
pub const HEADER_EXTENSION: &str = "hdr";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ElevationErrorKind {
    FileNotFound,
    Format,
}

#[derive(Debug)]
pub enum ElevationError {
    FileNotFound { path: PathBuf },
    MissingHeader { path: PathBuf },
    MissingKey { key: &'static str },
    InvalidValue { key: String, source: NumberError },
    Truncated { expected: usize, found: usize },
    /// Dimensions whose sample buffer cannot be addressed.
    TooLarge { nrows: usize, ncols: usize },
    Io { path: PathBuf, source: std::io::Error },
}

impl ElevationError {
    pub fn kind(&self) -> ElevationErrorKind {
        match self {
            ElevationError::FileNotFound { .. } => ElevationErrorKind::FileNotFound,
            _ => ElevationErrorKind::Format,
        }
    }
}

impl fmt::Display for ElevationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElevationError::FileNotFound { path } => {
                write!(f, "elevation file not found: {}", path.display())
            }
            ElevationError::MissingHeader { path } => {
                write!(f, "elevation header not found: {}", path.display())
            }
            ElevationError::MissingKey { key } => write!(f, "header is missing key {key:?}"),
            ElevationError::InvalidValue { key, source } => {
                write!(f, "header key {key:?}: {source}")
            }
            ElevationError::Truncated { expected, found } => write!(
                f,
                "sample file too short: expected {expected} bytes, found {found}"
            ),
            ElevationError::TooLarge { nrows, ncols } => {
                write!(f, "grid of {ncols} x {nrows} samples is too large")
            }
            ElevationError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ElevationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ElevationError::InvalidValue { source, .. } => Some(source),
            ElevationError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Raster geometry parsed from the `key value` header.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationHeader {
    pub nrows: usize,
    pub ncols: usize,
    /// Longitude of the lower-left corner.
    pub xllcorner: f64,
    /// Latitude of the lower-left corner.
    pub yllcorner: f64,
    pub xdim: f64,
    pub ydim: f64,
    pub nodata_value: Option<f32>,
    pub byte_order: ByteOrder,
}

impl ElevationHeader {
    pub fn parse(text: &str) -> Result<Self, ElevationError> {
        let mut entries: BTreeMap<String, String> = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            entries
                .entry(key.to_ascii_lowercase())
                .or_insert_with(|| value.to_string());
        }

        let number = |key: &str| -> Result<Option<f64>, ElevationError> {
            entries
                .get(key)
                .map(|v| {
                    parse_f64(v).map_err(|source| ElevationError::InvalidValue {
                        key: key.to_string(),
                        source,
                    })
                })
                .transpose()
        };
        let count = |key: &'static str| -> Result<usize, ElevationError> {
            let v = entries.get(key).ok_or(ElevationError::MissingKey { key })?;
            parse_usize(v).map_err(|source| ElevationError::InvalidValue {
                key: key.to_string(),
                source,
            })
        };

        let nrows = count("nrows")?;
        let ncols = count("ncols")?;

        let cellsize = number("cellsize")?;
        let xdim = number("xdim")?
            .or(cellsize)
            .ok_or(ElevationError::MissingKey { key: "xdim" })?;
        let ydim = number("ydim")?
            .or(cellsize)
            .ok_or(ElevationError::MissingKey { key: "ydim" })?;

        // Cell-center registration is shifted onto the corner.
        let xllcorner = match number("xllcorner")? {
            Some(v) => v,
            None => number("xllcenter")?
                .map(|c| c - xdim / 2.0)
                .ok_or(ElevationError::MissingKey { key: "xllcorner" })?,
        };
        let yllcorner = match number("yllcorner")? {
            Some(v) => v,
            None => number("yllcenter")?
                .map(|c| c - ydim / 2.0)
                .ok_or(ElevationError::MissingKey { key: "yllcorner" })?,
        };

        let nodata_value = number("nodata_value")?.map(|v| v as f32);
        let byte_order = match entries.get("byteorder").map(|s| s.to_ascii_lowercase()) {
            Some(s) if s == "msbfirst" || s == "m" => ByteOrder::BigEndian,
            _ => ByteOrder::LittleEndian,
        };

        let header = Self {
            nrows,
            ncols,
            xllcorner,
            yllcorner,
            xdim,
            ydim,
            nodata_value,
            byte_order,
        };
        header.sample_bytes()?;
        Ok(header)
    }

    /// Size of the sample file in bytes.
    pub fn sample_bytes(&self) -> Result<usize, ElevationError> {
        self.nrows
            .checked_mul(self.ncols)
            .and_then(|n| n.checked_mul(4))
            .ok_or(ElevationError::TooLarge {
                nrows: self.nrows,
                ncols: self.ncols,
            })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ElevationError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ElevationError::MissingHeader {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|source| ElevationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Lower-left corner.
    pub fn origin(&self) -> GeoPoint {
        GeoPoint::new(self.yllcorner, self.xllcorner)
    }

    pub fn top_left(&self) -> GeoPoint {
        GeoPoint::new(self.top_lat(), self.xllcorner)
    }

    pub fn top_right(&self) -> GeoPoint {
        GeoPoint::new(self.top_lat(), self.right_lon())
    }

    pub fn bottom_right(&self) -> GeoPoint {
        GeoPoint::new(self.yllcorner, self.right_lon())
    }

    fn top_lat(&self) -> f64 {
        self.yllcorner + self.ydim * self.nrows as f64
    }

    fn right_lon(&self) -> f64 {
        self.xllcorner + self.xdim * self.ncols as f64
    }
}

/// Header path that belongs to `sample_path`.
pub fn header_path_for(sample_path: &Path) -> PathBuf {
    sample_path.with_extension(HEADER_EXTENSION)
}

/// In-memory elevation raster, row 0 at the southern edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    header: ElevationHeader,
    source: PathBuf,
    samples: Vec<f32>,
    min_elevation: f32,
    max_elevation: f32,
}

impl ElevationGrid {
    /// Reads `sample_path` and its sibling header.
    pub fn load(sample_path: impl AsRef<Path>) -> Result<Self, ElevationError> {
        let sample_path = sample_path.as_ref();
        if !sample_path.is_file() {
            return Err(ElevationError::FileNotFound {
                path: sample_path.to_path_buf(),
            });
        }
        let header = ElevationHeader::load(header_path_for(sample_path))?;
        let bytes = fs::read(sample_path).map_err(|source| ElevationError::Io {
            path: sample_path.to_path_buf(),
            source,
        })?;

        let expected = header.sample_bytes()?;
        if bytes.len() < expected {
            return Err(ElevationError::Truncated {
                expected,
                found: bytes.len(),
            });
        }

        let raw: Vec<f32> = bytes[..expected]
            .chunks_exact(4)
            .map(|c| {
                let b = [c[0], c[1], c[2], c[3]];
                match header.byte_order {
                    ByteOrder::LittleEndian => f32::from_le_bytes(b),
                    ByteOrder::BigEndian => f32::from_be_bytes(b),
                }
            })
            .collect();

        let grid = Self::from_north_first(header, raw, sample_path.to_path_buf());
        debug!(
            path = %sample_path.display(),
            nrows = grid.nrows(),
            ncols = grid.ncols(),
            min = grid.min_elevation,
            max = grid.max_elevation,
            "loaded elevation grid"
        );
        Ok(grid)
    }

    /// Builds a grid from samples stored north row first, as they are on disk.
    ///
    /// `samples.len()` must equal `nrows * ncols`.
    pub fn from_north_first(header: ElevationHeader, samples: Vec<f32>, source: PathBuf) -> Self {
        let (nrows, ncols) = (header.nrows, header.ncols);
        assert_eq!(
            Some(samples.len()),
            nrows.checked_mul(ncols),
            "sample count mismatch"
        );

        let mut flipped = Vec::with_capacity(samples.len());
        for row in (0..nrows).rev() {
            flipped.extend_from_slice(&samples[row * ncols..(row + 1) * ncols]);
        }

        let mut min_elevation = f32::MAX;
        let mut max_elevation = f32::MIN;
        for &s in &flipped {
            if is_no_data(s, header.nodata_value) {
                continue;
            }
            min_elevation = min_elevation.min(s);
            max_elevation = max_elevation.max(s);
        }

        Self {
            header,
            source,
            samples: flipped,
            min_elevation,
            max_elevation,
        }
    }

    pub fn header(&self) -> &ElevationHeader {
        &self.header
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn nrows(&self) -> usize {
        self.header.nrows
    }

    pub fn ncols(&self) -> usize {
        self.header.ncols
    }

    /// Sample at `[column, row]`; row 0 is the southern edge.
    pub fn sample(&self, col: usize, row: usize) -> f32 {
        self.samples[row * self.header.ncols + col]
    }

    pub fn is_no_data(&self, value: f32) -> bool {
        is_no_data(value, self.header.nodata_value)
    }

    pub fn min_elevation(&self) -> f32 {
        self.min_elevation
    }

    pub fn max_elevation(&self) -> f32 {
        self.max_elevation
    }

    /// `false` when every sample is no-data and the bounds stayed degenerate.
    pub fn has_data(&self) -> bool {
        self.min_elevation <= self.max_elevation
    }

    pub fn origin(&self) -> GeoPoint {
        self.header.origin()
    }

    pub fn top_left(&self) -> GeoPoint {
        self.header.top_left()
    }

    pub fn top_right(&self) -> GeoPoint {
        self.header.top_right()
    }

    pub fn bottom_right(&self) -> GeoPoint {
        self.header.bottom_right()
    }

    /// Ground extent in world units: `x` west-east, `z` south-north.
    pub fn world_size(&self) -> Vec2 {
        let km = DistanceUnit::Kilometers;
        let x = great_circle_distance(self.top_left(), self.top_right(), km);
        let z = great_circle_distance(self.origin(), self.top_left(), km);
        Vec2::new(x * WORLD_UNITS_PER_KM, z * WORLD_UNITS_PER_KM)
    }
}

fn is_no_data(value: f32, nodata_value: Option<f32>) -> bool {
    value <= NO_DATA_THRESHOLD || value.is_nan() || nodata_value == Some(value)
}
