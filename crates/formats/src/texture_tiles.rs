//! Texture tiles live next to the elevation file in `<stem>_Textures/`, named
//! `Tile__<x>__<y>.<ext>`.

use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to the elevation file stem to find its texture directory.
pub const TEXTURE_DIR_SUFFIX: &str = "_Textures";
/// Extensions probed for a texture tile, in priority order.
pub const TEXTURE_EXTENSIONS: [&str; 2] = ["png", "jpg"];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureLayout {
    pub columns: usize,
    pub rows: usize,
}

pub fn texture_dir_for(elevation_path: &Path) -> PathBuf {
    let stem = elevation_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = elevation_path.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{stem}{TEXTURE_DIR_SUFFIX}"))
}

/// File name for tile `(x, y)` with the given extension.
pub fn texture_file_name(x: usize, y: usize, extension: &str) -> String {
    format!("Tile__{x}__{y}.{extension}")
}

/// Parses `Tile__<x>__<y>.<ext>` into `(x, y)`.
pub fn parse_texture_file_name(name: &str) -> Option<(usize, usize)> {
    let (stem, _ext) = name.rsplit_once('.')?;
    let rest = stem.strip_prefix("Tile__")?;
    let (x, y) = rest.split_once("__")?;
    Some((x.parse().ok()?, y.parse().ok()?))
}

/// Infers the texture tile grid from the files present in `dir`.
///
/// Returns `None` when the directory is missing or holds no matching files.
pub fn detect_texture_layout(dir: &Path) -> Option<TextureLayout> {
    let entries = fs::read_dir(dir).ok()?;

    let mut count = 0usize;
    let mut max_y = 0usize;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some((_, y)) = parse_texture_file_name(&name.to_string_lossy()) else {
            continue;
        };
        count += 1;
        max_y = max_y.max(y);
    }

    if count == 0 {
        return None;
    }
    let rows = max_y + 1;
    Some(TextureLayout {
        columns: count / rows,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        TextureLayout, detect_texture_layout, parse_texture_file_name, texture_dir_for,
        texture_file_name,
    };
    use std::fs;
    use std::path::{Path, PathBuf};

    fn temp_dir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("terragen_textures_{label}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(texture_file_name(3, 12, "png"), "Tile__3__12.png");
        assert_eq!(parse_texture_file_name("Tile__3__12.png"), Some((3, 12)));
        assert_eq!(parse_texture_file_name("Tile__3.png"), None);
        assert_eq!(parse_texture_file_name("readme.txt"), None);
    }

    #[test]
    fn texture_dir_is_sibling_of_elevation_file() {
        assert_eq!(
            texture_dir_for(Path::new("/data/alps.flt")),
            PathBuf::from("/data/alps_Textures")
        );
    }

    #[test]
    fn layout_from_directory_listing() {
        let dir = temp_dir("layout");
        for x in 0..3 {
            for y in 0..2 {
                fs::write(dir.join(texture_file_name(x, y, "jpg")), b"").expect("write");
            }
        }
        fs::write(dir.join("notes.txt"), b"").expect("write");

        assert_eq!(
            detect_texture_layout(&dir),
            Some(TextureLayout {
                columns: 3,
                rows: 2
            })
        );
    }

    #[test]
    fn missing_or_empty_directory_has_no_layout() {
        let dir = temp_dir("empty");
        assert_eq!(detect_texture_layout(&dir), None);
        assert_eq!(detect_texture_layout(&dir.join("absent")), None);
    }
}
