//! Directory layout, image discovery, and all-or-nothing writes.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use image::ExtendedColorType;
use tempfile::NamedTempFile;

/// Input image extensions, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["bmp", "jpg", "jpeg", "png", "tif", "tiff"];

/// Extension of persisted minutiae files.
pub const MINUTIAE_EXTENSION: &str = "txt";

/// Subdirectories of a full run's output directory.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Processed (cropped and enhanced) grayscale PNGs.
    #[must_use]
    pub fn processed(&self) -> PathBuf {
        self.root.join("processed")
    }

    /// Persisted minutiae text files.
    #[must_use]
    pub fn minutiae(&self) -> PathBuf {
        self.root.join("minutiae_txt")
    }

    /// Rendered templates.
    #[must_use]
    pub fn templates(&self) -> PathBuf {
        self.root.join("templates")
    }
}

/// Image identifier: the file stem.
#[must_use]
pub fn image_id(path: &Path) -> String {
    path.file_stem().map_or_else(
        || path.display().to_string(),
        |stem| stem.to_string_lossy().into_owned(),
    )
}

/// Regular files directly inside `dir` whose extension is in
/// `extensions`, sorted by file name.
///
/// # Errors
///
/// Returns the underlying error if `dir` cannot be read.
pub fn list_files(dir: &Path, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Write `bytes` to `path` so that readers see either the old file or
/// the complete new one: write a temp file in the same directory, then
/// rename it into place.
///
/// # Errors
///
/// Returns the underlying error if the temp file cannot be created,
/// written, or renamed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Encode a raw 8-bit raster as PNG.
///
/// # Errors
///
/// Returns an error if the buffer does not match the dimensions and
/// colour type.
pub fn encode_png(
    raw: &[u8],
    width: u32,
    height: u32,
    color: ExtendedColorType,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, raw, width, height, color)?;
    Ok(buf)
}
