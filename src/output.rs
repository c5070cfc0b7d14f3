//! The generated output tree: naming, reset and atomic persistence.
//!
//! File names are a pure function of what they contain:
//!
//! ```text
//! {name}/{name}__{fg}[_on_{bg}][_{width}w].{ext}
//! ```
//!
//! `_on_{bg}` appears only for opaque renditions (and the manifest), and
//! `_{width}w` only for rasters.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info};

use crate::color::{Background, ColorToken};
use crate::error::OutputError;

pub const SVG_EXT: &str = "svg";
pub const PNG_EXT: &str = "png";
pub const MANIFEST_EXT: &str = "json";

// ============================================================================
// Naming
// ============================================================================

/// Base file name (without directory or extension) for an artifact.
pub fn full_name(
    name: &str,
    foreground: ColorToken,
    background: Background,
    transparent: bool,
    width: Option<u32>,
) -> String {
    let mut full = format!("{name}__{}", foreground.name_token());
    if !transparent {
        full.push_str("_on_");
        full.push_str(background.name_token());
    }
    if let Some(width) = width {
        full.push_str(&format!("_{width}w"));
    }
    full
}

/// Path of an artifact relative to the output root.
pub fn artifact_path(
    name: &str,
    foreground: ColorToken,
    background: Background,
    transparent: bool,
    width: Option<u32>,
    ext: &str,
) -> PathBuf {
    let file = format!("{}.{ext}", full_name(name, foreground, background, transparent, width));
    Path::new(name).join(file)
}

/// Relative path of a variant's recolored vector.
pub fn vector_path(name: &str, foreground: ColorToken, background: Background) -> PathBuf {
    artifact_path(name, foreground, background, true, None, SVG_EXT)
}

/// Relative path of one raster rendition.
pub fn raster_path(
    name: &str,
    foreground: ColorToken,
    background: Background,
    transparent: bool,
    width: u32,
) -> PathBuf {
    artifact_path(name, foreground, background, transparent, Some(width), PNG_EXT)
}

/// Relative path of a variant's manifest.
pub fn manifest_path(name: &str, foreground: ColorToken, background: Background) -> PathBuf {
    artifact_path(name, foreground, background, false, None, MANIFEST_EXT)
}

// ============================================================================
// OutputTree
// ============================================================================

/// Handle to a freshly reset output tree.
///
/// Obtained only through [`OutputTree::reset`], so every write happens into
/// a tree that contains nothing but the current run's products.
#[derive(Debug)]
pub struct OutputTree {
    root: PathBuf,
    work_dir: PathBuf,
    staged: AtomicUsize,
}

impl OutputTree {
    /// Deletes any previous output and work trees, then recreates both empty.
    ///
    /// The two trees must not contain one another.
    pub fn reset(root: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Result<Self, OutputError> {
        let root = root.into();
        let work_dir = work_dir.into();
        if root.starts_with(&work_dir) || work_dir.starts_with(&root) {
            let overlap = io::Error::new(
                ErrorKind::InvalidInput,
                format!("overlaps output root {}", root.display()),
            );
            return Err(OutputError::new("use work directory", work_dir, overlap));
        }

        for dir in [&root, &work_dir] {
            remove_dir_if_present(dir)?;
            ensure_dir(dir)?;
        }
        info!("Reset output tree {}", root.display());

        Ok(Self {
            root,
            work_dir,
            staged: AtomicUsize::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Absolute location of a relative artifact path.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Writes `bytes` to `relative` so that readers never see a partial file.
    ///
    /// Content is staged in the work directory and moved into place.
    pub fn write(&self, relative: &Path, bytes: &[u8]) -> Result<PathBuf, OutputError> {
        let target = self.resolve(relative);
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }

        let ticket = self.staged.fetch_add(1, Ordering::Relaxed);
        let staging = self.work_dir.join(format!("{ticket}.part"));
        fs::write(&staging, bytes).map_err(|e| OutputError::new("write", &staging, e))?;

        if let Err(e) = fs::rename(&staging, &target) {
            // Work dir on another filesystem: fall back to copy + remove.
            debug!("Rename {} failed ({e}), copying instead", staging.display());
            if let Err(e) = fs::copy(&staging, &target) {
                let _ = fs::remove_file(&staging);
                return Err(OutputError::new("copy to", &target, e));
            }
            fs::remove_file(&staging).map_err(|e| OutputError::new("remove", &staging, e))?;
        }

        Ok(target)
    }
}

/// Creates `dir` and its parents; succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> Result<(), OutputError> {
    fs::create_dir_all(dir).map_err(|e| OutputError::new("create directory", dir, e))
}

fn remove_dir_if_present(dir: &Path) -> Result<(), OutputError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(OutputError::new("remove", dir, e)),
    }
}
