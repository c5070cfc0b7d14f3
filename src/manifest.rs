//! Machine-readable description of what was generated for one variant.
//!
//! A manifest is the single source of truth for consumers: every file it
//! references exists, and readers resolve references relative to the
//! manifest's own directory instead of rebuilding names.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "name": "aesir_logo",
//!   "svg": "aesir_logo__aesir.svg",
//!   "foreground": "aesir",
//!   "background": "white",
//!   "aspectRatio": 0.5,
//!   "widths": [
//!     { "name": "aesir_logo__aesir_on_white_125w.png", "width": 125, "height": 75, "transparent": false }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{Background, ColorToken};

/// One raster rendition listed in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct RasterEntry {
    /// File name, relative to the manifest's directory.
    pub name: String,

    /// Actual pixel width of the encoded file.
    pub width: u32,

    /// Actual pixel height of the encoded file.
    pub height: u32,

    pub transparent: bool,
}

/// The record of all artifacts produced for one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Output name of the asset.
    pub name: String,

    /// Recolored vector file name, relative to the manifest's directory.
    pub svg: String,

    pub foreground: ColorToken,

    #[cfg_attr(feature = "jsonschema", schemars(with = "String"))]
    pub background: Background,

    /// Source height divided by source width.
    pub aspect_ratio: f64,

    /// Renditions in generation order.
    pub widths: Vec<RasterEntry>,
}

impl Manifest {
    /// Creates a manifest with no renditions yet.
    pub fn new(
        name: impl Into<String>,
        svg: impl Into<String>,
        foreground: ColorToken,
        background: Background,
        aspect_ratio: f64,
    ) -> Self {
        Self {
            name: name.into(),
            svg: svg.into(),
            foreground,
            background,
            aspect_ratio,
            widths: Vec::new(),
        }
    }

    /// Iterates the renditions of one flavor, in manifest order.
    pub fn sizes(&self, transparent: bool) -> impl Iterator<Item = &RasterEntry> {
        self.widths.iter().filter(move |e| e.transparent == transparent)
    }

    /// Finds the rendition of the given flavor and width.
    pub fn find(&self, width: u32, transparent: bool) -> Option<&RasterEntry> {
        self.sizes(transparent).find(|e| e.width == width)
    }

    /// Resolves an entry's file against the directory holding the manifest.
    pub fn raster_path(manifest_dir: &Path, entry: &RasterEntry) -> PathBuf {
        manifest_dir.join(&entry.name)
    }

    /// Resolves the vector file against the directory holding the manifest.
    pub fn vector_path(&self, manifest_dir: &Path) -> PathBuf {
        manifest_dir.join(&self.svg)
    }

    /// Serializes the manifest to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads a manifest file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(std::io::Error::other)
    }
}

// ============================================================================
// Tests
// ============================================================================
