//! Recoloring and normalization of master templates.
//!
//! A [`DerivedVector`] is the master markup with its marker color replaced
//! by a palette color, rewritten through usvg so the output is structurally
//! minimal, stably formatted and still carries its `viewBox`.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use resvg::usvg::WriteOptions;

use crate::asset::{parse_tree, AssetId, MasterAsset};
use crate::color::ColorToken;
use crate::error::AssetError;

/// The reserved placeholder color authored into every template.
pub const MARKER_COLOR: &str = "#FF0000";

/// Decimal precision kept for coordinates and transforms.
const FLOAT_PRECISION: u8 = 4;

// ============================================================================
// DerivedVector
// ============================================================================

/// Recolored, optimized vector markup for one (asset, color) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedVector {
    pub asset: AssetId,
    pub color: ColorToken,

    /// Optimized, pretty-printed SVG text.
    pub markup: String,

    /// Declared document width in user units.
    pub width: f32,

    /// Declared document height in user units.
    pub height: f32,

    /// How many marker occurrences were substituted.
    pub marker_hits: usize,
}

impl DerivedVector {
    /// Height over width of the declared document size.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.height) / f64::from(self.width)
    }

    /// Returns false when the template carried no marker, meaning the
    /// artwork keeps its authored color regardless of the requested one.
    pub fn marker_found(&self) -> bool {
        self.marker_hits > 0
    }
}

/// Recolors and optimizes `asset` for `color`.
pub fn derive_vector(asset: &MasterAsset, color: ColorToken) -> Result<DerivedVector, AssetError> {
    let (recolored, marker_hits) = substitute_marker(asset.markup(), color.hex());
    if marker_hits == 0 {
        warn!(
            "Asset `{}` contains no marker color {MARKER_COLOR}; `{color}` variant keeps its authored colors",
            asset.id()
        );
    }

    let (markup, width, height) = optimize(asset.id(), &recolored)?;

    Ok(DerivedVector {
        asset: asset.id().clone(),
        color,
        markup,
        width,
        height,
        marker_hits,
    })
}

/// Replaces every case-insensitive occurrence of [`MARKER_COLOR`] with `hex`.
///
/// Returns the rewritten text and the number of replacements.
pub fn substitute_marker(markup: &str, hex: &str) -> (String, usize) {
    let pattern = MARKER_COLOR.to_ascii_lowercase();
    // ASCII lowercasing keeps byte offsets aligned with `markup`.
    let haystack = markup.to_ascii_lowercase();

    let mut result = String::with_capacity(markup.len());
    let mut cursor = 0;
    let mut hits = 0;

    while let Some(found) = haystack[cursor..].find(&pattern) {
        let start = cursor + found;
        result.push_str(&markup[cursor..start]);
        result.push_str(hex);
        cursor = start + pattern.len();
        hits += 1;
    }

    result.push_str(&markup[cursor..]);
    (result, hits)
}

/// Parses, simplifies and re-serializes SVG markup.
///
/// Returns the formatted text together with the declared width and height.
pub fn optimize(id: &AssetId, markup: &str) -> Result<(String, f32, f32), AssetError> {
    let tree = parse_tree(id, markup)?;
    let size = tree.size();

    let options = WriteOptions {
        coordinates_precision: FLOAT_PRECISION,
        transforms_precision: FLOAT_PRECISION,
        ..WriteOptions::default()
    };
    let written = tree.to_string(&options);

    Ok((
        ensure_view_box(&written, size.width(), size.height()),
        size.width(),
        size.height(),
    ))
}

/// Makes sure the root element declares a viewBox.
///
/// usvg folds the authored viewBox into the root transform, so when the
/// writer omits it the equivalent `0 0 w h` box is restored.
fn ensure_view_box(markup: &str, width: f32, height: f32) -> String {
    let Some(open) = markup.find("<svg") else {
        return markup.to_string();
    };
    let Some(close) = markup[open..].find('>').map(|i| open + i) else {
        return markup.to_string();
    };

    let tag = &markup[open..close];
    if tag.contains("viewBox=") {
        return markup.to_string();
    }

    let insert_at = if tag.ends_with('/') { close - 1 } else { close };
    format!(
        "{} viewBox=\"0 0 {width} {height}\"{}",
        &markup[..insert_at],
        &markup[insert_at..]
    )
}

// ============================================================================
// VectorCache
// ============================================================================

/// Key for cached derived vectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub asset: AssetId,
    pub color: ColorToken,
}

/// Per-run memo of derived vectors.
///
/// Guarantees the optimizer runs at most once per (asset, color) pair, and
/// that repeated requests observe identical text.
#[derive(Debug, Default)]
pub struct VectorCache {
    entries: HashMap<CacheKey, Arc<DerivedVector>>,
    optimizer_runs: usize,
}

impl VectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached vector for the pair, deriving it on first use.
    pub fn derive(
        &mut self,
        asset: &MasterAsset,
        color: ColorToken,
    ) -> Result<Arc<DerivedVector>, AssetError> {
        let key = CacheKey {
            asset: asset.id().clone(),
            color,
        };

        if let Some(cached) = self.get_cached(&key) {
            debug!("Reusing derived vector for `{}` in {color}", key.asset);
            return Ok(Arc::clone(cached));
        }

        self.optimizer_runs += 1;
        let derived = Arc::new(derive_vector(asset, color)?);
        self.store(key, Arc::clone(&derived));
        Ok(derived)
    }

    fn get_cached(&self, key: &CacheKey) -> Option<&Arc<DerivedVector>> {
        self.entries.get(key)
    }

    fn store(&mut self, key: CacheKey, vector: Arc<DerivedVector>) {
        self.entries.insert(key, vector);
    }

    /// Number of times the optimizer has been invoked.
    pub fn optimizer_runs(&self) -> usize {
        self.optimizer_runs
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
