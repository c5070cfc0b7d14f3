//! Variant generation: one asset, one color pair, many renditions.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::asset::MasterAsset;
use crate::color::{Background, ColorToken};
use crate::error::{ArtifactError, RasterFailure, ValidationError, VariantError};
use crate::layout::{check_padding, check_width, Layout};
use crate::manifest::{Manifest, RasterEntry};
use crate::output::{self, OutputTree};
use crate::raster::{rasterize, Backdrop};
use crate::vector::VectorCache;

/// Flavors rendered per width, in manifest order.
const FLAVORS: [bool; 2] = [false, true];

// ============================================================================
// Variant
// ============================================================================

/// One renderable (asset, foreground, background) combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    /// Output name of the asset.
    pub name: String,
    pub foreground: ColorToken,
    pub background: Background,
}

impl Variant {
    pub fn new(name: impl Into<String>, foreground: ColorToken, background: impl Into<Background>) -> Self {
        Self {
            name: name.into(),
            foreground,
            background: background.into(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} on {})", self.name, self.foreground, self.background)
    }
}

/// Raster sizes requested for a variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Renditions {
    /// Target widths, in the order they should appear in the manifest.
    pub widths: Vec<u32>,

    /// Fraction of the width kept empty on each side.
    pub padding: f64,
}

impl Renditions {
    pub fn new(widths: impl Into<Vec<u32>>, padding: f64) -> Self {
        Self {
            widths: widths.into(),
            padding,
        }
    }

    /// Checks the request before any rendering work starts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.widths.is_empty() {
            return Err(ValidationError::NoWidths);
        }
        check_padding(self.padding)?;

        let mut seen = HashSet::new();
        for &width in &self.widths {
            check_width(width)?;
            if !seen.insert(width) {
                return Err(ValidationError::DuplicateWidth(width));
            }
        }
        Ok(())
    }
}

// ============================================================================
// VariantGenerator
// ============================================================================

/// Drives vector derivation, layout, rasterization and persistence for
/// variants written into one [`OutputTree`].
///
/// # Order
///
/// Renditions are produced with transparency as the outer loop and widths as
/// the inner loop: every opaque width in caller order, then every
/// transparent width in caller order. Manifest entries follow that order.
pub struct VariantGenerator<'a> {
    tree: &'a OutputTree,
    cache: VectorCache,
}

impl<'a> VariantGenerator<'a> {
    pub fn new(tree: &'a OutputTree) -> Self {
        Self {
            tree,
            cache: VectorCache::new(),
        }
    }

    /// Returns the vector cache shared by all variants of this generator.
    pub fn cache(&self) -> &VectorCache {
        &self.cache
    }

    /// Generates every rendition of `variant` and writes its manifest.
    ///
    /// The manifest is written last and only when every rendition was
    /// persisted. If some renditions fail, the others stay on disk and
    /// [`VariantError::Incomplete`] lists the failures.
    pub fn generate(
        &mut self,
        asset: &MasterAsset,
        variant: &Variant,
        renditions: &Renditions,
    ) -> Result<Manifest, VariantError> {
        info!("Generating {variant} from `{}`", asset.id());
        renditions.validate()?;

        let vector = self.cache.derive(asset, variant.foreground)?;
        let aspect_ratio = vector.aspect_ratio();

        // Every layout is computed up front so a bad width fails before any
        // rasterization.
        let layouts = renditions
            .widths
            .iter()
            .map(|&width| Layout::compute(width, renditions.padding, aspect_ratio))
            .collect::<Result<Vec<_>, _>>()?;

        let svg_path = output::vector_path(&variant.name, variant.foreground, variant.background);
        self.tree.write(&svg_path, vector.markup.as_bytes())?;

        let mut manifest = Manifest::new(
            &variant.name,
            file_name(&svg_path),
            variant.foreground,
            variant.background,
            aspect_ratio,
        );

        let frames: Vec<String> = layouts.iter().map(|layout| layout.frame(&vector.markup)).collect();
        let mut failures = Vec::new();

        for transparent in FLAVORS {
            for (layout, frame) in layouts.iter().zip(&frames) {
                let width = layout.outer.width;
                debug!("{variant} @ {width}w: {layout:?}");

                match self.render_one(variant, layout, frame, transparent) {
                    Ok(entry) => manifest.widths.push(entry),
                    Err(error) => {
                        warn!("Failed to render {variant} at {width}w (transparent: {transparent}): {error}");
                        failures.push(RasterFailure {
                            width,
                            transparent,
                            error,
                        });
                    }
                }
            }
        }

        if !failures.is_empty() {
            return Err(VariantError::Incomplete {
                variant: variant.to_string(),
                failures,
            });
        }

        let json = manifest.to_json_pretty()?;
        self.tree.write(&self.manifest_path(variant), json.as_bytes())?;

        Ok(manifest)
    }

    /// Relative path of the manifest written for `variant`.
    pub fn manifest_path(&self, variant: &Variant) -> PathBuf {
        output::manifest_path(&variant.name, variant.foreground, variant.background)
    }

    fn render_one(
        &self,
        variant: &Variant,
        layout: &Layout,
        frame: &str,
        transparent: bool,
    ) -> Result<RasterEntry, ArtifactError> {
        let backdrop = match variant.background.color() {
            Some(color) if !transparent => Backdrop::Opaque(color.rgb()),
            _ => Backdrop::Transparent,
        };

        let raster = rasterize(frame, layout.outer, backdrop)?;
        let relative = output::raster_path(
            &variant.name,
            variant.foreground,
            variant.background,
            transparent,
            layout.outer.width,
        );
        let written = self.tree.write(&relative, &raster.png)?;
        info!("Generated PNG: {} ({} bytes)", written.display(), raster.png.len());

        Ok(RasterEntry {
            name: file_name(&relative),
            width: raster.size.width,
            height: raster.size.height,
            transparent,
        })
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetId;
    use std::fs;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="40" viewBox="0 0 40 40"><circle cx="20" cy="20" r="20" fill="#FF0000"/></svg>"##;

    fn setup() -> (tempfile::TempDir, OutputTree) {
        let dir = tempfile::tempdir().unwrap();
        let tree = OutputTree::reset(dir.path().join("generated"), dir.path().join(".tmp")).unwrap();
        (dir, tree)
    }

    fn square() -> MasterAsset {
        MasterAsset::new(AssetId::new("_square"), SQUARE).unwrap()
    }

    fn avatar() -> Variant {
        Variant::new("aesir_avatar", ColorToken::Aesir, ColorToken::White)
    }

    #[test]
    fn manifest_entries_are_grouped_by_transparency() {
        let (_dir, tree) = setup();
        let mut generator = VariantGenerator::new(&tree);

        let manifest = generator
            .generate(&square(), &avatar(), &Renditions::new([32, 64], 0.15))
            .unwrap();

        let order: Vec<_> = manifest.widths.iter().map(|e| (e.width, e.transparent)).collect();
        assert_eq!(order, [(32, false), (64, false), (32, true), (64, true)]);
        assert_eq!(manifest.widths[0].name, "aesir_avatar__aesir_on_white_32w.png");
        assert_eq!(manifest.widths[2].name, "aesir_avatar__aesir_32w.png");
        assert_eq!(manifest.svg, "aesir_avatar__aesir.svg");
    }

    #[test]
    fn widths_keep_caller_order() {
        let (_dir, tree) = setup();
        let mut generator = VariantGenerator::new(&tree);

        let manifest = generator
            .generate(&square(), &avatar(), &Renditions::new([64, 16, 32], 0.0))
            .unwrap();

        let opaque: Vec<_> = manifest.sizes(false).map(|e| e.width).collect();
        assert_eq!(opaque, [64, 16, 32]);
    }

    #[test]
    fn every_listed_file_exists_with_recorded_size() {
        let (_dir, tree) = setup();
        let mut generator = VariantGenerator::new(&tree);
        let variant = avatar();

        let manifest = generator
            .generate(&square(), &variant, &Renditions::new([32, 50], 0.15))
            .unwrap();

        let manifest_file = tree.resolve(&generator.manifest_path(&variant));
        let dir = manifest_file.parent().unwrap();
        assert_eq!(Manifest::load(&manifest_file).unwrap(), manifest);
        assert!(manifest.vector_path(dir).is_file());

        for entry in &manifest.widths {
            let img = image::open(Manifest::raster_path(dir, entry)).unwrap();
            assert_eq!((img.width(), img.height()), (entry.width, entry.height));
        }
    }

    #[test]
    fn vector_is_derived_once_per_foreground() {
        let (_dir, tree) = setup();
        let mut generator = VariantGenerator::new(&tree);
        let asset = square();
        let renditions = Renditions::new([16, 32, 48], 0.1);

        generator.generate(&asset, &avatar(), &renditions).unwrap();
        generator
            .generate(
                &asset,
                &Variant::new("aesir_avatar", ColorToken::Aesir, Background::None),
                &renditions,
            )
            .unwrap();

        assert_eq!(generator.cache().optimizer_runs(), 1);
    }

    #[test]
    fn invalid_request_fails_before_writing() {
        let (_dir, tree) = setup();
        let mut generator = VariantGenerator::new(&tree);

        let err = generator
            .generate(&square(), &avatar(), &Renditions::new([32], 0.5))
            .unwrap_err();
        assert!(matches!(err, VariantError::Validation(ValidationError::Padding(_))));

        let err = generator
            .generate(&square(), &avatar(), &Renditions::new([32, 32], 0.1))
            .unwrap_err();
        assert!(matches!(err, VariantError::Validation(ValidationError::DuplicateWidth(32))));

        assert_eq!(fs::read_dir(tree.root()).unwrap().count(), 0);
        assert_eq!(generator.cache().optimizer_runs(), 0);
    }

    #[test]
    fn collapsed_width_aborts_before_rasterizing() {
        let (_dir, tree) = setup();
        let mut generator = VariantGenerator::new(&tree);

        let err = generator
            .generate(&square(), &avatar(), &Renditions::new([64, 1], 0.45))
            .unwrap_err();
        assert!(matches!(err, VariantError::Validation(ValidationError::Collapsed { .. })));
        assert_eq!(fs::read_dir(tree.root()).unwrap().count(), 0);
    }

    #[test]
    fn unmarked_template_still_generates() {
        let (_dir, tree) = setup();
        let mut generator = VariantGenerator::new(&tree);
        let plain = MasterAsset::new(AssetId::new("plain"), SQUARE.replace("#FF0000", "#00FF00")).unwrap();

        let manifest = generator
            .generate(&plain, &Variant::new("plain", ColorToken::Gray, ColorToken::White), &Renditions::new([16], 0.0))
            .unwrap();
        assert_eq!(manifest.widths.len(), 2);
    }

    #[test]
    fn opaque_render_without_background_stays_transparent() {
        let (_dir, tree) = setup();
        let mut generator = VariantGenerator::new(&tree);
        let variant = Variant::new("bare", ColorToken::Black, Background::None);

        let manifest = generator
            .generate(&square(), &variant, &Renditions::new([32], 0.25))
            .unwrap();

        let path = tree.resolve(&output::raster_path("bare", ColorToken::Black, Background::None, false, 32));
        let img = image::open(path).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(manifest.widths[0].name, "bare__black_on_none_32w.png");
    }

    #[test]
    fn failed_rendition_withholds_manifest_but_keeps_siblings() {
        let (_dir, tree) = setup();
        let mut generator = VariantGenerator::new(&tree);
        let variant = avatar();

        // Lays out fine but is far too large to allocate a canvas for.
        let huge = 600_000_000;
        let err = generator
            .generate(&square(), &variant, &Renditions::new([16, huge], 0.0))
            .unwrap_err();

        let VariantError::Incomplete { failures, .. } = err else {
            panic!("expected an incomplete variant, got {err:?}");
        };
        let failed: Vec<_> = failures.iter().map(|f| (f.width, f.transparent)).collect();
        assert_eq!(failed, [(huge, false), (huge, true)]);
        assert!(failures.iter().all(|f| matches!(f.error, ArtifactError::Raster(_))));

        let raster = |transparent| {
            tree.resolve(&output::raster_path("aesir_avatar", ColorToken::Aesir, variant.background, transparent, 16))
        };
        assert!(raster(false).is_file());
        assert!(raster(true).is_file());
        assert!(!tree.resolve(&generator.manifest_path(&variant)).exists());
    }
}
