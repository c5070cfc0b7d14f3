//! brandgen: deterministic brand-asset derivation
//!
//! This crate turns a small set of master SVG templates into a published
//! tree of recolored vectors, padded PNG renditions and JSON manifests.
//! Every run starts from an empty output tree, so the result is a pure
//! function of the templates and the build plan.
//!
//! # Example
//!
//! ```no_run
//! use brandgen::{BuildPlan, run};
//!
//! let plan = BuildPlan::load("brand.json".as_ref())?;
//! let report = run(&plan)?;
//! for manifest in &report.manifests {
//!     println!("{}", manifest.display());
//! }
//! # Ok::<(), brandgen::Error>(())
//! ```
//!
//! # Single Variants
//!
//! For finer control, drive a [`VariantGenerator`] directly:
//!
//! ```no_run
//! use brandgen::{
//!     ColorToken, MasterAsset, OutputTree, Renditions, Variant, VariantGenerator,
//! };
//!
//! let asset = MasterAsset::load("assets/_logo.svg".as_ref())?;
//! let tree = OutputTree::reset("public/generated", "assets/.tmp")?;
//! let mut generator = VariantGenerator::new(&tree);
//!
//! let variant = Variant::new("aesir_logo", ColorToken::Aesir, ColorToken::White);
//! let manifest = generator.generate(&asset, &variant, &Renditions::new([125, 250], 0.1))?;
//! assert_eq!(manifest.widths.len(), 4);
//! # Ok::<(), brandgen::Error>(())
//! ```

mod asset;
mod color;
mod error;
mod generator;
mod layout;
mod manifest;
mod output;
mod plan;
mod raster;
mod vector;

pub use asset::{AssetId, MasterAsset};
pub use color::{Background, ColorToken};
pub use error::{
    ArtifactError, AssetError, ConfigError, Error, OutputError, RasterError, RasterFailure,
    Result, ValidationError, VariantError,
};
pub use generator::{Renditions, Variant, VariantGenerator};
pub use layout::{Layout, SizePx};
pub use manifest::{Manifest, RasterEntry};
pub use output::{OutputTree, manifest_path, raster_path, vector_path};
pub use plan::{BuildPlan, BuildReport, Job, JobFailure, run};
pub use raster::{Backdrop, RasterOutput, rasterize};
pub use vector::{DerivedVector, MARKER_COLOR, VectorCache, derive_vector, optimize};
