//! Error taxonomy for the derivation pipeline.
//!
//! Each stage owns a narrow error type. They all fold into [`Error`] so that
//! callers driving a whole build can use a single `Result` type, while the
//! orchestrator can still tell a fatal-for-the-asset failure apart from a
//! failure that only affects one raster rendition.

use std::path::PathBuf;

use thiserror::Error;

use crate::asset::AssetId;

/// Convenience alias for results carrying the crate-level [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

// ============================================================================
// Stage Errors
// ============================================================================

/// Setup or programming errors. Fatal for the whole run, never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown color token `{0}`")]
    UnknownColor(String),

    #[error("failed to read build plan {path}: {source}")]
    ReadPlan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed build plan: {0}")]
    MalformedPlan(#[from] serde_json::Error),

    #[error("build plan contains no jobs")]
    EmptyPlan,

    #[error("duplicate job for variant {0}")]
    DuplicateJob(String),

    #[error("jobs {first} and {second} share output files but differ in asset or padding")]
    ConflictingJobs { first: String, second: String },
}

/// A master template that cannot be used. Fatal for that asset only.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset {0} is not an SVG file")]
    NotSvg(PathBuf),

    #[error("asset `{0}` has empty markup")]
    Empty(AssetId),

    #[error("asset `{id}` is not a valid vector document: {reason}")]
    Malformed { id: AssetId, reason: String },

    #[error("asset `{0}` declares a missing or non-positive size")]
    InvalidSize(AssetId),
}

/// Caller contract violations, caught before any rendering starts.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("padding fraction {0} must be finite and within [0, 0.5)")]
    Padding(f64),

    #[error("width must be positive")]
    ZeroWidth,

    #[error("at least one width must be requested")]
    NoWidths,

    #[error("width {0} requested more than once")]
    DuplicateWidth(u32),

    #[error("aspect ratio {0} must be finite and positive")]
    AspectRatio(f64),

    #[error("artwork collapses to {width}x{height} px at target width {target}")]
    Collapsed { target: u32, width: i64, height: i64 },

    #[error("canvas height {height} px at target width {target} does not fit a raster")]
    Oversized { target: u32, height: f64 },
}

/// Failure to produce one raster rendition.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to render vector: {0}")]
    Render(String),

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Filesystem failures while managing the output tree.
#[derive(Debug, Error)]
#[error("{action} {path}: {source}")]
pub struct OutputError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl OutputError {
    pub(crate) fn new(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            action,
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// Variant Errors
// ============================================================================

/// Why a single raster rendition is missing from a variant.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// One rendition that could not be produced.
#[derive(Debug)]
pub struct RasterFailure {
    pub width: u32,
    pub transparent: bool,
    pub error: ArtifactError,
}

/// Failure to generate a complete variant.
#[derive(Debug, Error)]
pub enum VariantError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Sibling renditions were written, but the manifest was withheld.
    #[error("variant {variant} is incomplete: {} rendition(s) failed", failures.len())]
    Incomplete {
        variant: String,
        failures: Vec<RasterFailure>,
    },
}

// ============================================================================
// Crate Error
// ============================================================================

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Variant(#[from] VariantError),
}
