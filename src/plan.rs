//! Declarative build table and the whole-run driver.
//!
//! A [`BuildPlan`] lists every (asset, foreground, background, widths,
//! padding) row to generate. [`run`] resets the output tree and works
//! through the rows in order.
//!
//! # Example
//!
//! ```json
//! {
//!   "assetsDir": "assets",
//!   "outputDir": "public/generated",
//!   "workDir": "assets/.tmp",
//!   "jobs": [
//!     {
//!       "asset": "_square.svg",
//!       "name": "aesir_avatar",
//!       "foreground": "aesir",
//!       "background": "white",
//!       "widths": [32, 64, 128, 256, 512],
//!       "padding": 0.15
//!     }
//!   ]
//! }
//! ```

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::asset::MasterAsset;
use crate::color::{Background, ColorToken};
use crate::error::{ConfigError, Error, VariantError};
use crate::generator::{Renditions, Variant, VariantGenerator};
use crate::output::OutputTree;

// ============================================================================
// Plan
// ============================================================================

/// One row of the build table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Template file, relative to the plan's assets directory.
    pub asset: PathBuf,

    /// Output name used for directories and file names.
    pub name: String,

    pub foreground: ColorToken,

    #[cfg_attr(feature = "jsonschema", schemars(with = "String"))]
    pub background: Background,

    /// Target widths in manifest order.
    pub widths: Vec<u32>,

    /// Fraction of each width kept empty on both sides.
    #[serde(default)]
    pub padding: f64,
}

impl Job {
    pub fn new(
        asset: impl Into<PathBuf>,
        name: impl Into<String>,
        foreground: ColorToken,
        background: impl Into<Background>,
        widths: impl Into<Vec<u32>>,
        padding: f64,
    ) -> Self {
        Self {
            asset: asset.into(),
            name: name.into(),
            foreground,
            background: background.into(),
            widths: widths.into(),
            padding,
        }
    }

    pub fn variant(&self) -> Variant {
        Variant::new(&self.name, self.foreground, self.background)
    }

    pub fn renditions(&self) -> Renditions {
        Renditions::new(self.widths.clone(), self.padding)
    }
}

/// The full set of variants to regenerate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct BuildPlan {
    /// Directory holding the master templates.
    pub assets_dir: PathBuf,

    /// Root of the generated tree; wiped at the start of every run.
    pub output_dir: PathBuf,

    /// Scratch directory for staging writes; wiped at the start of every run.
    pub work_dir: PathBuf,

    pub jobs: Vec<Job>,
}

impl BuildPlan {
    /// The brand table: avatar and logo in every published color pairing.
    pub fn builtin() -> Self {
        const AVATAR_WIDTHS: [u32; 5] = [32, 64, 128, 256, 512];
        const LOGO_WIDTHS: [u32; 5] = [125, 250, 500, 1000, 2000];
        use ColorToken::*;

        let avatar = |fg: ColorToken, bg: ColorToken| {
            Job::new("_square.svg", "aesir_avatar", fg, bg, AVATAR_WIDTHS, 0.15)
        };
        let logo = |fg: ColorToken, bg: ColorToken| {
            Job::new("_logo.svg", "aesir_logo", fg, bg, LOGO_WIDTHS, 0.1)
        };

        Self {
            assets_dir: PathBuf::from("assets"),
            output_dir: PathBuf::from("public/generated"),
            work_dir: PathBuf::from("assets/.tmp"),
            jobs: vec![
                avatar(Aesir, White),
                avatar(White, Aesir),
                logo(Aesir, White),
                logo(White, Aesir),
                logo(Gray, White),
                logo(Black, White),
            ],
        }
    }

    /// Deserializes a plan from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a plan file. Relative directories are resolved against the
    /// file's own directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadPlan {
            path: path.to_path_buf(),
            source,
        })?;

        let mut plan = Self::from_json(&json)?;
        if let Some(base) = path.parent() {
            plan.rebase(base);
        }
        Ok(plan)
    }

    /// Resolves relative directories against `base`.
    pub fn rebase(&mut self, base: &Path) {
        for dir in [&mut self.assets_dir, &mut self.output_dir, &mut self.work_dir] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Checks table-level invariants: at least one job, no variant twice,
    /// and no two jobs writing different content to a shared file.
    ///
    /// The vector and transparent rasters of a (name, foreground) pair are
    /// shared by every background, so those jobs must agree on asset and
    /// padding.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs.is_empty() {
            return Err(ConfigError::EmptyPlan);
        }

        let mut seen = HashSet::new();
        let mut shared: HashMap<(&str, ColorToken), &Job> = HashMap::new();
        for job in &self.jobs {
            let variant = job.variant();
            if !seen.insert(variant.clone()) {
                return Err(ConfigError::DuplicateJob(variant.to_string()));
            }

            let first = *shared.entry((job.name.as_str(), job.foreground)).or_insert(job);
            if first.asset != job.asset || first.padding != job.padding {
                return Err(ConfigError::ConflictingJobs {
                    first: first.variant().to_string(),
                    second: variant.to_string(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Run
// ============================================================================

/// A job that did not produce a manifest.
#[derive(Debug)]
pub struct JobFailure {
    pub variant: Variant,
    pub error: Error,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Manifests written, relative to the output root, in job order.
    pub manifests: Vec<PathBuf>,
    pub failures: Vec<JobFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Regenerates the whole output tree described by `plan`.
///
/// Configuration and output-tree errors abort the run. An unusable asset
/// skips that asset's remaining jobs; any other job failure is recorded and
/// the run continues.
pub fn run(plan: &BuildPlan) -> Result<BuildReport, Error> {
    plan.validate()?;

    let tree = OutputTree::reset(&plan.output_dir, &plan.work_dir)?;
    let mut generator = VariantGenerator::new(&tree);
    let mut assets: HashMap<&Path, Option<MasterAsset>> = HashMap::new();
    let mut report = BuildReport::default();

    for job in &plan.jobs {
        let variant = job.variant();

        let slot = match assets.entry(job.asset.as_path()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => match MasterAsset::load(&plan.assets_dir.join(&job.asset)) {
                Ok(asset) => entry.insert(Some(asset)),
                Err(e) => {
                    warn!("Skipping asset {}: {e}", job.asset.display());
                    entry.insert(None);
                    report.failures.push(JobFailure {
                        variant,
                        error: e.into(),
                    });
                    continue;
                }
            },
        };

        let Some(asset) = slot.as_ref() else {
            warn!("Skipping {variant}: asset {} is unusable", job.asset.display());
            continue;
        };

        match generator.generate(asset, &variant, &job.renditions()) {
            Ok(_) => report.manifests.push(generator.manifest_path(&variant)),
            Err(VariantError::Asset(e)) => {
                warn!("Skipping asset {}: {e}", job.asset.display());
                assets.insert(job.asset.as_path(), None);
                report.failures.push(JobFailure {
                    variant,
                    error: e.into(),
                });
            }
            Err(e) => {
                error!("Failed to generate {variant}: {e}");
                report.failures.push(JobFailure {
                    variant,
                    error: e.into(),
                });
            }
        }
    }

    info!(
        "Wrote {} manifest(s) with {} failure(s)",
        report.manifests.len(),
        report.failures.len()
    );
    Ok(report)
}

// ============================================================================
// Tests
// ============================================================================
