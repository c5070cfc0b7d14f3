//! brandgen CLI
//!
//! Regenerates the published brand-asset tree from a build plan.
//! Logs to stderr, prints written manifest paths to stdout.
//! Returns non-zero if any job failed.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};

use brandgen::{BuildPlan, run};

#[derive(Parser)]
#[command(name = "brandgen")]
#[command(about = "Derive recolored, padded brand assets from master SVG templates")]
struct Cli {
    /// Build plan file (JSON). Uses the builtin brand table when omitted
    #[arg(short, long)]
    plan: Option<PathBuf>,

    /// Override the directory holding master templates
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Override the output root (wiped on every run)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the staging directory (wiped on every run)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(std::io::stderr().lock(), "[{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(cli.level());
    }

    let mut plan = match &cli.plan {
        Some(path) => match BuildPlan::load(path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => BuildPlan::builtin(),
    };

    if let Some(dir) = cli.assets {
        plan.assets_dir = dir;
    }
    if let Some(dir) = cli.output {
        plan.output_dir = dir;
    }
    if let Some(dir) = cli.work_dir {
        plan.work_dir = dir;
    }

    let report = match run(&plan) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    for manifest in &report.manifests {
        println!("{}", plan.output_dir.join(manifest).display());
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        for failure in &report.failures {
            eprintln!("failed: {}: {}", failure.variant, failure.error);
        }
        ExitCode::from(2) // Some jobs failed
    }
}
