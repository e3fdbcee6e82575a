//! CLI argument parsing for waybill.
//!
//! # Examples
//!
//! ```text
//! waybill --base-dir /srv/waybills two-sided
//! waybill --base-dir /srv/waybills merge --chunk-size 6
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use waybill::config::{Background, CompressionLevel, Config, DEFAULT_CHUNK_SIZE};
use waybill::error::{Result, WaybillError};

/// Stamp, lay out and bundle railway waybill PDFs.
///
/// Reads numbered waybills from the railway directory, draws the selected
/// background under and the matching stamp over every page, and writes the
/// results to the ready directory. Ready documents can then be bundled into
/// the merged directory.
#[derive(Parser, Debug)]
#[command(name = "waybill")]
#[command(version)]
#[command(about = "Stamp, lay out and bundle railway waybill PDFs", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base directory holding the conventional folders
    ///
    /// Railway, Template, Stamp, Ready and "Merged Railway" are resolved
    /// relative to this directory unless overridden individually.
    #[arg(short = 'C', long, global = true, value_name = "DIR", default_value = ".")]
    #[arg(env = "WAYBILL_BASE_DIR")]
    pub base_dir: PathBuf,

    /// Directory of source waybills
    #[arg(long, global = true, value_name = "DIR")]
    pub railway_dir: Option<PathBuf>,

    /// Directory of backgrounds and the duplex template
    #[arg(long, global = true, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    /// Directory of stamps
    #[arg(long, global = true, value_name = "DIR")]
    pub stamp_dir: Option<PathBuf>,

    /// Directory for finished documents
    #[arg(long, global = true, value_name = "DIR")]
    pub ready_dir: Option<PathBuf>,

    /// Directory for bundles
    #[arg(long, global = true, value_name = "DIR")]
    pub merged_dir: Option<PathBuf>,

    /// Duplex template (default: <template-dir>/3-6.pdf)
    #[arg(long, global = true, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Background drawn under every page
    ///
    /// Without this option the single "Instruction (China)*.pdf" in the
    /// template directory is used. If there are several, one must be chosen
    /// explicitly; `waybill backgrounds` lists them.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub background: Option<PathBuf>,

    /// Do not draw a background
    #[arg(long, global = true, conflicts_with = "background")]
    pub no_background: bool,

    /// Maximum number of documents per bundle
    #[arg(long, global = true, value_name = "N", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Name bundles "... pcs..pdf" like earlier versions did
    #[arg(long, global = true)]
    pub legacy_suffix: bool,

    /// Compression level for written PDFs
    ///
    /// - none: No compression
    /// - standard: Compress streams (default)
    /// - maximum: Also drop unreferenced objects
    #[arg(long, global = true, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Dry run - report what would be written without writing anything
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Verbose output - show inputs, stamps and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the run report as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

/// What to do.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Composite and lay out for duplex printing (blanks and template pages)
    TwoSided,
    /// Composite only
    OneSided,
    /// Bundle ready documents
    Merge,
    /// List background candidates in the template directory
    Backgrounds,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Compression level is invalid
    /// - No background was chosen and the template directory holds several
    /// - Configuration validation fails
    pub fn to_config(&self) -> Result<Config> {
        let compression = CompressionLevel::from_str(&self.compression)?;

        let mut config = Config::from_base_dir(&self.base_dir);
        if let Some(dir) = &self.template_dir {
            config.template_file = dir.join(waybill::config::DEFAULT_TEMPLATE_FILE);
            config.template_dir = dir.clone();
        }
        override_path(&mut config.railway_dir, &self.railway_dir);
        override_path(&mut config.stamp_dir, &self.stamp_dir);
        override_path(&mut config.ready_dir, &self.ready_dir);
        override_path(&mut config.merged_dir, &self.merged_dir);
        override_path(&mut config.template_file, &self.template);

        config.chunk_size = self.chunk_size;
        config.legacy_bundle_suffix = self.legacy_suffix;
        config.compression = compression;
        config.dry_run = self.dry_run;
        // JSON owns stdout.
        config.verbose = self.verbose && !self.json;
        config.quiet = self.quiet || self.json;

        if self.command.composites() {
            config.background = self.select_background(&config)?;
        }

        config.validate().map_err(|e| {
            WaybillError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    fn select_background(&self, config: &Config) -> Result<Background> {
        if self.no_background {
            return Ok(Background::None);
        }
        if let Some(path) = &self.background {
            return Ok(Background::Path(path.clone()));
        }

        let mut candidates = config.background_candidates()?;
        match candidates.len() {
            0 => Ok(Background::None),
            1 => Ok(Background::Path(candidates.remove(0))),
            n => Err(WaybillError::invalid_config(format!(
                "{n} backgrounds found in {}; choose one with --background or use --no-background",
                config.template_dir.display()
            ))),
        }
    }
}

impl Command {
    /// Whether the command draws backgrounds and stamps.
    pub fn composites(self) -> bool {
        matches!(self, Self::TwoSided | Self::OneSided)
    }
}

fn override_path(target: &mut PathBuf, value: &Option<PathBuf>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}
