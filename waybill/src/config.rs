//! Configuration module for waybill.
//!
//! A [`Config`] names every directory a scenario touches together with the
//! knobs that shape its output. The CLI builds one from its arguments; library
//! callers can start from [`Config::from_base_dir`] and override fields.

use anyhow::{Result, bail};

use crate::WaybillError;
use crate::utils;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default number of documents per merged bundle.
pub const DEFAULT_CHUNK_SIZE: usize = 4;

/// File name of the duplex template inside the template directory.
pub const DEFAULT_TEMPLATE_FILE: &str = "3-6.pdf";

/// Glob (case-insensitive) for background candidates in the template directory.
pub const BACKGROUND_PATTERN: &str = "Instruction (China)*.pdf";

/// Compression level for written PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Write streams as they are.
    None,
    /// Compress uncompressed streams.
    #[default]
    Standard,
    /// Compress streams and drop unreferenced objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = WaybillError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(WaybillError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Background layer drawn under every source page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Background {
    /// No background; pages keep their own appearance.
    #[default]
    None,
    /// Single-page overlay document at this path.
    Path(PathBuf),
}

impl Background {
    /// Path of the overlay, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::None => None,
            Self::Path(path) => Some(path),
        }
    }
}

/// Complete configuration for a waybill run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source waybills.
    pub railway_dir: PathBuf,

    /// Background candidates and the duplex template.
    pub template_dir: PathBuf,

    /// Single-page stamps keyed by file name.
    pub stamp_dir: PathBuf,

    /// Composited outputs, one per source.
    pub ready_dir: PathBuf,

    /// Merged bundles.
    pub merged_dir: PathBuf,

    /// Duplex template (at least two pages).
    pub template_file: PathBuf,

    /// Background overlay selection.
    pub background: Background,

    /// Maximum documents per merged bundle.
    pub chunk_size: usize,

    /// End bundle names with `pcs..pdf` like the historical tool did.
    pub legacy_bundle_suffix: bool,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// Plan outputs without writing them.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,
}

impl Config {
    /// Build the conventional directory layout under `base`.
    ///
    /// ```
    /// use waybill::config::Config;
    /// use std::path::Path;
    ///
    /// let config = Config::from_base_dir("/srv/waybills");
    /// assert_eq!(config.merged_dir, Path::new("/srv/waybills/Merged Railway"));
    /// assert_eq!(config.template_file, Path::new("/srv/waybills/Template/3-6.pdf"));
    /// ```
    pub fn from_base_dir(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let template_dir = base.join("Template");
        Self {
            railway_dir: base.join("Railway"),
            template_file: template_dir.join(DEFAULT_TEMPLATE_FILE),
            template_dir,
            stamp_dir: base.join("Stamp"),
            ready_dir: base.join("Ready"),
            merged_dir: base.join("Merged Railway"),
            background: Background::None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            legacy_bundle_suffix: false,
            compression: CompressionLevel::default(),
            dry_run: false,
            verbose: false,
            quiet: false,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Verbose and quiet modes are both enabled
    /// - The chunk size is zero
    /// - The ready directory is the railway directory (outputs would
    ///   overwrite their sources)
    /// - The merged directory is the ready directory (bundles would be
    ///   picked up as members on the next run)
    pub fn validate(&self) -> Result<()> {
        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if self.chunk_size == 0 {
            bail!("Chunk size must be at least 1");
        }

        if self.ready_dir == self.railway_dir {
            bail!(
                "Ready directory cannot be the railway directory: {}",
                self.ready_dir.display()
            );
        }

        if self.merged_dir == self.ready_dir {
            bail!(
                "Merged directory cannot be the ready directory: {}",
                self.merged_dir.display()
            );
        }

        Ok(())
    }

    /// List background candidates in the template directory, sorted.
    pub fn background_candidates(&self) -> crate::Result<Vec<PathBuf>> {
        utils::collect_matching(&self.template_dir, BACKGROUND_PATTERN)
    }

    /// Create the output directories if they do not exist yet.
    pub async fn ensure_directories(&self) -> crate::Result<()> {
        for dir in [&self.ready_dir, &self.merged_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| WaybillError::FailedToCreateOutput {
                    path: dir.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_base_dir(".")
    }
}
