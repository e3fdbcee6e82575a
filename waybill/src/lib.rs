//! waybill - Stamp, lay out and bundle railway waybill PDFs.
//!
//! The library turns a directory of numbered waybill PDFs into print-ready
//! documents:
//!
//! - a background ("Instruction") is drawn under every page and the stamp
//!   matching the waybill's number is drawn on top;
//! - for duplex printing, blank back sides and two template pages are
//!   inserted at fixed positions;
//! - finished documents are bundled in groups named after their number
//!   ranges.
//!
//! # Examples
//!
//! ## Running a scenario
//!
//! ```no_run
//! use waybill::config::{Background, Config};
//! use waybill::scenario;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::from_base_dir("/srv/waybills");
//! config.background = Background::Path("/srv/waybills/Template/Instruction (China).pdf".into());
//!
//! let report = scenario::run_two_sided(&config).await?;
//! println!("{} documents ready", report.written());
//!
//! let bundles = scenario::run_merge(&config).await?;
//! println!("{} bundles written", bundles.written());
//! # Ok(())
//! # }
//! ```
//!
//! ## Using individual components
//!
//! ```no_run
//! use waybill::compose::{Overlay, SourceDocument, composite};
//! use waybill::io::{PdfReader, PdfWriter};
//! use waybill::page::render::render_pages;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load(Path::new("Railway/1001.pdf")).await?;
//! let stamp = Overlay::load(&reader, Path::new("Stamp/1001.pdf")).await?;
//!
//! let source = SourceDocument::new(loaded.path, loaded.document);
//! let composition = composite(&source, None, Some(&stamp));
//!
//! let document = render_pages(&composition.pages)?;
//! PdfWriter::new().save_with_stats(document, Path::new("Ready/1001.pdf")).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assemble;
pub mod compose;
pub mod config;
pub mod error;
pub mod io;
pub mod key;
pub mod merge;
pub mod output;
pub mod page;
pub mod report;
pub mod scenario;
pub mod stamps;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, WaybillError};
pub use key::{Key, extract_key};
pub use report::{ItemOutcome, RunReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
