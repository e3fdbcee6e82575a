//! PDF reading and loading operations.
//!
//! Files are read with tokio and parsed on the blocking pool, one document at
//! a time.
//!
//! # Examples
//!
//! ```no_run
//! use waybill::io::reader::PdfReader;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load(Path::new("Railway/1001.pdf")).await?;
//! println!("Loaded {} pages in {:?}", loaded.page_count, loaded.load_time);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{Result, WaybillError};

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to load the document.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

/// PDF reader with configurable loading behavior.
#[derive(Debug, Clone)]
pub struct PdfReader {
    /// Reject documents without pages.
    verify: bool,
}

impl PdfReader {
    /// Create a new PDF reader that rejects empty documents.
    pub fn new() -> Self {
        Self { verify: true }
    }

    /// Create a reader that accepts documents without pages.
    pub fn without_verification() -> Self {
        Self { verify: false }
    }

    /// Load a single PDF document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File does not exist or cannot be read
    /// - File is not a valid PDF
    /// - PDF is encrypted
    /// - PDF has no pages (when verification is on)
    pub async fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let path_buf = path.to_path_buf();
        let start = Instant::now();

        let bytes = tokio::fs::read(&path_buf).await.map_err(|e| {
            if e.kind() == IoErrorKind::NotFound {
                WaybillError::file_not_found(path_buf.clone())
            } else {
                WaybillError::FileNotAccessible {
                    path: path_buf.clone(),
                    source: e,
                }
            }
        })?;
        let file_size = bytes.len() as u64;

        let parse_path = path_buf.clone();
        let document = task::spawn_blocking(move || {
            Document::load_mem(&bytes).map_err(|e| {
                let err_msg = e.to_string();
                if err_msg.contains("encrypt") || err_msg.contains("password") {
                    WaybillError::encrypted_pdf(parse_path)
                } else {
                    WaybillError::malformed(parse_path, err_msg)
                }
            })
        })
        .await??;

        let page_count = document.get_pages().len();
        if self.verify && page_count == 0 {
            return Err(WaybillError::malformed(path_buf, "PDF has no pages"));
        }

        tracing::debug!(
            path = %path_buf.display(),
            pages = page_count,
            bytes = file_size,
            "loaded document"
        );

        Ok(LoadedPdf {
            document,
            path: path_buf,
            page_count,
            load_time: start.elapsed(),
            file_size,
        })
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}
