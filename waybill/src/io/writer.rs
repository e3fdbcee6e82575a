//! PDF writing and saving operations.
//!
//! Writes are atomic: the document is serialised next to its destination
//! under a `.tmp` name and renamed into place, so a failed write never leaves
//! a truncated PDF behind.
//!
//! # Examples
//!
//! ```no_run
//! use waybill::io::writer::PdfWriter;
//! use lopdf::Document;
//! use std::path::Path;
//!
//! # async fn example(doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = PdfWriter::new();
//! let stats = writer.save_with_stats(doc, Path::new("Ready/1001.pdf")).await?;
//! println!("Wrote {} in {:?}", stats.format_file_size(), stats.write_time);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::config::CompressionLevel;
use crate::error::{Result, WaybillError};

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Stream compression to apply before writing.
    pub compression: CompressionLevel,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::default(),
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,

    /// Number of pages written.
    pub page_count: usize,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer applying `compression`.
    pub fn with_compression(compression: CompressionLevel) -> Self {
        Self {
            options: WriteOptions {
                compression,
                ..Default::default()
            },
        }
    }

    /// Save a PDF and return statistics about the operation.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the output or temp file cannot be created, the
    /// document cannot be serialised, or the final rename fails. The temp
    /// file is removed on every failure path.
    pub async fn save_with_stats(&self, mut doc: Document, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                WaybillError::FailedToCreateOutput {
                    path: parent.to_path_buf(),
                    source: e,
                }
            })?;
        }

        let stats = task::spawn_blocking(move || {
            let start = Instant::now();

            match options.compression {
                CompressionLevel::None => {}
                CompressionLevel::Standard => doc.compress(),
                CompressionLevel::Maximum => {
                    doc.prune_objects();
                    doc.compress();
                }
            }
            doc.renumber_objects();
            let page_count = doc.get_pages().len();

            let write_path = temp_path_for(&path_buf);
            let result = write_document(&mut doc, &write_path, options.buffer_size).and_then(|()| {
                std::fs::rename(&write_path, &path_buf).map_err(|e| WaybillError::FailedToWrite {
                    path: path_buf.clone(),
                    source: e,
                })
            });

            if let Err(err) = result {
                let _ = std::fs::remove_file(&write_path);
                return Err(err);
            }

            let file_size = std::fs::metadata(&path_buf).map(|m| m.len()).unwrap_or(0);

            Ok::<_, WaybillError>(WriteStatistics {
                write_time: start.elapsed(),
                file_size,
                output_path: path_buf,
                page_count,
            })
        })
        .await??;

        tracing::debug!(
            path = %stats.output_path.display(),
            pages = stats.page_count,
            size = %stats.format_file_size(),
            "wrote document"
        );

        Ok(stats)
    }
}

fn write_document(doc: &mut Document, path: &Path, buffer_size: usize) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| WaybillError::FailedToCreateOutput {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);

    doc.save_to(&mut writer)
        .map_err(|e| WaybillError::FailedToWrite {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

    writer.flush().map_err(|e| WaybillError::FailedToWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// `Ready/1001.pdf` becomes `Ready/1001.pdf.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
