//! Error types for waybill.
//!
//! Every failure the pipeline can hit is a [`WaybillError`]. Errors fall into
//! four broad kinds (see [`ErrorKind`]):
//!
//! - **Configuration**: a required template or background is missing or
//!   malformed, or the directory layout is inconsistent. Aborts the scenario.
//! - **Malformed document**: a source PDF cannot be read or has no pages.
//!   Only that file is skipped.
//! - **Compositing**: a layering step failed. The page degrades to a fallback.
//! - **I/O**: a write failed. Only that file or bundle is skipped.
//! - **Other**: anything unclassified, such as a panicked worker task.

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for waybill operations.
pub type Result<T> = std::result::Result<T, WaybillError>;

/// Main error type for waybill operations.
#[derive(Debug, Error)]
pub enum WaybillError {
    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input file exists but could not be read.
    #[error("Cannot access file: {}\n  Reason: {source}", path.display())]
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// PDF could not be parsed, or parsed into something unusable.
    #[error("Malformed PDF: {}\n  Reason: {reason}", path.display())]
    MalformedDocument {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// PDF is encrypted and cannot be processed.
    #[error(
        "PDF is encrypted and cannot be processed: {}\n  \
         Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools",
        path.display()
    )]
    EncryptedPdf {
        /// Path to the encrypted PDF.
        path: PathBuf,
    },

    /// A page could not be read or layered.
    #[error("Compositing failed on page {page}: {reason}")]
    Compositing {
        /// 1-indexed page number within its document.
        page: usize,
        /// Details about the failure.
        reason: String,
    },

    /// A bundle could not be assembled from its members.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// Invalid configuration or missing required resource.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Error raised by the PDF object model.
    #[error("PDF error: {source}")]
    Pdf {
        /// Underlying lopdf error.
        #[from]
        source: lopdf::Error,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

/// Coarse classification of a [`WaybillError`], as recorded in run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Missing or malformed required resource; scenario-fatal.
    Configuration,
    /// Unreadable or empty source document; the file is skipped.
    MalformedDocument,
    /// A layering step failed.
    Compositing,
    /// Writing an output failed.
    Io,
    /// Unclassified failure.
    Other,
}

impl From<anyhow::Error> for WaybillError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<tokio::task::JoinError> for WaybillError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::other(format!("Background task failed: {err}"))
    }
}

impl WaybillError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a MalformedDocument error.
    pub fn malformed(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path,
            reason: reason.into(),
        }
    }

    /// Create an EncryptedPdf error.
    pub fn encrypted_pdf(path: PathBuf) -> Self {
        Self::EncryptedPdf { path }
    }

    /// Create a Compositing error for a 1-indexed page.
    pub fn compositing(page: usize, reason: impl Into<String>) -> Self {
        Self::Compositing {
            page,
            reason: reason.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig { .. } => ErrorKind::Configuration,
            Self::FileNotFound { .. }
            | Self::FileNotAccessible { .. }
            | Self::MalformedDocument { .. }
            | Self::EncryptedPdf { .. }
            | Self::Pdf { .. } => ErrorKind::MalformedDocument,
            Self::Compositing { .. } | Self::MergeFailed { .. } => ErrorKind::Compositing,
            Self::FailedToCreateOutput { .. } | Self::FailedToWrite { .. } | Self::Io { .. } => {
                ErrorKind::Io
            }
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Check if this error only affects the current file or bundle.
    ///
    /// Everything except configuration errors is local to one item.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Configuration
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::MalformedDocument { .. } => 3,
            Self::EncryptedPdf { .. } => 3,
            Self::Pdf { .. } => 3,
            Self::Compositing { .. } => 6,
            Self::MergeFailed { .. } => 6,
            Self::InvalidConfig { .. } => 1,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
