//! Stamp lookup by waybill key.
//!
//! The stamp directory is scanned once per run. Every `*.pdf` whose name
//! carries a key and whose first page can be read becomes an entry; lookups
//! afterwards are exact key matches against the in-memory index.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::compose::Overlay;
use crate::error::Result;
use crate::io::PdfReader;
use crate::key::{Key, key_of_path};
use crate::utils;

/// A stamp file that was not indexed.
#[derive(Debug, Clone)]
pub struct SkippedStamp {
    /// The stamp file.
    pub path: PathBuf,
    /// Why it was left out.
    pub reason: String,
}

/// Key to stamp overlay, built once per run.
#[derive(Debug, Default)]
pub struct StampIndex {
    entries: BTreeMap<Key, Overlay>,
    skipped: Vec<SkippedStamp>,
}

impl StampIndex {
    /// Index every stamp in `dir`.
    ///
    /// A missing directory yields an empty index. Files are visited in
    /// sorted path order; when two stamps share a key the first one wins.
    /// Stamps without a key, unreadable stamps and stamps without pages are
    /// skipped with a warning.
    pub async fn build(dir: &Path, reader: &PdfReader) -> Result<Self> {
        let mut index = Self::default();

        if !dir.is_dir() {
            info!(dir = %dir.display(), "no stamp directory, stamping disabled");
            return Ok(index);
        }

        for path in utils::collect_pdf_paths(dir)? {
            let Some(key) = key_of_path(&path) else {
                index.skip(path, "file name has no key");
                continue;
            };

            if index.entries.contains_key(&key) {
                index.skip(path, format!("duplicate stamp for key {key}"));
                continue;
            }

            match Overlay::load(reader, &path).await {
                Ok(overlay) => {
                    debug!(key, path = %path.display(), "indexed stamp");
                    index.entries.insert(key, overlay);
                }
                Err(err) => index.skip(path, err.to_string()),
            }
        }

        info!(
            dir = %dir.display(),
            stamps = index.len(),
            skipped = index.skipped.len(),
            "stamp index built"
        );
        Ok(index)
    }

    fn skip(&mut self, path: PathBuf, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(path = %path.display(), "stamp skipped: {reason}");
        self.skipped.push(SkippedStamp { path, reason });
    }

    /// Add a stamp unless the key is already taken.
    ///
    /// Returns whether the stamp was added.
    pub fn insert(&mut self, key: Key, overlay: Overlay) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, overlay);
        true
    }

    /// Stamp for exactly `key`.
    pub fn lookup(&self, key: Key) -> Option<&Overlay> {
        self.entries.get(&key)
    }

    /// Number of indexed stamps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no stamp is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stamp files left out of the index.
    pub fn skipped(&self) -> &[SkippedStamp] {
        &self.skipped
    }
}
