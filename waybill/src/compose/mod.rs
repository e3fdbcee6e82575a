//! Background, original and stamp layering.
//!
//! Every page of a source waybill is composited independently:
//!
//! 1. with a background, the source page is drawn over a fresh copy of the
//!    background's first page;
//! 2. with a stamp, a fresh copy of the stamp's first page is drawn over the
//!    result.
//!
//! Failures degrade the page instead of failing the document. A failed
//! background layer leaves the unmodified source page, a failed stamp leaves
//! the page without the stamp, and a page that cannot be read at all is
//! dropped. Every degradation is logged and recorded as a [`PageFault`].

use lopdf::Document;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Result, WaybillError};
use crate::io::PdfReader;
use crate::key::{Key, key_of_path};
use crate::page::{Page, PageRef};
use crate::stamps::StampIndex;

/// A single-page overlay (background or stamp) shared by every page it is
/// applied to.
#[derive(Debug, Clone)]
pub struct Overlay {
    path: PathBuf,
    document: Arc<Document>,
}

impl Overlay {
    /// Wrap an already loaded document.
    ///
    /// # Errors
    ///
    /// Returns MalformedDocument if the document has no pages.
    pub fn from_document(path: impl Into<PathBuf>, document: Document) -> Result<Self> {
        let path = path.into();
        if document.get_pages().is_empty() {
            return Err(WaybillError::malformed(path, "overlay has no pages"));
        }
        Ok(Self {
            path,
            document: Arc::new(document),
        })
    }

    /// Load an overlay from disk.
    pub async fn load(reader: &PdfReader, path: &Path) -> Result<Self> {
        let loaded = reader.load(path).await?;
        Self::from_document(loaded.path, loaded.document)
    }

    /// File the overlay was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A new page value for the overlay's first page.
    ///
    /// Each call yields an independent value, so layering one copy can
    /// never show up on another.
    pub fn fresh_page(&self) -> Result<Page> {
        PageRef::new(Arc::clone(&self.document), 1).map(Page::Source)
    }
}

/// A waybill to be composited.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// File the document was read from.
    pub path: PathBuf,
    /// Key extracted from the file name, if any.
    pub key: Option<Key>,
    /// Parsed document.
    pub document: Arc<Document>,
}

impl SourceDocument {
    /// Wrap a loaded document, deriving its key from the file name.
    pub fn new(path: impl Into<PathBuf>, document: Document) -> Self {
        let path = path.into();
        Self {
            key: key_of_path(&path),
            path,
            document: Arc::new(document),
        }
    }
}

/// Which layer a page fault concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    /// The source page itself could not be read; it was dropped.
    Source,
    /// The background could not be applied; the page was kept as is.
    Background,
    /// The stamp could not be applied; the page was kept without it.
    Stamp,
}

/// A degraded page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFault {
    /// 1-indexed page number in the source document.
    pub page: usize,
    /// Layer that failed.
    pub layer: LayerKind,
    /// What went wrong.
    pub reason: String,
}

/// Outcome of compositing one document.
#[derive(Debug, Clone)]
pub struct Composition {
    /// Composited pages, in source order.
    pub pages: Vec<Page>,
    /// Every degradation that happened, in page order.
    pub faults: Vec<PageFault>,
    /// Source pages that could not be read and were left out.
    pub pages_dropped: usize,
}

/// Composite every page of `source` with an optional background underneath
/// and an optional stamp on top.
///
/// Without background and stamp the result is the source pages unchanged.
pub fn composite(
    source: &SourceDocument,
    background: Option<&Overlay>,
    stamp: Option<&Overlay>,
) -> Composition {
    let mut pages = Vec::new();
    let mut faults = Vec::new();
    let mut pages_dropped = 0;

    for (index, page) in PageRef::all(&source.document).into_iter().enumerate() {
        let number = index + 1;
        let original = match page {
            Ok(page) => Page::Source(page),
            Err(err) => {
                warn!(file = %source.path.display(), page = number, "dropping unreadable page: {err}");
                faults.push(PageFault {
                    page: number,
                    layer: LayerKind::Source,
                    reason: err.to_string(),
                });
                pages_dropped += 1;
                continue;
            }
        };

        let mut target = original.clone();

        if let Some(background) = background {
            match background
                .fresh_page()
                .and_then(|under| original.layer_onto(&under))
            {
                Ok(layered) => {
                    debug!(page = number, background = %background.path().display(), "background applied");
                    target = layered;
                }
                Err(err) => {
                    warn!(file = %source.path.display(), page = number, "background skipped: {err}");
                    faults.push(PageFault {
                        page: number,
                        layer: LayerKind::Background,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if let Some(stamp) = stamp {
            match stamp.fresh_page().and_then(|over| over.layer_onto(&target)) {
                Ok(layered) => {
                    debug!(page = number, stamp = %stamp.path().display(), "stamp applied");
                    target = layered;
                }
                Err(err) => {
                    warn!(file = %source.path.display(), page = number, "stamp skipped: {err}");
                    faults.push(PageFault {
                        page: number,
                        layer: LayerKind::Stamp,
                        reason: err.to_string(),
                    });
                }
            }
        }

        pages.push(target);
    }

    Composition {
        pages,
        faults,
        pages_dropped,
    }
}

/// Per-run compositing context: the selected background and the stamp index.
#[derive(Debug, Default)]
pub struct Compositor {
    background: Option<Overlay>,
    stamps: StampIndex,
}

impl Compositor {
    /// Create a compositor.
    pub fn new(background: Option<Overlay>, stamps: StampIndex) -> Self {
        Self { background, stamps }
    }

    /// Background applied to every page, if any.
    pub fn background(&self) -> Option<&Overlay> {
        self.background.as_ref()
    }

    /// Stamp index used for matching.
    pub fn stamps(&self) -> &StampIndex {
        &self.stamps
    }

    /// Stamp matching `source`'s key exactly, if any.
    pub fn stamp_for(&self, source: &SourceDocument) -> Option<&Overlay> {
        source.key.and_then(|key| self.stamps.lookup(key))
    }

    /// Composite `source` with this run's background and its own stamp.
    pub fn composite(&self, source: &SourceDocument) -> Composition {
        composite(source, self.background(), self.stamp_for(source))
    }
}
