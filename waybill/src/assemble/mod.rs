//! Two-sided (duplex) page layout.
//!
//! A composited waybill is laid out for duplex printing in two passes:
//!
//! - **Blank interleave**: every page is followed by a blank back side,
//!   except pages 3 and 6, which are printed back to back with their
//!   successors.
//! - **Template insertion**: the template's first page follows page 5 of the
//!   interleaved sequence and its second page follows page 10.
//!
//! The offsets are fixed by the physical form and are not configurable.

use lopdf::Document;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, WaybillError};
use crate::page::{Page, PageRef};

/// Pages (1-indexed) not followed by a blank.
pub const BLANK_SKIP_AFTER: [usize; 2] = [3, 6];

/// Interleaved page (1-indexed) followed by the template's first page.
pub const TEMPLATE_FRONT_AFTER: usize = 5;

/// Interleaved page (1-indexed) followed by the template's second page.
pub const TEMPLATE_BACK_AFTER: usize = 10;

/// The duplex template: a document of at least two pages.
#[derive(Debug, Clone)]
pub struct DuplexTemplate {
    path: PathBuf,
    front: PageRef,
    back: PageRef,
}

impl DuplexTemplate {
    /// Wrap a loaded template document.
    ///
    /// # Errors
    ///
    /// Returns InvalidConfig if the document has fewer than two readable
    /// pages.
    pub fn new(path: impl Into<PathBuf>, document: Document) -> Result<Self> {
        let path = path.into();
        let document = Arc::new(document);
        let page_count = document.get_pages().len();
        if page_count < 2 {
            return Err(WaybillError::invalid_config(format!(
                "Template {} must have at least 2 pages, found {page_count}",
                path.display()
            )));
        }

        let front = PageRef::new(Arc::clone(&document), 1)
            .map_err(|e| WaybillError::invalid_config(format!("Template page 1: {e}")))?;
        let back = PageRef::new(document, 2)
            .map_err(|e| WaybillError::invalid_config(format!("Template page 2: {e}")))?;

        Ok(Self { path, front, back })
    }

    /// File the template was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Page inserted after interleaved page 5.
    pub fn front(&self) -> Page {
        Page::Template(self.front.clone())
    }

    /// Page inserted after interleaved page 10.
    pub fn back(&self) -> Page {
        Page::Template(self.back.clone())
    }
}

/// Append `filler(item)` after every item whose 1-indexed position is not
/// in `skip`.
pub fn interleave<T, F>(items: Vec<T>, skip: &[usize], mut filler: F) -> Vec<T>
where
    F: FnMut(&T) -> T,
{
    let mut out = Vec::with_capacity(items.len() * 2);
    for (index, item) in items.into_iter().enumerate() {
        let extra = (!skip.contains(&(index + 1))).then(|| filler(&item));
        out.push(item);
        out.extend(extra);
    }
    out
}

/// Insert each `(position, item)` after the item at that 1-indexed position.
///
/// Positions beyond the end of `items` are ignored.
pub fn insert_after<T: Clone>(items: Vec<T>, inserts: &[(usize, T)]) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len() + inserts.len());
    for (index, item) in items.into_iter().enumerate() {
        out.push(item);
        out.extend(
            inserts
                .iter()
                .filter(|(position, _)| *position == index + 1)
                .map(|(_, extra)| extra.clone()),
        );
    }
    out
}

/// Lay out composited pages for duplex printing.
///
/// An empty input gives an empty output.
pub fn assemble_two_sided(pages: Vec<Page>, template: &DuplexTemplate) -> Vec<Page> {
    let interleaved = interleave(pages, &BLANK_SKIP_AFTER, |page| {
        Page::blank(page.media_box())
    });
    insert_after(
        interleaved,
        &[
            (TEMPLATE_FRONT_AFTER, template.front()),
            (TEMPLATE_BACK_AFTER, template.back()),
        ],
    )
}
