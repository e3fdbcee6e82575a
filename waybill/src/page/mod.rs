//! Immutable page values and the single composition operation.
//!
//! A [`Page`] never mutates the document it came from. Layering two pages
//! with [`Page::layer_onto`] yields a new [`Page::Composited`] value that
//! lists every layer bottom to top; nothing is drawn until the page is
//! rendered into an output document by [`render::DocumentBuilder`].

pub mod render;

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, WaybillError};

/// Page attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

const MAX_TREE_DEPTH: usize = 64;

/// Rectangle in default user space: lower-left x/y, upper-right x/y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    /// Lower-left x.
    pub llx: f32,
    /// Lower-left y.
    pub lly: f32,
    /// Upper-right x.
    pub urx: f32,
    /// Upper-right y.
    pub ury: f32,
}

impl MediaBox {
    /// ISO A4 portrait, used when a page has no readable media box.
    pub const A4: Self = Self {
        llx: 0.0,
        lly: 0.0,
        urx: 595.0,
        ury: 842.0,
    };

    /// Parse a PDF rectangle array.
    pub fn from_object(obj: &Object) -> Option<Self> {
        let arr = obj.as_array().ok()?;
        if arr.len() != 4 {
            return None;
        }
        let mut values = [0.0f32; 4];
        for (slot, item) in values.iter_mut().zip(arr) {
            *slot = number(item)?;
        }
        Some(Self {
            llx: values[0],
            lly: values[1],
            urx: values[2],
            ury: values[3],
        })
    }

    /// Encode as a PDF rectangle array.
    pub fn to_object(self) -> Object {
        Object::Array(vec![
            Object::Real(self.llx),
            Object::Real(self.lly),
            Object::Real(self.urx),
            Object::Real(self.ury),
        ])
    }

    /// Width in points.
    pub fn width(&self) -> f32 {
        (self.urx - self.llx).abs()
    }

    /// Height in points.
    pub fn height(&self) -> f32 {
        (self.ury - self.lly).abs()
    }
}

impl Default for MediaBox {
    fn default() -> Self {
        Self::A4
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Look up `key` on a page dictionary, walking up `/Parent` links for
/// inheritable attributes.
pub fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    if let Ok(value) = page.get(key) {
        return Some(value.clone());
    }

    let mut current = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(current?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        current = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

type Leaf = std::result::Result<ObjectId, ObjectId>;

/// Leaves of the page tree, readable (`Ok`) or not (`Err`), in order.
fn page_tree_leaves(doc: &Document) -> Option<Vec<Leaf>> {
    let root = doc
        .catalog()
        .ok()?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .ok()?;
    let mut leaves = Vec::new();
    let mut visited = HashSet::new();
    collect_leaves(doc, root, 0, &mut visited, &mut leaves);
    Some(leaves)
}

fn collect_leaves(
    doc: &Document,
    node_id: ObjectId,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    leaves: &mut Vec<Leaf>,
) {
    if depth > MAX_TREE_DEPTH || !visited.insert(node_id) {
        return;
    }
    let Ok(kids) = doc
        .get_dictionary(node_id)
        .and_then(|node| node.get(b"Kids"))
        .and_then(Object::as_array)
    else {
        return;
    };

    for kid in kids {
        let Ok(kid_id) = kid.as_reference() else {
            continue;
        };
        match doc.get_dictionary(kid_id) {
            Ok(dict) if is_intermediate_node(dict) => {
                collect_leaves(doc, kid_id, depth + 1, visited, leaves)
            }
            Ok(_) => leaves.push(Ok(kid_id)),
            Err(_) => leaves.push(Err(kid_id)),
        }
    }
}

fn is_intermediate_node(dict: &Dictionary) -> bool {
    match dict.get(b"Type").and_then(Object::as_name) {
        Ok(name) => name == b"Pages",
        Err(_) => dict.has(b"Kids"),
    }
}

/// Resolve `obj` through at most one indirection.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// A page of a loaded document.
///
/// Holds the document by `Arc`, so any number of pages (and copies of the
/// same page) can exist without copying PDF objects.
#[derive(Clone)]
pub struct PageRef {
    origin: Arc<Document>,
    page_id: ObjectId,
    number: usize,
}

impl PageRef {
    /// Reference page `number` (1-indexed) of `origin`.
    ///
    /// # Errors
    ///
    /// Returns a Compositing error if the page does not exist or its
    /// dictionary cannot be read.
    pub fn new(origin: Arc<Document>, number: usize) -> Result<Self> {
        let page_id = u32::try_from(number)
            .ok()
            .and_then(|n| origin.get_pages().get(&n).copied())
            .ok_or_else(|| WaybillError::compositing(number, "page does not exist"))?;
        Self::from_id(origin, page_id, number)
    }

    /// Reference the page object `page_id`, known to be page `number`.
    pub fn from_id(origin: Arc<Document>, page_id: ObjectId, number: usize) -> Result<Self> {
        origin
            .get_dictionary(page_id)
            .map_err(|e| WaybillError::compositing(number, format!("unreadable page: {e}")))?;
        Ok(Self {
            origin,
            page_id,
            number,
        })
    }

    /// Every page of `origin` in page-tree order, each readable or not.
    ///
    /// Unlike [`Document::get_pages`], leaves whose objects are missing or
    /// not dictionaries are reported as errors instead of being skipped, so
    /// callers can account for them.
    pub fn all(origin: &Arc<Document>) -> Vec<Result<PageRef>> {
        let leaves = page_tree_leaves(origin)
            .unwrap_or_else(|| origin.get_pages().into_values().map(Ok).collect());

        leaves
            .into_iter()
            .enumerate()
            .map(|(index, leaf)| {
                let number = index + 1;
                match leaf {
                    Ok(page_id) => Self::from_id(Arc::clone(origin), page_id, number),
                    Err((id, generation)) => Err(WaybillError::compositing(
                        number,
                        format!("page object {id} {generation} R is unreadable"),
                    )),
                }
            })
            .collect()
    }

    /// Document this page belongs to.
    pub fn origin(&self) -> &Arc<Document> {
        &self.origin
    }

    /// Object id of the page dictionary in its document.
    pub fn page_id(&self) -> ObjectId {
        self.page_id
    }

    /// 1-indexed page number within its document.
    pub fn number(&self) -> usize {
        self.number
    }

    fn dictionary(&self) -> Result<&Dictionary> {
        self.origin
            .get_dictionary(self.page_id)
            .map_err(|e| WaybillError::compositing(self.number, format!("unreadable page: {e}")))
    }

    /// Inherited or own value of `key`.
    pub fn attribute(&self, key: &[u8]) -> Option<Object> {
        let dict = self.dictionary().ok()?;
        inherited_attribute(&self.origin, dict, key)
    }

    /// Media box, falling back to A4 when missing or malformed.
    pub fn media_box(&self) -> MediaBox {
        self.attribute(b"MediaBox")
            .and_then(|obj| resolve(&self.origin, &obj).and_then(MediaBox::from_object))
            .unwrap_or_default()
    }

    /// Page rotation in degrees, normalised to 0, 90, 180 or 270.
    pub fn rotate(&self) -> i64 {
        self.attribute(b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .map(|deg| deg.rem_euclid(360) / 90 * 90)
            .unwrap_or(0)
    }

    /// Capture this page as a drawable layer.
    ///
    /// # Errors
    ///
    /// Returns a Compositing error if the page or one of its content streams
    /// cannot be read or decoded.
    pub fn layer(&self) -> Result<Layer> {
        let dict = self.dictionary()?;
        let content = page_content(&self.origin, dict)
            .map_err(|reason| WaybillError::compositing(self.number, reason))?;
        let resources = inherited_attribute(&self.origin, dict, b"Resources");

        Ok(Layer {
            origin: Arc::clone(&self.origin),
            page_id: self.page_id,
            content: Arc::new(content),
            resources,
            bbox: self.media_box(),
        })
    }
}

impl fmt::Debug for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRef")
            .field("page_id", &self.page_id)
            .field("number", &self.number)
            .finish()
    }
}

/// Decoded content of a page, multiple streams joined by newlines.
fn page_content(doc: &Document, page: &Dictionary) -> std::result::Result<Vec<u8>, String> {
    let contents = match page.get(b"Contents") {
        Ok(obj) => obj,
        Err(_) => return Ok(Vec::new()),
    };

    let ids: Vec<ObjectId> = match contents {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
            Ok(_) => vec![*id],
            Err(e) => return Err(format!("missing content stream {id:?}: {e}")),
        },
        Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
        _ => return Err("Contents is neither a stream nor an array".into()),
    };

    let mut data = Vec::new();
    for id in ids {
        let stream = doc
            .get_object(id)
            .and_then(Object::as_stream)
            .map_err(|e| format!("missing content stream {id:?}: {e}"))?;
        let bytes = if stream.dict.has(b"Filter") {
            stream
                .decompressed_content()
                .map_err(|e| format!("cannot decode content stream {id:?}: {e}"))?
        } else {
            stream.content.clone()
        };
        if !data.is_empty() {
            data.push(b'\n');
        }
        data.extend_from_slice(&bytes);
    }
    Ok(data)
}

/// One drawing layer of a composited page: a page's decoded content with
/// the resources it needs.
#[derive(Clone)]
pub struct Layer {
    origin: Arc<Document>,
    page_id: ObjectId,
    content: Arc<Vec<u8>>,
    resources: Option<Object>,
    bbox: MediaBox,
}

impl Layer {
    /// Decoded content stream.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Bounding box of the layer (its page's media box).
    pub fn bbox(&self) -> MediaBox {
        self.bbox
    }

    pub(crate) fn origin(&self) -> &Arc<Document> {
        &self.origin
    }

    pub(crate) fn page_id(&self) -> ObjectId {
        self.page_id
    }

    pub(crate) fn resources(&self) -> Option<&Object> {
        self.resources.as_ref()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("page_id", &self.page_id)
            .field("content_len", &self.content.len())
            .field("bbox", &self.bbox)
            .finish()
    }
}

/// A page of an output document.
#[derive(Debug, Clone)]
pub enum Page {
    /// A page of a source waybill, rendered verbatim.
    Source(PageRef),
    /// An empty page.
    Blank {
        /// Size of the page.
        media_box: MediaBox,
    },
    /// A page of the duplex template, rendered verbatim.
    Template(PageRef),
    /// A stack of layers drawn bottom to top.
    Composited {
        /// Size of the page (taken from the bottom layer's page).
        media_box: MediaBox,
        /// Rotation in degrees (taken from the bottom layer's page).
        rotate: i64,
        /// Layers, bottom first.
        layers: Vec<Layer>,
    },
}

impl Page {
    /// Page of the given size with nothing on it.
    pub fn blank(media_box: MediaBox) -> Self {
        Self::Blank { media_box }
    }

    /// Media box of the page.
    pub fn media_box(&self) -> MediaBox {
        match self {
            Self::Source(page) | Self::Template(page) => page.media_box(),
            Self::Blank { media_box } | Self::Composited { media_box, .. } => *media_box,
        }
    }

    /// Rotation in degrees.
    pub fn rotate(&self) -> i64 {
        match self {
            Self::Source(page) | Self::Template(page) => page.rotate(),
            Self::Blank { .. } => 0,
            Self::Composited { rotate, .. } => *rotate,
        }
    }

    /// Layers this page draws, bottom first.
    pub fn layers(&self) -> Result<Vec<Layer>> {
        match self {
            Self::Source(page) | Self::Template(page) => Ok(vec![page.layer()?]),
            Self::Blank { .. } => Ok(Vec::new()),
            Self::Composited { layers, .. } => Ok(layers.clone()),
        }
    }

    /// Draw `self` on top of `base`, returning a new page.
    ///
    /// The result takes its size and rotation from `base`. Neither operand
    /// is modified, so the same base can be layered any number of times.
    ///
    /// # Errors
    ///
    /// Returns a Compositing error if either page's content cannot be
    /// captured.
    pub fn layer_onto(&self, base: &Page) -> Result<Page> {
        let mut layers = base.layers()?;
        layers.extend(self.layers()?);
        Ok(Page::Composited {
            media_box: base.media_box(),
            rotate: base.rotate(),
            layers,
        })
    }
}
