//! Rendering [`Page`] values into a new PDF document.
//!
//! Source and template pages are copied verbatim, with inherited page
//! attributes written onto the copy. Composited pages turn every layer into a
//! Form XObject sized to its page and draw them in order:
//!
//! ```text
//! q /L0 Do Q
//! q /L1 Do Q
//! ...
//! ```
//!
//! Objects are deep-copied once per output document, keyed by the document
//! they came from, so a background drawn under fifty pages shares its fonts
//! and images.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::HashMap;
use std::sync::Arc;

use super::{INHERITABLE_ATTRIBUTES, Layer, Page, PageRef, inherited_attribute};
use crate::error::{Result, WaybillError};

type CopyKey = (usize, ObjectId);

fn copy_key(origin: &Arc<Document>, id: ObjectId) -> CopyKey {
    (Arc::as_ptr(origin) as usize, id)
}

/// Incrementally builds an output document from pages.
pub struct DocumentBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    copies: HashMap<CopyKey, ObjectId>,
    forms: HashMap<CopyKey, ObjectId>,
    // Pins every origin whose address is used in a copy key.
    origins: Vec<Arc<Document>>,
}

impl DocumentBuilder {
    /// Start an empty document.
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            copies: HashMap::new(),
            forms: HashMap::new(),
            origins: Vec::new(),
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append one page.
    pub fn push(&mut self, page: &Page) -> Result<()> {
        let number = self.kids.len() + 1;
        let page_id = match page {
            Page::Source(page) | Page::Template(page) => self.copy_page(page)?,
            Page::Blank { media_box } => {
                let contents = self.doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                self.doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => self.pages_id,
                    "MediaBox" => media_box.to_object(),
                    "Resources" => dictionary! {},
                    "Contents" => contents,
                })
            }
            Page::Composited {
                media_box,
                rotate,
                layers,
            } => {
                let mut xobjects = Dictionary::new();
                let mut operations = Vec::with_capacity(layers.len() * 3);
                for (index, layer) in layers.iter().enumerate() {
                    let name = format!("L{index}");
                    let form_id = self.form_for(layer)?;
                    xobjects.set(name.as_bytes().to_vec(), form_id);
                    operations.push(Operation::new("q", vec![]));
                    operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
                    operations.push(Operation::new("Q", vec![]));
                }
                let content = Content { operations }
                    .encode()
                    .map_err(|e| WaybillError::compositing(number, e.to_string()))?;
                let contents = self.doc.add_object(Stream::new(dictionary! {}, content));

                let mut dict = dictionary! {
                    "Type" => "Page",
                    "Parent" => self.pages_id,
                    "MediaBox" => media_box.to_object(),
                    "Resources" => dictionary! { "XObject" => xobjects },
                    "Contents" => contents,
                };
                if *rotate != 0 {
                    dict.set("Rotate", *rotate);
                }
                self.doc.add_object(dict)
            }
        };
        self.kids.push(page_id.into());
        Ok(())
    }

    /// Close the page tree and return the document.
    pub fn finish(mut self) -> Document {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }

    fn pin(&mut self, origin: &Arc<Document>) {
        if !self.origins.iter().any(|o| Arc::ptr_eq(o, origin)) {
            self.origins.push(Arc::clone(origin));
        }
    }

    fn copy_page(&mut self, page: &PageRef) -> Result<ObjectId> {
        let origin = Arc::clone(page.origin());
        self.pin(&origin);

        let key = copy_key(&origin, page.page_id());
        if let Some(&existing) = self.copies.get(&key) {
            // Same page twice in one document: the second needs its own object.
            let dict = self.doc.get_dictionary(existing)?.clone();
            return Ok(self.doc.add_object(dict));
        }

        let source = origin
            .get_dictionary(page.page_id())
            .map_err(|e| WaybillError::compositing(page.number(), e.to_string()))?;

        let new_id = self.doc.new_object_id();
        self.copies.insert(key, new_id);

        let mut dict = Dictionary::new();
        for (name, value) in source.iter() {
            if name.as_slice() == b"Parent" {
                continue;
            }
            let copied = self.copy_object(&origin, value);
            dict.set(name.clone(), copied);
        }
        for name in INHERITABLE_ATTRIBUTES {
            if !dict.has(name)
                && let Some(value) = inherited_attribute(&origin, source, name)
            {
                let copied = self.copy_object(&origin, &value);
                dict.set(name.to_vec(), copied);
            }
        }
        dict.set("Parent", self.pages_id);

        self.doc.objects.insert(new_id, Object::Dictionary(dict));
        Ok(new_id)
    }

    fn form_for(&mut self, layer: &Layer) -> Result<ObjectId> {
        let origin = Arc::clone(layer.origin());
        self.pin(&origin);

        let key = copy_key(&origin, layer.page_id());
        if let Some(&form_id) = self.forms.get(&key) {
            return Ok(form_id);
        }

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1,
            "BBox" => layer.bbox().to_object(),
        };
        if let Some(resources) = layer.resources() {
            let copied = self.copy_object(&origin, resources);
            dict.set("Resources", copied);
        }

        let form_id = self
            .doc
            .add_object(Stream::new(dict, layer.content().to_vec()));
        self.forms.insert(key, form_id);
        Ok(form_id)
    }

    /// Deep copy `obj` from `origin`, following references.
    ///
    /// References to page-tree nodes that have not been copied as pages
    /// become null, so copying an annotation never drags in its document's
    /// whole page tree.
    fn copy_object(&mut self, origin: &Arc<Document>, obj: &Object) -> Object {
        match obj {
            Object::Reference(id) => {
                let key = copy_key(origin, *id);
                if let Some(&new_id) = self.copies.get(&key) {
                    return Object::Reference(new_id);
                }

                let Ok(referenced) = origin.get_object(*id) else {
                    return Object::Null;
                };
                if is_page_tree_node(referenced) {
                    return Object::Null;
                }

                // Reserve first so reference cycles terminate.
                let new_id = self.doc.new_object_id();
                self.copies.insert(key, new_id);
                let copied = self.copy_object(origin, referenced);
                self.doc.objects.insert(new_id, copied);
                Object::Reference(new_id)
            }
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(origin, dict)),
            Object::Array(arr) => Object::Array(
                arr.iter()
                    .map(|item| self.copy_object(origin, item))
                    .collect(),
            ),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(origin, &stream.dict);
                let mut copy = Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Object::Stream(copy)
            }
            _ => obj.clone(),
        }
    }

    fn copy_dictionary(&mut self, origin: &Arc<Document>, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (name, value) in dict.iter() {
            let value = self.copy_object(origin, value);
            copy.set(name.clone(), value);
        }
        copy
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn is_page_tree_node(obj: &Object) -> bool {
    obj.as_dict()
        .and_then(|d| d.get(b"Type"))
        .and_then(Object::as_name)
        .map(|name| name == b"Page" || name == b"Pages")
        .unwrap_or(false)
}

/// Render `pages` into a new document, in order.
pub fn render_pages(pages: &[Page]) -> Result<Document> {
    let mut builder = DocumentBuilder::new();
    for page in pages {
        builder.push(page)?;
    }
    Ok(builder.finish())
}
