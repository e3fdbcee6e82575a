//! Page concatenation.
//!
//! Member documents are renumbered into one object space and their pages
//! hung under a fresh page tree, in member order. Whatever is no longer
//! reachable afterwards (the members' own catalogs, page trees and outlines)
//! is pruned.

use lopdf::{Document, Object, ObjectId, dictionary};

use crate::error::{Result, WaybillError};
use crate::page::{INHERITABLE_ATTRIBUTES, inherited_attribute};

/// Concatenate the pages of `documents`, in order, into a new document.
///
/// # Errors
///
/// Returns MergeFailed if `documents` is empty or the page tree cannot be
/// updated.
pub fn concatenate(documents: Vec<Document>) -> Result<Document> {
    if documents.is_empty() {
        return Err(WaybillError::merge_failed("No documents to concatenate"));
    }

    let mut merged = Document::with_version("1.7");
    let pages_id = merged.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<Object>::new(),
        "Count" => 0,
    });
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    let mut max_id = merged.max_id;
    for mut doc in documents {
        materialize_inherited(&mut doc);

        // Renumber objects to avoid ID conflicts
        doc.renumber_objects_with(max_id + 1);
        max_id = doc.max_id;

        let doc_pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        merged.objects.extend(doc.objects);

        for &page_id in &doc_pages {
            if let Ok(page) = merged.get_dictionary_mut(page_id) {
                page.set("Parent", pages_id);
            }
        }
        add_pages_to_tree(&mut merged, &doc_pages)?;
    }
    merged.max_id = max_id;

    merged.prune_objects();
    merged.renumber_objects();

    Ok(merged)
}

/// Copy inherited page attributes onto each page, so pages survive being
/// moved out of their original page tree.
fn materialize_inherited(doc: &mut Document) {
    for page_id in doc.get_pages().into_values() {
        let missing: Vec<(&[u8], Object)> = match doc.get_dictionary(page_id) {
            Ok(page) => INHERITABLE_ATTRIBUTES
                .iter()
                .filter(|name| !page.has(name))
                .filter_map(|name| inherited_attribute(doc, page, name).map(|v| (*name, v)))
                .collect(),
            Err(_) => continue,
        };

        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            for (name, value) in missing {
                page.set(name.to_vec(), value);
            }
        }
    }
}

/// Add pages to the merged document's page tree.
fn add_pages_to_tree(merged: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let pages_id = merged
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| WaybillError::merge_failed(format!("Failed to get pages reference: {e}")))?;

    let pages = merged
        .get_dictionary_mut(pages_id)
        .map_err(|e| WaybillError::merge_failed(format!("Failed to get pages object: {e}")))?;

    match pages.get_mut(b"Kids") {
        Ok(Object::Array(kids)) => kids.extend(page_ids.iter().map(|&id| Object::Reference(id))),
        _ => return Err(WaybillError::merge_failed("Pages dictionary missing Kids array")),
    }

    let current_count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    pages.set("Count", current_count + page_ids.len() as i64);

    Ok(())
}
