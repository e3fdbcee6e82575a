//! Shared helpers for the integration tests.
//!
//! PDFs are synthesised in memory: every page draws one text marker, so the
//! tests can tell which layers ended up on which page and in what order.

#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{Document, Object, Stream, dictionary};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use waybill::config::{Background, Config};

/// A temporary base directory with the conventional layout.
pub struct Workspace {
    _dir: TempDir,
    pub config: Config,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config::from_base_dir(dir.path());
        config.quiet = true;
        for d in [&config.railway_dir, &config.template_dir, &config.stamp_dir] {
            std::fs::create_dir_all(d).unwrap();
        }
        Self { _dir: dir, config }
    }

    /// Write a source waybill.
    pub fn railway(&self, name: &str, markers: &[&str]) -> PathBuf {
        let path = self.config.railway_dir.join(name);
        write_pdf(&path, marked_pdf(markers));
        path
    }

    /// Write a stamp.
    pub fn stamp(&self, name: &str, marker: &str) -> PathBuf {
        let path = self.config.stamp_dir.join(name);
        write_pdf(&path, marked_pdf(&[marker]));
        path
    }

    /// Write a background and select it.
    pub fn background(&mut self, marker: &str) -> PathBuf {
        let path = self.config.template_dir.join("Instruction (China).pdf");
        write_pdf(&path, marked_pdf(&[marker]));
        self.config.background = Background::Path(path.clone());
        path
    }

    /// Write the duplex template.
    pub fn template(&self, markers: &[&str]) -> PathBuf {
        let path = self.config.template_file.clone();
        write_pdf(&path, marked_pdf(markers));
        path
    }

    /// Write a ready document.
    pub fn ready(&self, name: &str, markers: &[&str]) -> PathBuf {
        std::fs::create_dir_all(&self.config.ready_dir).unwrap();
        let path = self.config.ready_dir.join(name);
        write_pdf(&path, marked_pdf(markers));
        path
    }

    /// Names of the files in `dir`, sorted.
    pub fn listing(&self, dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// A document whose page `i` draws `markers[i]`.
pub fn marked_pdf(markers: &[&str]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for marker in markers {
        let content = format!("BT /F1 12 Tf 72 720 Td ({marker}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn write_pdf(path: &Path, mut doc: Document) {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialise PDF");
    std::fs::write(path, bytes).expect("Failed to write PDF");
}

pub fn load_pdf(path: &Path) -> Document {
    let bytes = std::fs::read(path).expect("Failed to read PDF");
    Document::load_mem(&bytes).expect("Failed to parse PDF")
}

/// Markers drawn on each page, in drawing order.
///
/// Form XObjects are followed in `Do` order, so a composited page reads
/// bottom layer first.
pub fn page_markers(doc: &Document) -> Vec<Vec<String>> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let content = doc.get_page_content(page_id).unwrap();
            let resources = resolve_dict(doc, page.get(b"Resources").ok());
            let mut markers = Vec::new();
            collect_markers(doc, &content, resources, &mut markers);
            markers
        })
        .collect()
}

fn resolve_dict<'a>(doc: &'a Document, obj: Option<&'a Object>) -> Option<&'a lopdf::Dictionary> {
    match obj? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn collect_markers(
    doc: &Document,
    content: &[u8],
    resources: Option<&lopdf::Dictionary>,
    out: &mut Vec<String>,
) {
    let content = Content::decode(content).expect("Failed to decode content");
    for op in &content.operations {
        match op.operator.as_str() {
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    out.push(String::from_utf8_lossy(bytes).into_owned());
                }
            }
            "Do" => {
                let name = op.operands[0].as_name().unwrap();
                let xobjects = resolve_dict(doc, resources.and_then(|r| r.get(b"XObject").ok()))
                    .expect("Do without XObject resources");
                let form_id = xobjects.get(name).and_then(Object::as_reference).unwrap();
                let form = doc.get_object(form_id).and_then(Object::as_stream).unwrap();
                let data = form
                    .decompressed_content()
                    .unwrap_or_else(|_| form.content.clone());
                let form_resources = resolve_dict(doc, form.dict.get(b"Resources").ok());
                collect_markers(doc, &data, form_resources, out);
            }
            _ => {}
        }
    }
}
