//! Fixtures shared by unit and integration tests: an in-memory backend and
//! a generator for small text-only PDFs.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};

use crate::{
    backend::{PageBackend, TextBackend, select_pages},
    error::{Error, Result},
    pages::PageSelection,
};

/// Build a PDF with one page per entry of `pages`, each showing its text
/// in Helvetica.
pub fn pdf_with_pages(pages: &[&str]) -> lopdf::Result<Vec<u8>> {
    build_pdf(pages, "F1", true)
}

/// Build a one-page PDF whose text uses font `F9` without declaring any
/// font resources.
pub fn pdf_with_undeclared_font(text: &str) -> lopdf::Result<Vec<u8>> {
    build_pdf(&[text], "F9", false)
}

fn build_pdf(
    pages: &[&str],
    font: &str,
    with_resources: bool,
) -> lopdf::Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![font.into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let mut tree = dictionary! {
        "Type" => "Pages",
        "Count" => pages.len() as i64,
        "Kids" => kids,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    if with_resources {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                font => font_id,
            },
        });
        tree.set("Resources", resources_id);
    }
    doc.objects.insert(pages_id, Object::Dictionary(tree));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)?;
    Ok(buf)
}

/// A backend serving page text from memory, usable as both the primary and
/// the alternate backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    documents: HashMap<PathBuf, Vec<String>>,
    broken: HashSet<PathBuf>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(
        mut self,
        path: impl Into<PathBuf>,
        pages: &[&str],
    ) -> Self {
        self.documents.insert(
            path.into(),
            pages.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Register a document that fails to extract.
    pub fn with_broken(mut self, path: impl Into<PathBuf>) -> Self {
        self.broken.insert(path.into());
        self
    }

    fn pages(&self, path: &Path) -> Result<&[String]> {
        if self.broken.contains(path) {
            return Err(Error::extraction(path, "corrupt document"));
        }
        self.documents
            .get(path)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::extraction(path, "no such document"))
    }
}

impl PageBackend for MemoryBackend {
    fn extract_pages(
        &self,
        path: &Path,
        selection: Option<&PageSelection>,
    ) -> Result<Vec<String>> {
        select_pages(path, self.pages(path)?, selection)
    }
}

impl TextBackend for MemoryBackend {
    fn count_pages(&self, path: &Path) -> Result<usize> {
        Ok(self.pages(path)?.len())
    }

    fn extract_text(
        &self,
        path: &Path,
        selection: Option<&PageSelection>,
    ) -> Result<String> {
        Ok(select_pages(path, self.pages(path)?, selection)?.concat())
    }
}
