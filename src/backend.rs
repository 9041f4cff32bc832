//! Text extraction backends.
//!
//! The searcher talks to two kinds of backend: a [`PageBackend`] that
//! returns one string per page, and an optional [`TextBackend`] that counts
//! pages and returns the selected text as one string. Which of them exist
//! is decided once, when [`Backends`] is built.

use std::{fmt, path::Path, sync::Arc};

use lopdf::Document;

use crate::{
    error::{Error, Result},
    pages::PageSelection,
};

/// Primary extraction: text per page.
pub trait PageBackend: Send + Sync {
    /// Extract the text of the selected pages (all pages when `selection`
    /// is `None`), in selection order.
    fn extract_pages(
        &self,
        path: &Path,
        selection: Option<&PageSelection>,
    ) -> Result<Vec<String>>;
}

/// Alternate extraction: whole-document text.
pub trait TextBackend: Send + Sync {
    fn count_pages(&self, path: &Path) -> Result<usize>;

    /// Extract the selected pages concatenated into one string.
    fn extract_text(
        &self,
        path: &Path,
        selection: Option<&PageSelection>,
    ) -> Result<String>;

    /// The document's page count together with the selected text.
    /// Backends that parse the whole document for either answer should
    /// override this to parse it once.
    fn extract_with_count(
        &self,
        path: &Path,
        selection: Option<&PageSelection>,
    ) -> Result<(usize, String)> {
        Ok((self.count_pages(path)?, self.extract_text(path, selection)?))
    }
}

/// The extraction capabilities available to a run.
#[derive(Clone)]
pub struct Backends {
    primary: Arc<dyn PageBackend>,
    alternate: Option<Arc<dyn TextBackend>>,
}

impl Backends {
    pub fn new(primary: Arc<dyn PageBackend>) -> Self {
        Self {
            primary,
            alternate: None,
        }
    }

    pub fn with_alternate(mut self, alternate: Arc<dyn TextBackend>) -> Self {
        self.alternate = Some(alternate);
        self
    }

    /// lopdf as the primary backend, plus pdf-extract when the crate was
    /// built with the `pdf-extract` feature.
    pub fn detect() -> Self {
        let backends = Self::new(Arc::new(LopdfBackend));
        #[cfg(feature = "pdf-extract")]
        let backends = backends.with_alternate(Arc::new(PdfExtractBackend));
        backends
    }

    pub fn primary(&self) -> &dyn PageBackend {
        self.primary.as_ref()
    }

    pub fn alternate(&self) -> Option<&dyn TextBackend> {
        self.alternate.as_deref()
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("alternate", &self.alternate.is_some())
            .finish_non_exhaustive()
    }
}

/// Pick the selected items out of `pages`, failing on indices that fall
/// outside the document.
pub(crate) fn select_pages<T: Clone>(
    path: &Path,
    pages: &[T],
    selection: Option<&PageSelection>,
) -> Result<Vec<T>> {
    let Some(selection) = selection else {
        return Ok(pages.to_vec());
    };
    selection
        .resolve(pages.len())
        .map(|indices| indices.into_iter().map(|i| pages[i].clone()).collect())
        .map_err(|index| {
            Error::extraction(
                path,
                format!(
                    "page index {index} is out of range for {} page(s)",
                    pages.len()
                ),
            )
        })
}

/// Per-page extraction with lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl PageBackend for LopdfBackend {
    fn extract_pages(
        &self,
        path: &Path,
        selection: Option<&PageSelection>,
    ) -> Result<Vec<String>> {
        let document =
            Document::load(path).map_err(|e| Error::extraction(path, e))?;

        // lopdf numbers pages from 1.
        let numbers: Vec<u32> = document.get_pages().into_keys().collect();
        select_pages(path, &numbers, selection)?
            .into_iter()
            .map(|number| {
                document
                    .extract_text(&[number])
                    .map_err(|e| Error::extraction(path, e))
            })
            .collect()
    }
}

/// Whole-document extraction with pdf-extract.
#[cfg(feature = "pdf-extract")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractBackend;

#[cfg(feature = "pdf-extract")]
impl PdfExtractBackend {
    fn pages(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = std::fs::read(path).map_err(|e| Error::extraction(path, e))?;
        // pdf-extract panics on some malformed documents (a page naming a
        // font its resources lack, for one).
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        }))
        .map_err(|payload| Error::extraction(path, panic_message(&*payload)))?
        .map_err(|e| Error::extraction(path, e))
    }
}

#[cfg(feature = "pdf-extract")]
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("extractor panicked: {detail}")
}

#[cfg(feature = "pdf-extract")]
impl TextBackend for PdfExtractBackend {
    fn count_pages(&self, path: &Path) -> Result<usize> {
        Ok(self.pages(path)?.len())
    }

    fn extract_text(
        &self,
        path: &Path,
        selection: Option<&PageSelection>,
    ) -> Result<String> {
        Ok(self.extract_with_count(path, selection)?.1)
    }

    fn extract_with_count(
        &self,
        path: &Path,
        selection: Option<&PageSelection>,
    ) -> Result<(usize, String)> {
        let pages = self.pages(path)?;
        let text = select_pages(path, &pages, selection)?.concat();
        Ok((pages.len(), text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pdf_with_pages, pdf_with_undeclared_font};

    fn write_pdf(dir: &Path, name: &str, pages: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, pdf_with_pages(pages).unwrap()).unwrap();
        path
    }

    #[test]
    fn select_all_pages_without_selection() {
        let pages = vec!["a", "b", "c"];
        let picked = select_pages(Path::new("x.pdf"), &pages, None).unwrap();
        assert_eq!(picked, pages);
    }

    #[test]
    fn select_follows_selection_order() {
        let pages = vec!["a", "b", "c"];
        let selection = PageSelection::new(vec![-1, 0]);
        let picked =
            select_pages(Path::new("x.pdf"), &pages, Some(&selection)).unwrap();
        assert_eq!(picked, vec!["c", "a"]);
    }

    #[test]
    fn select_out_of_range_names_document() {
        let selection = PageSelection::new(vec![3]);
        let err = select_pages(Path::new("x.pdf"), &["a"], Some(&selection))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("x.pdf"), "{message}");
        assert!(message.contains("page index 3"), "{message}");
    }

    #[test]
    fn lopdf_extracts_each_page() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_pdf(tmp.path(), "doc.pdf", &["apple pie", "banana"]);

        let pages = LopdfBackend.extract_pages(&path, None).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("apple"), "{pages:?}");
        assert!(pages[1].contains("banana"), "{pages:?}");
    }

    #[test]
    fn lopdf_honours_selection() {
        let tmp = tempfile::tempdir().unwrap();
        let path =
            write_pdf(tmp.path(), "doc.pdf", &["first", "second", "third"]);

        let selection = PageSelection::new(vec![-1]);
        let pages = LopdfBackend.extract_pages(&path, Some(&selection)).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("third"), "{pages:?}");
    }

    #[test]
    fn lopdf_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let err = LopdfBackend.extract_pages(&path, None).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn lopdf_missing_file_is_extraction_error() {
        let err = LopdfBackend
            .extract_pages(Path::new("/nonexistent/nothing.pdf"), None)
            .unwrap_err();
        assert!(err.to_string().contains("nothing.pdf"));
    }

    #[cfg(feature = "pdf-extract")]
    #[test]
    fn pdf_extract_reports_panics_as_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("no_font.pdf");
        std::fs::write(&path, pdf_with_undeclared_font("odd").unwrap())
            .unwrap();

        let err = PdfExtractBackend.extract_text(&path, None).unwrap_err();
        match err {
            Error::Extraction { path: failed, message } => {
                assert_eq!(failed, path);
                assert!(message.contains("panicked"), "{message}");
            }
            other => panic!("expected extraction error, got {other:?}"),
        }
        assert!(PdfExtractBackend.count_pages(&path).is_err());
    }

    #[cfg(feature = "pdf-extract")]
    #[test]
    fn pdf_extract_text_and_count_in_one_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_pdf(tmp.path(), "doc.pdf", &["one", "two", "three"]);
        let selection = PageSelection::new(vec![1]);

        let (count, text) = PdfExtractBackend
            .extract_with_count(&path, Some(&selection))
            .unwrap();
        assert_eq!(count, 3);
        assert!(text.contains("two"), "{text:?}");
        assert!(!text.contains("three"), "{text:?}");
    }

    #[test]
    fn lopdf_tolerates_undeclared_font() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("no_font.pdf");
        std::fs::write(&path, pdf_with_undeclared_font("odd").unwrap())
            .unwrap();
        assert_eq!(LopdfBackend.extract_pages(&path, None).unwrap().len(), 1);
    }

    #[cfg(feature = "pdf-extract")]
    #[test]
    fn pdf_extract_counts_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_pdf(tmp.path(), "doc.pdf", &["one", "two", "three"]);
        assert_eq!(PdfExtractBackend.count_pages(&path).unwrap(), 3);
    }

    #[test]
    fn detect_always_has_primary() {
        let backends = Backends::detect();
        assert_eq!(
            backends.alternate().is_some(),
            cfg!(feature = "pdf-extract")
        );
    }
}
