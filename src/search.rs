use std::path::Path;

use tracing::{debug, info};

use crate::{
    backend::{Backends, TextBackend},
    error::Result,
    filename::{Separators, apply_separators, display_name, extract_year},
    matcher::WordMatcher,
    pages::PageSelection,
    table::{Row, Table, Value},
    text_util::{UnicodeForm, maybe_normalize},
};

pub const FILE_COLUMN: &str = "file";
pub const YEAR_COLUMN: &str = "year";
pub const PAGES_COLUMN: &str = "pages";

/// Which extraction path a search should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendChoice {
    /// Per-page extraction.
    #[default]
    Primary,
    /// Whole-document extraction, falling back to `Primary` when the
    /// alternate backend is not available.
    Alternate,
}

/// Per-document search settings. Every document of a batch is searched with
/// the same options, which is what keeps the row schema uniform.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub pages: Option<PageSelection>,
    pub include_pages: bool,
    pub include_year: bool,
    pub default_year: Option<String>,
    pub include_filename: bool,
    pub keep_extension: bool,
    pub separators: Separators,
    /// Log a progress line every N pages (primary backend only).
    pub progress_interval: Option<usize>,
    pub backend: BackendChoice,
    pub normalization: Option<UnicodeForm>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            pages: None,
            include_pages: true,
            include_year: false,
            default_year: None,
            include_filename: true,
            keep_extension: false,
            separators: Separators::default(),
            progress_interval: None,
            backend: BackendChoice::Primary,
            normalization: None,
        }
    }
}

/// Counts term occurrences in one document at a time.
#[derive(Debug)]
pub struct DocumentSearcher {
    backends: Backends,
    matcher: WordMatcher,
    options: SearchOptions,
}

impl DocumentSearcher {
    /// Compile `terms` and bind them to the backends and options. Invalid
    /// terms are reported here, before any document is opened.
    pub fn new<S: AsRef<str>>(
        backends: Backends,
        terms: &[S],
        options: SearchOptions,
    ) -> Result<Self> {
        let matcher = WordMatcher::compile(terms, options.case_sensitive)?;
        if options.backend == BackendChoice::Alternate
            && backends.alternate().is_none()
        {
            debug!("alternate backend not available, using page extraction");
        }
        Ok(Self {
            backends,
            matcher,
            options,
        })
    }

    pub fn matcher(&self) -> &WordMatcher {
        &self.matcher
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Search one document and return its result as a single-row table.
    pub fn search(&self, document: &Path) -> Result<Table> {
        let name = display_name(document, self.options.keep_extension);
        let mut row = self.skeleton(document, &name);

        match self.text_backend() {
            Some(backend) => self.count_whole(backend, document, &mut row)?,
            None => self.count_per_page(document, &name, &mut row)?,
        }

        Ok(Table::from_row(row))
    }

    fn text_backend(&self) -> Option<&dyn TextBackend> {
        match self.options.backend {
            BackendChoice::Alternate => self.backends.alternate(),
            BackendChoice::Primary => None,
        }
    }

    /// Lay out every column in its final order before any counting happens.
    fn skeleton(&self, document: &Path, name: &str) -> Row {
        let options = &self.options;
        let mut row = Row::new();

        if options.include_filename {
            row.set(FILE_COLUMN, name);
        }
        if options.include_year {
            let full_name = display_name(document, true);
            row.set(
                YEAR_COLUMN,
                extract_year(&full_name, options.default_year.as_deref()),
            );
        }
        if !options.separators.is_empty() {
            // Reserve every separator column so rows stay uniform even when
            // a name has too few parts for some of them.
            for column in options.separators.column_names() {
                row.set(column, Value::Missing);
            }
            for (column, value) in apply_separators(name, &options.separators)
            {
                row.set(&column, value);
            }
        }
        if options.include_pages {
            row.set(PAGES_COLUMN, 0u64);
        }
        for term in self.matcher.terms() {
            row.set(term, 0u64);
        }
        row
    }

    fn count_whole(
        &self,
        backend: &dyn TextBackend,
        document: &Path,
        row: &mut Row,
    ) -> Result<()> {
        let options = &self.options;
        let (page_count, text) =
            backend.extract_with_count(document, options.pages.as_ref())?;
        if options.include_pages {
            row.set(PAGES_COLUMN, page_count as u64);
        }

        let text = maybe_normalize(&text, options.normalization);
        for (term, count) in self.matcher.counts(&text) {
            row.set(term, count);
        }
        Ok(())
    }

    /// Count page by page. Normalization is applied to each page on its
    /// own, so a match cannot span a page break here.
    fn count_per_page(
        &self,
        document: &Path,
        name: &str,
        row: &mut Row,
    ) -> Result<()> {
        let options = &self.options;
        let pages = self
            .backends
            .primary()
            .extract_pages(document, options.pages.as_ref())?;

        if options.include_pages {
            let count = options
                .pages
                .as_ref()
                .map_or(pages.len(), PageSelection::len);
            row.set(PAGES_COLUMN, count as u64);
        }

        let total = pages.len();
        let mut totals = vec![0u64; self.matcher.len()];
        for (i, page) in pages.iter().enumerate() {
            let number = i + 1;
            if is_progress_page(number, options.progress_interval) {
                info!("{}", page_progress_line(name, number, total));
            }

            let text = maybe_normalize(page, options.normalization);
            for (slot, (_, count)) in
                totals.iter_mut().zip(self.matcher.counts(&text))
            {
                *slot += count;
            }
        }

        for (term, total) in self.matcher.terms().zip(totals) {
            row.set(term, total);
        }
        Ok(())
    }
}

/// Whether one-based page `number` gets a progress line when logging every
/// `every` pages.
fn is_progress_page(number: usize, every: Option<usize>) -> bool {
    every.is_some_and(|every| every > 0 && number % every == 0)
}

fn page_progress_line(name: &str, number: usize, total: usize) -> String {
    format!("[{name}] page {number}/{total}")
}
