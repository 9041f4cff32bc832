//! Running a search over many documents and merging the results.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc,
    },
};

use kdam::{Bar, BarExt, tqdm};
use tracing::{debug, info, warn};

use crate::{
    backend::Backends,
    error::Result,
    search::{DocumentSearcher, SearchOptions},
    table::{Table, TableBackend},
    walker::resolve_documents,
};

/// How a batch is dispatched and what happens to its result.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Documents searched at once. `0` and `1` both mean serial.
    pub workers: usize,
    /// Serial mode only: log roughly this many milestone lines instead of
    /// drawing a progress bar.
    pub milestones: Option<usize>,
    pub sort_columns: Vec<String>,
    pub output: Option<PathBuf>,
    /// Print the table to stdout.
    pub show: bool,
    pub table_backend: TableBackend,
    /// Draw a progress bar on stderr.
    pub progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            milestones: None,
            sort_columns: Vec::new(),
            output: None,
            show: false,
            table_backend: TableBackend::default(),
            progress: false,
        }
    }
}

/// Searches a list of documents, one single-row table per document.
pub trait Runner {
    fn run(
        &self,
        searcher: &DocumentSearcher,
        documents: &[PathBuf],
    ) -> Result<Vec<Table>>;
}

/// One document at a time, in the given order. Stops at the first failure.
#[derive(Debug, Clone, Default)]
pub struct SerialRunner {
    pub milestones: Option<usize>,
    pub progress: bool,
}

/// Documents spread over a rayon pool; results arrive in completion order.
///
/// After the first failure, documents that have not started yet are
/// skipped. Searches already running finish, and the pool is joined
/// before the error is returned.
#[derive(Debug, Clone)]
pub struct PooledRunner {
    pub workers: usize,
    pub progress: bool,
}

/// Pick the runner matching the configured worker count.
pub fn runner_for(options: &BatchOptions) -> Box<dyn Runner> {
    if options.workers > 1 {
        Box::new(PooledRunner {
            workers: options.workers,
            progress: options.progress,
        })
    } else {
        Box::new(SerialRunner {
            milestones: options.milestones,
            progress: options.progress,
        })
    }
}

/// Progress bar that may be switched off.
struct Progress(Option<Bar>);

impl Progress {
    fn new(enabled: bool, total: usize) -> Self {
        Self(enabled.then(|| tqdm!(total = total, desc = "PDFs", unit = "pdf")))
    }

    fn tick(&mut self) {
        if let Some(bar) = &mut self.0 {
            bar.update(1).ok();
        }
    }

    fn finish(self) {
        if self.0.is_some() {
            eprintln!();
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Documents between two milestone lines when about `milestones` lines
/// are wanted for `total` documents. `None` when milestones are off.
fn milestone_stride(total: usize, milestones: Option<usize>) -> Option<usize> {
    milestones
        .filter(|&m| m > 0)
        .map(|m| total.div_ceil(m).max(1))
}

/// Zero-based positions of the documents that get a milestone line.
fn milestone_indices(total: usize, milestones: Option<usize>) -> Vec<usize> {
    match milestone_stride(total, milestones) {
        Some(stride) => (0..total).step_by(stride).collect(),
        None => Vec::new(),
    }
}

fn milestone_line(index: usize, total: usize, document: &Path) -> String {
    format!("{:02}/{:02} [{}]", index + 1, total, file_name(document))
}

impl Runner for SerialRunner {
    fn run(
        &self,
        searcher: &DocumentSearcher,
        documents: &[PathBuf],
    ) -> Result<Vec<Table>> {
        let total = documents.len();
        let logged = self.milestones.is_some_and(|m| m > 0);
        let mut milestones =
            milestone_indices(total, self.milestones).into_iter().peekable();
        let mut progress = Progress::new(self.progress && !logged, total);

        let mut tables = Vec::with_capacity(total);
        for (i, document) in documents.iter().enumerate() {
            if milestones.next_if_eq(&i).is_some() {
                info!("{}", milestone_line(i, total, document));
            }
            tables.push(searcher.search(document)?);
            progress.tick();
        }
        progress.finish();
        Ok(tables)
    }
}

impl Runner for PooledRunner {
    fn run(
        &self,
        searcher: &DocumentSearcher,
        documents: &[PathBuf],
    ) -> Result<Vec<Table>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        let total = documents.len();
        let finished = AtomicUsize::new(0);
        let cancelled = AtomicBool::new(false);
        let mut progress = Progress::new(self.progress, total);
        let mut tables = Vec::with_capacity(total);
        let mut failure = None;

        pool.in_place_scope(|scope| {
            let (tx, rx) = mpsc::channel();
            for document in documents {
                let tx = tx.clone();
                let (finished, cancelled) = (&finished, &cancelled);
                scope.spawn(move |_| {
                    if cancelled.load(Ordering::Acquire) {
                        return;
                    }
                    let result = searcher.search(document);
                    finished.fetch_add(1, Ordering::AcqRel);
                    // The receiver lives until every sender is gone.
                    tx.send((document, result)).ok();
                });
            }
            drop(tx);

            for (document, result) in rx {
                progress.tick();
                match result {
                    Ok(table) => tables.push(table),
                    Err(e) if failure.is_none() => {
                        cancelled.store(true, Ordering::Release);
                        failure = Some(e);
                    }
                    Err(e) => debug!("{}: {e}", document.display()),
                }
            }
        });
        progress.finish();

        if let Some(e) = failure {
            warn!(
                "batch stopped: {} of {total} document(s) searched, {} row(s) discarded",
                finished.load(Ordering::Acquire),
                tables.len()
            );
            return Err(e);
        }
        debug!("{} document(s) searched", finished.load(Ordering::Acquire));
        Ok(tables)
    }
}

/// Search every document matched by `patterns` for `terms` and return the
/// merged table.
///
/// Terms are compiled before the patterns are resolved, so a bad term fails
/// without touching the file system.
pub fn run<P: AsRef<str>, T: AsRef<str>>(
    patterns: &[P],
    terms: &[T],
    search: SearchOptions,
    options: &BatchOptions,
    backends: Backends,
) -> Result<Table> {
    let searcher = DocumentSearcher::new(backends, terms, search)?;
    let documents = resolve_documents(patterns)?;
    info!(
        "searching {} document(s) for {} term(s)",
        documents.len(),
        searcher.matcher().len()
    );

    let tables = runner_for(options).run(&searcher, &documents)?;
    let mut table = Table::concat(tables)?;

    if !options.sort_columns.is_empty() {
        let used = table.sort_by(&options.sort_columns);
        if used.len() < options.sort_columns.len() {
            let ignored: Vec<&str> = options
                .sort_columns
                .iter()
                .filter(|c| !used.contains(*c))
                .map(String::as_str)
                .collect();
            debug!("ignoring unknown sort column(s): {}", ignored.join(", "));
        }
    }

    if options.show {
        println!("{table}");
    }

    if let Some(path) = &options.output {
        table.write(path, options.table_backend)?;
        info!("Results saved to {}", path.display());
    }

    Ok(table)
}
