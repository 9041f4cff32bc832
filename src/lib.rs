//! pdf-word-counter - count word occurrences across PDF documents.
//!
//! Each document is searched for a list of terms (regular expressions) and
//! summarised as one row: the file name, optional columns derived from the
//! name, the page count, and one count per term. Rows from a batch share a
//! single schema and are merged into a [`Table`] that can be sorted, shown,
//! or written as aligned text, CSV, or JSON.
//!
//! # Quick start
//!
//! ```no_run
//! use pdf_word_counter::{Backends, SearchOptions};
//! use pdf_word_counter::batch::{self, BatchOptions};
//!
//! let options = SearchOptions {
//!     include_year: true,
//!     ..SearchOptions::default()
//! };
//! let batch_options = BatchOptions {
//!     workers: 4,
//!     sort_columns: vec!["year".to_string()],
//!     ..BatchOptions::default()
//! };
//!
//! let table = batch::run(
//!     &["reports/*.pdf"],
//!     &["climate", "carbon"],
//!     options,
//!     &batch_options,
//!     Backends::detect(),
//! )
//! .unwrap();
//! println!("{table}");
//! ```

pub mod backend;
pub mod batch;
pub mod cli;
pub mod error;
pub mod filename;
pub mod matcher;
pub mod pages;
pub mod search;
pub mod table;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod text_util;
pub mod walker;

pub use backend::Backends;
pub use batch::BatchOptions;
pub use error::{Error, Result};
pub use matcher::WordMatcher;
pub use pages::PageSelection;
pub use search::{DocumentSearcher, SearchOptions};
pub use table::{Row, Table, TableBackend, Value};
