use std::{io::IsTerminal, path::PathBuf};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::{
    batch::BatchOptions,
    error::Result,
    filename::Separators,
    pages::PageSelection,
    search::{BackendChoice, SearchOptions},
    table::TableBackend,
    text_util::UnicodeForm,
};

/// Pattern used when no documents are given.
pub const DEFAULT_PATTERN: &str = "*.pdf";

#[derive(Debug, Parser)]
#[command(
    name = "pdf-word-counter",
    version,
    about = "Search PDFs for words and build a statistics table"
)]
pub struct Cli {
    /// Words to find (comma-separated)
    #[arg(required_unless_present = "completions")]
    pub words: Option<String>,

    /// PDF files or glob patterns [default: *.pdf]
    pub pdfs: Vec<String>,

    // -- Search options --
    /// Case-sensitive search
    #[arg(long, help_heading = "Search options")]
    pub case: bool,

    /// Pages to include, e.g. '1,3-5,-1' (zero-based)
    #[arg(long, help_heading = "Search options")]
    pub pages: Option<String>,

    /// Use the whole-document extraction backend
    #[arg(long, help_heading = "Search options")]
    pub miner: bool,

    /// Log progress every N pages (page backend only)
    #[arg(long, value_name = "N", help_heading = "Search options")]
    pub pprint: Option<usize>,

    /// Normalise Unicode text before matching
    #[arg(long, help_heading = "Search options")]
    pub unicode: bool,

    /// Unicode normalisation form
    #[arg(
        long,
        value_enum,
        default_value_t = UnicodeForm::Nfkc,
        help_heading = "Search options"
    )]
    pub form: UnicodeForm,

    // -- Output control --
    /// Write the output table to this file
    #[arg(long, help_heading = "Output control")]
    pub outfile: Option<PathBuf>,

    /// Print the table to stdout
    #[arg(long, help_heading = "Output control")]
    pub show: bool,

    /// Sort by these columns (comma-separated)
    #[arg(long, value_delimiter = ',', help_heading = "Output control")]
    pub sort: Vec<String>,

    /// Format used for --outfile
    #[arg(
        long,
        value_enum,
        default_value_t = TableBackend::Aligned,
        help_heading = "Output control"
    )]
    pub backend: TableBackend,

    // -- Filename parsing --
    /// Keep the file extension in the file column
    #[arg(long, help_heading = "Filename parsing")]
    pub ext: bool,

    /// Add a 'year' column taken from the file name
    #[arg(long, help_heading = "Filename parsing")]
    pub year: bool,

    /// Year used when a file name has none
    #[arg(long, requires = "year", help_heading = "Filename parsing")]
    pub default_year: Option<String>,

    /// Separator columns as JSON, e.g. '{"_": {"category": 0}}'
    #[arg(long, value_name = "JSON", help_heading = "Filename parsing")]
    pub dsep: Option<String>,

    // -- Column toggles --
    /// Omit the file column
    #[arg(long, help_heading = "Column toggles")]
    pub nfile: bool,

    /// Omit the pages column
    #[arg(long, help_heading = "Column toggles")]
    pub npages: bool,

    // -- Performance --
    /// Documents searched in parallel
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Log progress every N files (serial mode)
    #[arg(long, value_name = "N")]
    pub ppdf: Option<usize>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate shell completions
    #[arg(long, value_enum, hide = true, exclusive = true)]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Search terms, trimmed, with empty entries dropped.
    pub fn terms(&self) -> Vec<String> {
        self.words
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn patterns(&self) -> Vec<String> {
        if self.pdfs.is_empty() {
            vec![DEFAULT_PATTERN.to_string()]
        } else {
            self.pdfs.clone()
        }
    }

    pub fn search_options(&self) -> Result<SearchOptions> {
        let separators = match &self.dsep {
            Some(json) => Separators::from_json(json)?,
            None => Separators::default(),
        };
        Ok(SearchOptions {
            case_sensitive: self.case,
            pages: PageSelection::parse(self.pages.as_deref())?,
            include_pages: !self.npages,
            include_year: self.year,
            default_year: self.default_year.clone(),
            include_filename: !self.nfile,
            keep_extension: self.ext,
            separators,
            progress_interval: self.pprint,
            backend: if self.miner {
                BackendChoice::Alternate
            } else {
                BackendChoice::Primary
            },
            normalization: self.unicode.then_some(self.form),
        })
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            workers: self.workers,
            milestones: self.ppdf,
            sort_columns: self
                .sort
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            output: self.outfile.clone(),
            show: self.show,
            table_backend: self.backend,
            progress: !self.quiet && std::io::stderr().is_terminal(),
        }
    }
}

/// Print shell completions to stdout.
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(
        shell,
        &mut cmd,
        "pdf-word-counter",
        &mut std::io::stdout(),
    );
}
