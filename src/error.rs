use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid search term '{term}': {source}")]
    Pattern {
        term: String,
        #[source]
        source: regex::Error,
    },

    #[error("no PDF files matched the given pattern(s): {patterns}")]
    NoDocuments { patterns: String },

    #[error("failed to extract text from {}: {message}", .path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("invalid page range '{spec}': {reason}")]
    PageRange { spec: String, reason: String },

    #[error("invalid separator mapping: {0}")]
    Separators(String),

    #[error("invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("table error: {0}")]
    Table(String),

    #[error("could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn extraction(
        path: impl Into<PathBuf>,
        message: impl ToString,
    ) -> Self {
        Error::Extraction {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
