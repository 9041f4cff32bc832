use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Characters that make a pattern a glob rather than a literal path.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Whether `pattern` contains glob metacharacters.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

/// Expand `patterns` into a sorted, de-duplicated list of documents.
///
/// Literal paths are kept as given, whether or not they exist. Globs are
/// matched against regular files below their literal directory prefix;
/// hidden files and directories are skipped. An empty result is an error.
pub fn resolve_documents<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    for pattern in patterns.iter().map(AsRef::as_ref) {
        if pattern.is_empty() {
            continue;
        }
        if is_glob(pattern) {
            let before = documents.len();
            expand_glob(pattern, &mut documents)?;
            debug!(
                "pattern '{pattern}' matched {} file(s)",
                documents.len() - before
            );
        } else {
            documents.push(PathBuf::from(pattern));
        }
    }

    documents.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    documents.dedup();

    if documents.is_empty() {
        let patterns: Vec<&str> = patterns.iter().map(AsRef::as_ref).collect();
        return Err(Error::NoDocuments {
            patterns: patterns.join(", "),
        });
    }
    Ok(documents)
}

/// A compiled glob plus where to start walking for it.
struct GlobWalk {
    base: PathBuf,
    matcher: GlobMatcher,
    /// `None` when the pattern contains `**`.
    max_depth: Option<usize>,
}

impl GlobWalk {
    fn new(pattern: &str) -> Result<Self> {
        let path = Path::new(pattern);
        let mut base = PathBuf::new();
        let mut rest = PathBuf::new();
        let mut in_glob = false;

        for component in path.components() {
            let is_meta = matches!(
                component,
                Component::Normal(part) if is_glob(&part.to_string_lossy())
            );
            in_glob |= is_meta;
            if in_glob {
                rest.push(component);
            } else {
                base.push(component);
            }
        }

        let rest = rest.to_string_lossy().into_owned();
        let max_depth = if rest.contains("**") {
            None
        } else {
            Some(Path::new(&rest).components().count())
        };
        let matcher = GlobBuilder::new(&rest)
            .literal_separator(true)
            .build()
            .map_err(|source| Error::Glob {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();

        Ok(Self {
            base,
            matcher,
            max_depth,
        })
    }

    /// Directory to read; an empty base means the working directory.
    fn root(&self) -> &Path {
        if self.base.as_os_str().is_empty() {
            Path::new(".")
        } else {
            &self.base
        }
    }

    fn walk(
        &self,
        dir: &Path,
        relative: &Path,
        depth: usize,
        out: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if depth == 0 && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();

            // Skip hidden files and directories.
            if file_name.to_string_lossy().starts_with('.') {
                continue;
            }

            let relative = relative.join(&file_name);
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                if self.max_depth.is_none_or(|max| depth + 1 < max) {
                    self.walk(&entry.path(), &relative, depth + 1, out)?;
                }
            } else if entry.path().is_file() && self.matcher.is_match(&relative)
            {
                trace!("matched {}", relative.display());
                out.push(self.base.join(&relative));
            }
        }
        Ok(())
    }
}

fn expand_glob(pattern: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    let glob = GlobWalk::new(pattern)?;
    glob.walk(glob.root(), Path::new(""), 0, out)
}
