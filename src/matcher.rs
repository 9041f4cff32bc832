use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

/// A set of compiled search terms sharing one case-sensitivity mode.
///
/// Terms are regular expressions, so callers that want literal matching
/// must escape metacharacters themselves. Terms keep their input order and
/// repeated terms are compiled separately.
#[derive(Debug, Clone)]
pub struct WordMatcher {
    terms: Vec<(String, Regex)>,
    case_sensitive: bool,
}

impl WordMatcher {
    /// Compile every term, failing on the first invalid pattern.
    pub fn compile<S: AsRef<str>>(
        terms: &[S],
        case_sensitive: bool,
    ) -> Result<Self> {
        let terms = terms
            .iter()
            .map(|term| {
                let term = term.as_ref();
                RegexBuilder::new(term)
                    .case_insensitive(!case_sensitive)
                    .build()
                    .map(|regex| (term.to_string(), regex))
                    .map_err(|source| Error::Pattern {
                        term: term.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            terms,
            case_sensitive,
        })
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|(term, _)| term.as_str())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Non-overlapping matches of the term at `index` in `text`, or `None`
    /// when there is no such term.
    pub fn count(&self, index: usize, text: &str) -> Option<u64> {
        let (_, regex) = self.terms.get(index)?;
        Some(regex.find_iter(text).count() as u64)
    }

    /// Number of non-overlapping matches of each term in `text`, in term
    /// order.
    pub fn counts<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = (&'a str, u64)> + 'a {
        self.terms.iter().map(move |(term, regex)| {
            (term.as_str(), regex.find_iter(text).count() as u64)
        })
    }
}
