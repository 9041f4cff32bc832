use crate::error::{Error, Result};

/// Upper bound on the number of indices one selection may hold.
pub const MAX_SELECTED_PAGES: usize = 1 << 20;

/// An ordered list of zero-based page indices.
///
/// Negative indices count from the end of the document (`-1` is the last
/// page). Indices are kept as given and only checked against a real page
/// count in [`PageSelection::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    indices: Vec<i64>,
}

impl PageSelection {
    pub fn new(indices: Vec<i64>) -> Self {
        Self { indices }
    }

    /// Parse a range spec such as `"1,3-5,-1"`.
    ///
    /// Tokens are separated by commas and are either a single integer or an
    /// inclusive `start-end` range. A range with `end < start` contributes
    /// nothing. Returns `None` for an absent or blank spec.
    pub fn parse(spec: Option<&str>) -> Result<Option<Self>> {
        let Some(spec) = spec.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };

        let mut indices = Vec::new();
        for token in spec.split(',').map(str::trim) {
            if token.is_empty() {
                continue;
            }
            if let Ok(index) = token.parse::<i64>() {
                indices.push(index);
                continue;
            }

            let (start, end) = split_range(token)
                .ok_or_else(|| invalid(spec, format!("bad token '{token}'")))?;
            if end < start {
                tracing::warn!(
                    "page range '{token}' is descending and selects no pages"
                );
                continue;
            }
            let span = end
                .checked_sub(start)
                .and_then(|d| usize::try_from(d).ok())
                .and_then(|d| d.checked_add(1))
                .filter(|&n| n <= MAX_SELECTED_PAGES - indices.len())
                .ok_or_else(|| {
                    invalid(
                        spec,
                        format!(
                            "'{token}' selects more than {MAX_SELECTED_PAGES} pages"
                        ),
                    )
                })?;
            indices.reserve(span);
            indices.extend(start..=end);
        }

        Ok(Some(Self { indices }))
    }

    pub fn indices(&self) -> &[i64] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Map every index onto `0..page_count`, resolving negative indices
    /// from the end. Returns the first offending index on failure.
    pub fn resolve(
        &self,
        page_count: usize,
    ) -> std::result::Result<Vec<usize>, i64> {
        self.indices
            .iter()
            .map(|&index| resolve_index(index, page_count).ok_or(index))
            .collect()
    }
}

fn resolve_index(index: i64, page_count: usize) -> Option<usize> {
    let count = i64::try_from(page_count).ok()?;
    let resolved = if index < 0 { count + index } else { index };
    (0..count).contains(&resolved).then_some(resolved as usize)
}

/// Split `start-end`, where `start` may itself carry a leading minus.
fn split_range(token: &str) -> Option<(i64, i64)> {
    let dash = token
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '-')
        .map(|(i, _)| i)?;
    let start = token[..dash].trim().parse().ok()?;
    let end = token[dash + 1..].trim().parse().ok()?;
    Some((start, end))
}

fn invalid(spec: &str, reason: String) -> Error {
    Error::PageRange {
        spec: spec.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(spec: &str) -> Option<Vec<i64>> {
        PageSelection::parse(Some(spec))
            .unwrap()
            .map(|s| s.indices().to_vec())
    }

    #[test]
    fn parses_mixed_spec() {
        assert_eq!(parse("1,3-5,-1"), Some(vec![1, 3, 4, 5, -1]));
    }

    #[test]
    fn absent_or_blank_is_none() {
        assert_eq!(PageSelection::parse(None).unwrap(), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
    }

    #[test]
    fn tolerates_spaces_and_empty_tokens() {
        assert_eq!(parse(" 0 , ,2 - 3"), Some(vec![0, 2, 3]));
    }

    #[test]
    fn negative_range() {
        assert_eq!(parse("-3--1"), Some(vec![-3, -2, -1]));
    }

    #[test]
    fn descending_range_is_empty() {
        assert_eq!(parse("5-3"), Some(vec![]));
        assert_eq!(parse("0,5-3,7"), Some(vec![0, 7]));
    }

    #[test]
    fn rejects_garbage() {
        let err = PageSelection::parse(Some("1,x")).unwrap_err();
        assert!(matches!(err, Error::PageRange { .. }));
        assert!(PageSelection::parse(Some("1-")).is_err());
        assert!(PageSelection::parse(Some("1-2-3")).is_err());
    }

    #[test]
    fn rejects_huge_ranges() {
        let err = PageSelection::parse(Some("0-9999999999")).unwrap_err();
        assert!(matches!(err, Error::PageRange { .. }));
        assert!(err.to_string().contains("0-9999999999"), "{err}");
        assert!(
            PageSelection::parse(Some(&format!("{}-{}", i64::MIN, i64::MAX)))
                .is_err()
        );
    }

    #[test]
    fn cap_applies_to_whole_selection() {
        let limit = MAX_SELECTED_PAGES as i64;
        let exact = format!("0-{}", limit - 1);
        assert_eq!(
            PageSelection::parse(Some(&exact)).unwrap().map(|s| s.len()),
            Some(MAX_SELECTED_PAGES)
        );
        let over = format!("{exact},{limit}-{limit}");
        assert!(PageSelection::parse(Some(&over)).is_err());
    }

    #[test]
    fn resolves_against_page_count() {
        let selection = PageSelection::new(vec![0, 2, -1]);
        assert_eq!(selection.resolve(4), Ok(vec![0, 2, 3]));
        assert_eq!(selection.resolve(2), Err(2));
        assert_eq!(PageSelection::new(vec![-5]).resolve(4), Err(-5));
    }
}
