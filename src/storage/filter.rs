//! Regular-expression filters for document names and keys.

use regex::Regex;

/// An optional name filter.
///
/// An absent or invalid pattern matches every name.
#[derive(Debug, Clone, Default)]
pub struct NameFilter(Option<Regex>);

impl NameFilter {
    /// Compiles `pattern`, logging and ignoring it if it is not a valid regex.
    #[must_use]
    pub fn compile(pattern: Option<&str>) -> Self {
        let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
            return Self(None);
        };
        match Regex::new(pattern) {
            Ok(re) => Self(Some(re)),
            Err(e) => {
                tracing::warn!(pattern, error = %e, "ignoring invalid filter pattern");
                Self(None)
            },
        }
    }

    /// Returns whether `name` passes the filter.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.0.as_ref().is_none_or(|re| re.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_filter_matches_all() {
        let filter = NameFilter::compile(None);
        assert!(filter.matches("anything"));
        assert!(NameFilter::compile(Some("")).matches("x"));
    }

    #[test]
    fn test_regex_filter() {
        let filter = NameFilter::compile(Some("^device-[0-9]+$"));
        assert!(filter.matches("device-12"));
        assert!(!filter.matches("server-1"));
    }

    #[test]
    fn test_invalid_pattern_matches_all() {
        let filter = NameFilter::compile(Some("(unclosed"));
        assert!(filter.matches("whatever"));
    }
}
