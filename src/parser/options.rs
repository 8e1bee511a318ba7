//! Extraction options and configuration.

use std::ops::Range;

/// Which part of a source body becomes the fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    /// Every top-level body element.
    #[default]
    WholeBody,
    /// The n-th question (1-based), delimited by endnote markers.
    Question(usize),
    /// Top-level body elements by zero-based, half-open index range.
    Range(Range<usize>),
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::WholeBody => write!(f, "whole body"),
            Selector::Question(n) => write!(f, "question {}", n),
            Selector::Range(r) => write!(f, "elements {}..{}", r.start, r.end),
        }
    }
}

impl std::str::FromStr for Selector {
    type Err = String;

    /// Parses `all`, `q3` / `3`, or `2..5`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Selector::WholeBody);
        }
        if let Some((a, b)) = s.split_once("..") {
            let start = a.trim().parse().map_err(|_| format!("invalid range: {}", s))?;
            let end = b.trim().parse().map_err(|_| format!("invalid range: {}", s))?;
            return Ok(Selector::Range(start..end));
        }
        let digits = s.strip_prefix(['q', 'Q']).unwrap_or(s);
        match digits.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Selector::Question(n)),
            _ => Err(format!("invalid selector: {}", s)),
        }
    }
}

/// Options for extracting a fragment from a source package.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Which part of the body to extract
    pub selector: Selector,

    /// Reset column/page break flags and drop column-break elements
    pub remove_breaks: bool,

    /// Remove whitespace-only text outside text-bearing elements
    pub normalize_whitespace: bool,

    /// Trailing elements whose only text is one of these labels are trimmed
    pub answer_labels: Vec<String>,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selector.
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Select the n-th question (1-based).
    pub fn question(mut self, n: usize) -> Self {
        self.selector = Selector::Question(n);
        self
    }

    /// Keep column and page breaks from the source.
    pub fn keep_breaks(mut self) -> Self {
        self.remove_breaks = false;
        self
    }

    /// Enable or disable whitespace normalization.
    pub fn with_whitespace_normalization(mut self, enabled: bool) -> Self {
        self.normalize_whitespace = enabled;
        self
    }

    /// Replace the answer labels used for trailing trimming.
    pub fn with_answer_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answer_labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            selector: Selector::WholeBody,
            remove_breaks: true,
            normalize_whitespace: true,
            answer_labels: vec!["정답".to_string(), "답".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_from_str() {
        assert_eq!("all".parse::<Selector>().unwrap(), Selector::WholeBody);
        assert_eq!("q3".parse::<Selector>().unwrap(), Selector::Question(3));
        assert_eq!("7".parse::<Selector>().unwrap(), Selector::Question(7));
        assert_eq!("2..5".parse::<Selector>().unwrap(), Selector::Range(2..5));
        assert!("q0".parse::<Selector>().is_err());
        assert!("x..y".parse::<Selector>().is_err());
    }

    #[test]
    fn test_builder() {
        let opts = ExtractOptions::new()
            .question(2)
            .keep_breaks()
            .with_answer_labels(["Answer"]);
        assert_eq!(opts.selector, Selector::Question(2));
        assert!(!opts.remove_breaks);
        assert!(opts.normalize_whitespace);
        assert_eq!(opts.answer_labels, vec!["Answer".to_string()]);
    }
}
