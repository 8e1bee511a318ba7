//! Merge options and configuration.

use super::template::{Placeholders, CONTENT_HERE, DATE, TITLE};
use crate::parser::ExtractOptions;
use std::collections::BTreeMap;

/// How fragment style references are carried into the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StylePolicy {
    /// Import referenced style entries and renumber them
    #[default]
    Import,
    /// Point every reference at the category's base entry of the template
    TemplateDefaults,
}

/// Options for a merge run.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Value for the title placeholder (left untouched when unset)
    pub title: Option<String>,

    /// Value for the date placeholder (today's date when unset)
    pub date: Option<String>,

    /// `chrono` format used for the default date
    pub date_format: String,

    /// Additional recognized placeholders
    pub placeholders: BTreeMap<String, String>,

    /// Name of the content-insertion placeholder
    pub content_token: String,

    /// Placeholders that must appear in the template
    pub required: Vec<String>,

    /// Style import policy
    pub style_policy: StylePolicy,

    /// Options applied to every source
    pub extract: ExtractOptions,

    /// Run a structural audit on the result
    pub audit: bool,
}

impl MergeOptions {
    /// Create new merge options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the date string.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Set the format for the default date.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Recognize an extra placeholder.
    pub fn with_placeholder(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.placeholders.insert(name.into(), value.into());
        self
    }

    /// Require a placeholder to be present in the template.
    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Set the style policy.
    pub fn with_style_policy(mut self, policy: StylePolicy) -> Self {
        self.style_policy = policy;
        self
    }

    /// Set extraction options.
    pub fn with_extract(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    /// Skip the post-merge audit.
    pub fn without_audit(mut self) -> Self {
        self.audit = false;
        self
    }

    /// Resolve the placeholder set for a run.
    pub fn placeholders(&self) -> Placeholders {
        let date = self
            .date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format(&self.date_format).to_string());
        let mut set = Placeholders::new()
            .with(DATE, date)
            .require(self.content_token.clone());
        if let Some(title) = &self.title {
            set = set.with(TITLE, title.clone());
        }
        for (name, value) in &self.placeholders {
            set = set.with(name.clone(), value.clone());
        }
        for name in &self.required {
            set = set.require(name.clone());
        }
        set
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            title: None,
            date: None,
            date_format: "%Y-%m-%d".to_string(),
            placeholders: BTreeMap::new(),
            content_token: CONTENT_HERE.to_string(),
            required: Vec::new(),
            style_policy: StylePolicy::Import,
            extract: ExtractOptions::default(),
            audit: true,
        }
    }
}
