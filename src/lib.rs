//! # hwpmerge
//!
//! Assembles exam-question fragments from HML and HWPX packages into a
//! single document built from a template.
//!
//! Every source package contributes one fragment: its body markup, the
//! images it references and the style entries it depends on. Fragments are
//! folded into the template in source order. Paragraph ids, asset ids and
//! style indices are renumbered so nothing collides, every part lands in the
//! container the host word processor expects, and every declared count is
//! rewritten to match its container.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hwpmerge::{merge, MergeOptions};
//!
//! fn main() -> hwpmerge::Result<()> {
//!     let template = std::fs::read("template.hml")?;
//!     let sources = vec![std::fs::read("q1.hml")?, std::fs::read("q2.hml")?];
//!
//!     let options = MergeOptions::new().with_title("Midterm");
//!     let output = merge(&template, &sources, &options)?;
//!     std::fs::write("exam.hml", &output.bytes)?;
//!     println!("{} fragments merged", output.report.stats.fragment_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Two package formats**: flat HML markup and HWPX archives
//! - **Question selection**: whole body, n-th question, or element range
//! - **Identifier reconciliation**: paragraph, asset and style namespaces
//! - **Template binding**: `{{DATE}}`, `{{TITLE}}`, custom placeholders
//! - **Structural audit**: duplicate ids, stale counts, misplaced elements
//! - **Parallel batches**: independent merges run on Rayon

pub mod audit;
pub mod detect;
pub mod error;
pub mod merge;
pub mod model;
pub mod parser;
pub mod render;
pub mod schema;

// Re-export commonly used types
pub use audit::{audit, Finding, FindingKind};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_package, PackageFormat};
pub use error::{Error, ErrorKind, Result};
pub use merge::{
    merge, merge_batch, FragmentReport, MergeJob, MergeOptions, MergeOutput, MergeReport,
    MergeStats, StylePolicy,
};
pub use model::{Asset, Element, Fragment, Package};
pub use parser::{
    extract_fragment, list_questions, read_package, read_package_file, ExtractOptions,
    QuestionPreview, Selector,
};
pub use render::{to_json, write_package, JsonFormat};

use std::path::Path;

/// Merge source files into a template file and write the result.
///
/// # Example
///
/// ```no_run
/// use hwpmerge::{merge_files, MergeOptions};
///
/// let report = merge_files(
///     "template.hwpx",
///     &["q1.hwpx", "q2.hwpx"],
///     "exam.hwpx",
///     &MergeOptions::default(),
/// )
/// .unwrap();
/// println!("{} assets", report.stats.asset_count);
/// ```
pub fn merge_files<T, S, O>(template: T, sources: &[S], output: O, options: &MergeOptions) -> Result<MergeReport>
where
    T: AsRef<Path>,
    S: AsRef<Path>,
    O: AsRef<Path>,
{
    let template = std::fs::read(template)?;
    let sources = sources
        .iter()
        .map(std::fs::read)
        .collect::<std::io::Result<Vec<_>>>()?;
    let merged = merge(&template, &sources, options)?;
    std::fs::write(output, &merged.bytes)?;
    Ok(merged.report)
}

/// List the questions of a source file.
///
/// # Example
///
/// ```no_run
/// use hwpmerge::questions_in_file;
///
/// for q in questions_in_file("exam.hml").unwrap() {
///     println!("{}: {}", q.number, q.plain_text);
/// }
/// ```
pub fn questions_in_file<P: AsRef<Path>>(path: P) -> Result<Vec<QuestionPreview>> {
    let package = read_package_file(path)?;
    list_questions(&package, ExtractOptions::default())
}

/// Run the structural audit on a package file.
pub fn inspect_file<P: AsRef<Path>>(path: P) -> Result<Vec<Finding>> {
    let package = read_package_file(path)?;
    Ok(audit(&package))
}

/// Builder for merge runs.
///
/// # Example
///
/// ```no_run
/// use hwpmerge::{HwpMerge, Selector};
///
/// let output = HwpMerge::new()
///     .with_title("Unit 3 Review")
///     .with_date("2024.05.01")
///     .with_selector(Selector::Question(1))
///     .merge_files("template.hml", &["a.hml", "b.hml"])?;
/// std::fs::write("review.hml", &output.bytes)?;
/// # Ok::<(), hwpmerge::Error>(())
/// ```
pub struct HwpMerge {
    options: MergeOptions,
}

impl HwpMerge {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: MergeOptions::default(),
        }
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.options = self.options.with_title(title);
        self
    }

    /// Set the date string.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.options = self.options.with_date(date);
        self
    }

    /// Recognize an extra placeholder.
    pub fn with_placeholder(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options = self.options.with_placeholder(name, value);
        self
    }

    /// Select which part of each source is merged.
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.options.extract = self.options.extract.with_selector(selector);
        self
    }

    /// Keep column and page breaks of the sources.
    pub fn keep_breaks(mut self) -> Self {
        self.options.extract = self.options.extract.keep_breaks();
        self
    }

    /// Set the style policy.
    pub fn with_style_policy(mut self, policy: StylePolicy) -> Self {
        self.options = self.options.with_style_policy(policy);
        self
    }

    /// Skip the post-merge audit.
    pub fn without_audit(mut self) -> Self {
        self.options = self.options.without_audit();
        self
    }

    /// The options this builder will merge with.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge in-memory packages.
    pub fn merge_bytes<S: AsRef<[u8]>>(&self, template: &[u8], sources: &[S]) -> Result<MergeOutput> {
        merge(template, sources, &self.options)
    }

    /// Merge package files.
    pub fn merge_files<T: AsRef<Path>, S: AsRef<Path>>(&self, template: T, sources: &[S]) -> Result<MergeOutput> {
        let template = std::fs::read(template)?;
        let sources = sources
            .iter()
            .map(std::fs::read)
            .collect::<std::io::Result<Vec<_>>>()?;
        merge(&template, &sources, &self.options)
    }
}

impl Default for HwpMerge {
    fn default() -> Self {
        Self::new()
    }
}
