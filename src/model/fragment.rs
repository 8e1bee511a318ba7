//! Fragments: the self-contained unit extracted from one source package.

use super::node::Element;
use super::resource::Asset;
use crate::detect::PackageFormat;
use crate::schema::StyleCategory;
use std::collections::BTreeMap;

/// Section-level definitions lifted out of fragment markup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionDefs {
    /// Section-properties element (with anything nested in it).
    pub section: Option<Element>,
    /// First column definition found.
    pub column: Option<Element>,
    /// Other document-level layout elements, plus any further column definitions.
    pub layout: Vec<Element>,
}

impl SectionDefs {
    pub fn is_empty(&self) -> bool {
        self.section.is_none() && self.column.is_none() && self.layout.is_empty()
    }
}

/// One source package's mergeable unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Ordinal position among the sources of a merge run.
    pub index: usize,
    pub format: PackageFormat,
    /// Top-level body elements in source order.
    pub markup: Vec<Element>,
    /// Referenced assets in first-reference order.
    pub assets: Vec<Asset>,
    /// Style entries the markup depends on, by category and local index.
    pub styles: BTreeMap<StyleCategory, BTreeMap<u32, Element>>,
    /// Package-manifest declarations by asset id (HWPX only).
    pub manifest_entries: BTreeMap<String, Element>,
    pub section_defs: SectionDefs,
}

impl Fragment {
    pub fn new(index: usize, format: PackageFormat) -> Self {
        Self {
            index,
            format,
            markup: Vec::new(),
            assets: Vec::new(),
            styles: BTreeMap::new(),
            manifest_entries: BTreeMap::new(),
            section_defs: SectionDefs::default(),
        }
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Number of style entries across all categories.
    pub fn style_count(&self) -> usize {
        self.styles.values().map(BTreeMap::len).sum()
    }

    /// Number of top-level body elements.
    pub fn element_count(&self) -> usize {
        self.markup.len()
    }

    /// Plain text of the markup, whitespace collapsed.
    pub fn plain_text(&self) -> String {
        let joined = self
            .markup
            .iter()
            .map(|e| e.text_content())
            .collect::<Vec<_>>()
            .join(" ");
        joined.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
