//! Fragment extraction: selects body content from a source package and
//! gathers the assets and style entries it depends on.

use super::options::{ExtractOptions, Selector};
use crate::error::{Error, Result};
use crate::model::{bin_storage_path, extension_of, Asset, Element, Fragment, Node, Package};
use crate::schema::{AssetLayout, ColumnHost, RefTarget, Schema, StyleCategory};
use serde::Serialize;
use std::collections::BTreeSet;
use std::ops::Range;

/// Maximum characters kept in a question preview.
const PREVIEW_CHARS: usize = 300;

/// Summary of one question found in a source package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionPreview {
    /// 1-based question number
    pub number: usize,
    /// Number of top-level body elements
    pub element_count: usize,
    /// Plain text, truncated
    pub plain_text: String,
    /// Asset references in first-reference order
    pub asset_refs: Vec<String>,
}

/// Extracts fragments from source packages.
pub struct FragmentExtractor<'a> {
    package: &'a Package,
    schema: &'static Schema,
    options: ExtractOptions,
}

impl<'a> FragmentExtractor<'a> {
    pub fn new(package: &'a Package, options: ExtractOptions) -> Self {
        Self {
            package,
            schema: Schema::for_format(package.format),
            options,
        }
    }

    /// Extract the fragment selected by the options.
    ///
    /// `index` is the fragment's ordinal among the sources of a merge run and
    /// is carried into every error raised for it.
    pub fn extract(&self, index: usize) -> Result<Fragment> {
        let elements = self.body_elements(index)?;
        let range = self.select(&elements, index)?;
        log::debug!(
            "fragment {}: {} selects {} of {} body elements",
            index,
            self.options.selector,
            range.len(),
            elements.len()
        );

        let mut fragment = Fragment::new(index, self.package.format);
        fragment.markup = elements[range].iter().map(|e| (*e).clone()).collect();
        self.lift_section_defs(&mut fragment);
        for element in &mut fragment.markup {
            if self.options.normalize_whitespace {
                normalize_whitespace(element, self.schema);
            }
            if self.options.remove_breaks {
                remove_breaks(element, self.schema);
            }
        }

        self.collect_styles(&mut fragment);
        self.collect_assets(&mut fragment)?;
        log::debug!(
            "fragment {}: {} elements, {} assets, {} style entries",
            index,
            fragment.markup.len(),
            fragment.assets.len(),
            fragment.style_count()
        );
        Ok(fragment)
    }

    /// Preview every question in the source.
    pub fn list_questions(&self) -> Result<Vec<QuestionPreview>> {
        let elements = self.body_elements(0)?;
        let previews = self
            .question_ranges(&elements)
            .into_iter()
            .enumerate()
            .map(|(i, range)| {
                let selected = &elements[range];
                let text = selected
                    .iter()
                    .map(|e| e.text_content())
                    .collect::<Vec<_>>()
                    .join(" ");
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                let mut refs = Vec::new();
                for element in selected {
                    collect_asset_refs(element, self.schema, &mut refs);
                }
                QuestionPreview {
                    number: i + 1,
                    element_count: selected.len(),
                    plain_text: collapsed.chars().take(PREVIEW_CHARS).collect(),
                    asset_refs: refs,
                }
            })
            .collect();
        Ok(previews)
    }

    fn body_elements(&self, index: usize) -> Result<Vec<&'a Element>> {
        let body = self.schema.body.resolve(self.package).ok_or_else(|| {
            Error::extraction(
                index,
                format!(
                    "source has no <{}> body container",
                    self.schema.body.container_name()
                ),
            )
        })?;
        Ok(body.elements().collect())
    }

    fn select(&self, elements: &[&Element], index: usize) -> Result<Range<usize>> {
        let range = match &self.options.selector {
            Selector::WholeBody => 0..elements.len(),
            Selector::Range(r) => {
                if r.start >= r.end || r.end > elements.len() {
                    return Err(Error::extraction(
                        index,
                        format!(
                            "range {}..{} is outside the {} body elements",
                            r.start,
                            r.end,
                            elements.len()
                        ),
                    ));
                }
                r.clone()
            }
            Selector::Question(n) => {
                let ranges = self.question_ranges(elements);
                let found = n.checked_sub(1).and_then(|i| ranges.get(i).cloned());
                found.ok_or_else(|| {
                    Error::extraction(
                        index,
                        format!("question {} not found ({} questions)", n, ranges.len()),
                    )
                })?
            }
        };
        if range.is_empty() {
            return Err(Error::extraction(index, "selector matched no content"));
        }
        Ok(range)
    }

    /// Question boundaries are top-level elements holding an endnote marker.
    /// Without any marker the whole body is a single question. Trailing empty
    /// and answer-label-only elements are trimmed; empty questions are skipped.
    fn question_ranges(&self, elements: &[&Element]) -> Vec<Range<usize>> {
        let starts: Vec<usize> = elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.contains(self.schema.endnote))
            .map(|(i, _)| i)
            .collect();

        let raw: Vec<Range<usize>> = if starts.is_empty() {
            vec![0..elements.len()]
        } else {
            starts
                .iter()
                .enumerate()
                .map(|(i, &start)| start..starts.get(i + 1).copied().unwrap_or(elements.len()))
                .collect()
        };

        raw.into_iter()
            .filter_map(|range| {
                let mut end = range.end;
                while end > range.start && !self.is_meaningful(elements[end - 1]) {
                    end -= 1;
                }
                (end > range.start).then_some(range.start..end)
            })
            .collect()
    }

    fn is_meaningful(&self, element: &Element) -> bool {
        let text = element.text_content();
        let text = text.trim();
        let visible = !text.is_empty()
            || self
                .schema
                .visible_elements
                .iter()
                .any(|name| element.contains(name));
        visible && !self.options.answer_labels.iter().any(|l| l == text)
    }

    fn lift_section_defs(&self, fragment: &mut Fragment) {
        let rule = self.schema.section;
        let mut columns = Vec::new();
        let mut sections = Vec::new();
        let mut layout = Vec::new();
        for element in &mut fragment.markup {
            columns.extend(element.take_descendants(&|e: &Element| e.is(rule.column)));
            if let ColumnHost::SiblingControl(wrapper) = rule.host {
                prune_empty(element, wrapper);
            }
            sections.extend(element.take_descendants(&|e: &Element| e.is(rule.section)));
            layout.extend(element.take_descendants(&|e: &Element| rule.layout.contains(&e.name.as_str())));
        }
        // Top-level layout elements are dropped from the markup itself.
        fragment
            .markup
            .retain(|e| !e.is(rule.column) && !e.is(rule.section) && !rule.layout.contains(&e.name.as_str()));

        let defs = &mut fragment.section_defs;
        let mut columns = columns.into_iter();
        defs.column = columns.next();
        defs.layout.extend(columns);
        let mut sections = sections.into_iter();
        defs.section = sections.next();
        defs.layout.extend(sections);
        defs.layout.extend(layout);
    }

    /// Transitive closure of style entries referenced by the markup.
    fn collect_styles(&self, fragment: &mut Fragment) {
        let mut pending: Vec<(StyleCategory, u32)> = Vec::new();
        for element in &fragment.markup {
            collect_style_refs(element, self.schema, &mut pending);
        }

        let mut seen = BTreeSet::new();
        while let Some((category, id)) = pending.pop() {
            if !seen.insert((category, id)) {
                continue;
            }
            let Some(entry) = self.find_style(category, id) else {
                // Left unresolved: the reconciler reports it as dangling.
                continue;
            };
            collect_style_refs(entry, self.schema, &mut pending);
            fragment
                .styles
                .entry(category)
                .or_default()
                .insert(id, entry.clone());
        }
    }

    fn find_style(&self, category: StyleCategory, id: u32) -> Option<&'a Element> {
        let table = self.schema.style_table(category)?;
        let list = table.container.resolve(self.package)?;
        let wanted = id.to_string();
        list.elements()
            .filter(|e| e.is(table.item))
            .find(|e| e.attr(table.id_attr).map(str::trim) == Some(wanted.as_str()))
    }

    fn collect_assets(&self, fragment: &mut Fragment) -> Result<()> {
        let mut refs = Vec::new();
        for element in &fragment.markup {
            collect_asset_refs(element, self.schema, &mut refs);
        }
        for styles in fragment.styles.values() {
            for entry in styles.values() {
                collect_asset_refs(entry, self.schema, &mut refs);
            }
        }

        for id in refs {
            let asset = match self.schema.assets {
                AssetLayout::Inline { .. } => self.inline_asset(fragment.index, &id)?,
                AssetLayout::Manifest { .. } => self.manifest_asset(fragment.index, &id)?,
            };
            if let Some(asset) = asset {
                if let AssetLayout::Manifest { .. } = self.schema.assets {
                    fragment
                        .manifest_entries
                        .insert(asset.id.clone(), asset.declaration.clone());
                }
                fragment.assets.push(asset);
            }
        }
        Ok(())
    }

    /// HML: the reference is the 1-based position of a BINITEM whose
    /// payload attribute names a BINDATA entry in storage.
    fn inline_asset(&self, index: usize, id: &str) -> Result<Option<Asset>> {
        let AssetLayout::Inline {
            items,
            item,
            item_payload_attr,
            item_format_attr,
            payloads,
            payload,
            payload_id_attr,
        } = self.schema.assets
        else {
            return Ok(None);
        };

        let Ok(position) = id.trim().parse::<usize>() else {
            return Ok(None);
        };
        let declaration = items.resolve(self.package).and_then(|list| {
            position
                .checked_sub(1)
                .and_then(|i| list.elements().filter(|e| e.is(item)).nth(i))
        });
        let Some(declaration) = declaration else {
            return Ok(None);
        };

        let storage_id = declaration.attr(item_payload_attr).unwrap_or(id).trim();
        let data = payloads
            .resolve(self.package)
            .and_then(|store| {
                store
                    .elements()
                    .filter(|e| e.is(payload))
                    .find(|e| e.attr(payload_id_attr).map(str::trim) == Some(storage_id))
            })
            .ok_or_else(|| {
                Error::extraction(
                    index,
                    format!("asset {} has no <{}> payload with id {}", id, payload, storage_id),
                )
            })?;

        let extension = declaration
            .attr(item_format_attr)
            .map(|f| f.trim().to_ascii_lowercase())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| "bin".to_string());
        let payload_text: String = data
            .text_content()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        Ok(Some(Asset {
            id: id.to_string(),
            storage_path: bin_storage_path(storage_id, &extension),
            payload: payload_text,
            extension,
            compressed: data
                .attr("Compress")
                .is_some_and(|c| c.eq_ignore_ascii_case("true")),
            declaration: declaration.clone(),
        }))
    }

    /// HWPX: the reference is a manifest item id whose href names a binary part.
    fn manifest_asset(&self, index: usize, id: &str) -> Result<Option<Asset>> {
        let AssetLayout::Manifest { manifest, item, .. } = self.schema.assets else {
            return Ok(None);
        };
        let declaration = manifest
            .resolve(self.package)
            .and_then(|m| m.elements().find(|e| e.is(item) && e.attr("id") == Some(id)));
        let Some(declaration) = declaration else {
            return Ok(None);
        };

        let href = declaration.attr("href").unwrap_or_default();
        let data = self.package.binary(href).ok_or_else(|| {
            Error::extraction(index, format!("asset {} points at missing part '{}'", id, href))
        })?;

        let mut asset = Asset::from_bytes(id, href, data, declaration.clone());
        if extension_of(href).is_none() {
            if let Some(media) = declaration.attr("media-type") {
                asset.extension = crate::model::extension_for_mime(media).to_string();
            }
        }
        Ok(Some(asset))
    }
}

/// Extract a fragment from a package with the given options.
pub fn extract_fragment(package: &Package, options: ExtractOptions, index: usize) -> Result<Fragment> {
    FragmentExtractor::new(package, options).extract(index)
}

/// List the questions of a source package.
pub fn list_questions(package: &Package, options: ExtractOptions) -> Result<Vec<QuestionPreview>> {
    FragmentExtractor::new(package, options).list_questions()
}

/// Style references held by an element subtree.
fn collect_style_refs(
    element: &Element,
    schema: &Schema,
    out: &mut Vec<(StyleCategory, u32)>,
) {
    element.walk(&mut |e| {
        for rule in schema.refs_for(&e.name) {
            if let RefTarget::Style(category) = rule.target {
                if let Some(id) = e.attr(rule.attr).and_then(|v| category.parse_ref(v)) {
                    out.push((category, id));
                }
            }
        }
        if e.is(schema.heading.element) {
            if let Some(category) = schema.heading.category(e) {
                if let Some(id) = e.attr(schema.heading.id_attr).and_then(|v| category.parse_ref(v)) {
                    out.push((category, id));
                }
            }
        }
    });
}

/// Distinct asset references in document order.
fn collect_asset_refs(element: &Element, schema: &Schema, out: &mut Vec<String>) {
    element.walk(&mut |e| {
        for rule in schema.refs_for(&e.name) {
            if rule.target == RefTarget::Asset {
                if let Some(value) = e.attr(rule.attr) {
                    if !out.iter().any(|r| r == value) {
                        out.push(value.to_string());
                    }
                }
            }
        }
    });
}

/// Drop whitespace-only text nodes except inside text-bearing elements.
fn normalize_whitespace(element: &mut Element, schema: &Schema) {
    if schema.is_text_element(&element.name) {
        return;
    }
    element.children.retain(|n| !n.is_blank_text());
    for child in element.elements_mut() {
        normalize_whitespace(child, schema);
    }
}

fn remove_breaks(element: &mut Element, schema: &Schema) {
    let rule = schema.breaks;
    element.take_descendants(&|e: &Element| rule.elements.contains(&e.name.as_str()));
    element.walk_mut(&mut |e| {
        if e.is(schema.paragraph) {
            for attr in rule.attrs {
                if e.has_attr(attr) {
                    e.set_attr(*attr, rule.off);
                }
            }
        }
    });
}

/// Remove descendants named `name` that were left without element children.
fn prune_empty(element: &mut Element, name: &str) {
    element.children.retain(|n| match n {
        Node::Element(e) => !(e.is(name) && e.elements().next().is_none()),
        _ => true,
    });
    for child in element.elements_mut() {
        prune_empty(child, name);
    }
}
